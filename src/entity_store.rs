// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Entity store: attribute mutation plus a cached live-query factory.
//!
//! The central type gameplay and systems code mutates. Every add, remove,
//! and attribute toggle propagates to every live query the store owns, so
//! consumers iterate their query each frame without ever rescanning.

use ahash::AHashMap;

use crate::entity::{AttrSource, Entities, EntityId};
use crate::query::{Capability, LiveQuery, Masked};
use crate::store::{ObjectStore, StoreObserver};

/// Handle to a live query owned by an [`EntityStore`].
///
/// Ids are plain indices into an append-only list: equal capabilities
/// always resolve to the same id, and ids stay valid for the store's whole
/// lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueryId(usize);

/// Object store with attribute mutation and derived live queries.
pub struct EntityStore {
    base: ObjectStore,
    queries: Vec<LiveQuery>,
    cache: AHashMap<Capability, QueryId>,
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            base: ObjectStore::new(),
            queries: Vec::new(),
            // Most applications settle on a handful of distinct predicates.
            cache: AHashMap::with_capacity(16),
        }
    }

    /// Track `entity`, admitting it into every matching query.
    ///
    /// Returns false and changes nothing if already tracked.
    pub fn add<S: AttrSource>(&mut self, attrs: &S, entity: EntityId) -> bool {
        if !self.base.add(entity) {
            return false;
        }
        for query in &mut self.queries {
            query.evaluate(attrs, entity);
        }
        true
    }

    /// Stop tracking `entity` and evict it from every query.
    ///
    /// Silent no-op if untracked.
    pub fn remove(&mut self, entity: EntityId) {
        if !self.base.has(entity) {
            return;
        }
        self.base.remove(entity);
        // A removed base entity can never still match a derived query.
        for query in &mut self.queries {
            query.evict(entity);
        }
    }

    /// Set an attribute on a tracked entity and resync every query.
    ///
    /// No-op when the entity is untracked, the handle is stale, or the
    /// attribute is already present (the existing value is kept).
    pub fn add_attribute<V>(
        &mut self,
        entities: &mut Entities<V>,
        entity: EntityId,
        name: impl Into<String>,
        value: V,
    ) -> bool {
        let name = name.into();
        if !self.base.has(entity) || entities.has_attr(entity, &name) {
            return false;
        }
        if !entities.set_attr(entity, name, value) {
            return false;
        }
        for query in &mut self.queries {
            query.evaluate(entities, entity);
        }
        true
    }

    /// Clear an attribute on a tracked entity and resync every query.
    ///
    /// Queries are re-evaluated against the prospective state (attribute
    /// already absent) before the arena is mutated, so a must-not-have
    /// query never briefly carries a stale member.
    pub fn remove_attribute<V>(
        &mut self,
        entities: &mut Entities<V>,
        entity: EntityId,
        name: &str,
    ) -> bool {
        if !self.base.has(entity) || !entities.has_attr(entity, name) {
            return false;
        }
        let prospective = Masked {
            source: &*entities,
            hidden: name,
        };
        for query in &mut self.queries {
            query.evaluate(&prospective, entity);
        }
        entities.clear_attr(entity, name);
        true
    }

    /// Cached live query for `capability`.
    ///
    /// Equal capabilities — whatever order or duplication they were built
    /// with — return the same id. A new query back-fills from the current
    /// membership before it is cached.
    pub fn query<S: AttrSource>(&mut self, attrs: &S, capability: Capability) -> QueryId {
        if let Some(&id) = self.cache.get(&capability) {
            debug_assert_eq!(self.queries[id.0].capability(), &capability);
            return id;
        }
        let query = LiveQuery::new(capability.clone(), &self.base, attrs);
        let id = QueryId(self.queries.len());
        self.queries.push(query);
        self.cache.insert(capability, id);
        id
    }

    /// Query for entities carrying every name in `names`.
    pub fn with<S: AttrSource, N: AsRef<str>>(&mut self, attrs: &S, names: &[N]) -> QueryId {
        self.query(attrs, Capability::having(names))
    }

    /// Query for entities lacking every name in `names`.
    pub fn without<S: AttrSource, N: AsRef<str>>(&mut self, attrs: &S, names: &[N]) -> QueryId {
        self.query(attrs, Capability::lacking(names))
    }

    /// Narrow an existing query by additional required names.
    ///
    /// Resolves through the cache: refining a `"a"` query with `"b"` and
    /// asking directly for `"a", "b"` yield the identical query.
    pub fn refine_with<S: AttrSource, N: AsRef<str>>(
        &mut self,
        attrs: &S,
        id: QueryId,
        names: &[N],
    ) -> QueryId {
        let mut capability = self.queries[id.0].capability().clone();
        for name in names {
            capability = capability.with(name.as_ref());
        }
        self.query(attrs, capability)
    }

    /// Narrow an existing query by additional rejected names.
    pub fn refine_without<S: AttrSource, N: AsRef<str>>(
        &mut self,
        attrs: &S,
        id: QueryId,
        names: &[N],
    ) -> QueryId {
        let mut capability = self.queries[id.0].capability().clone();
        for name in names {
            capability = capability.without(name.as_ref());
        }
        self.query(attrs, capability)
    }

    /// Live query behind `id`.
    ///
    /// Ids must come from this store; they index an append-only list.
    pub fn get(&self, id: QueryId) -> &LiveQuery {
        &self.queries[id.0]
    }

    /// Mutable access to a live query, e.g. to register observers.
    pub fn get_mut(&mut self, id: QueryId) -> &mut LiveQuery {
        &mut self.queries[id.0]
    }

    /// Number of distinct live queries owned by this store.
    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    /// O(1) membership test on the base store.
    pub fn has(&self, entity: EntityId) -> bool {
        self.base.has(entity)
    }

    /// Current base slot of `entity`, if tracked.
    pub fn index_of(&self, entity: EntityId) -> Option<usize> {
        self.base.index_of(entity)
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.base.len()
    }

    /// True if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Current entity sequence, in base slot order.
    pub fn entities(&self) -> &[EntityId] {
        self.base.entities()
    }

    /// Iterate tracked entities tail-first.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.base.iter()
    }

    /// Observe the base store's add/remove/shuffle notifications.
    pub fn observe(&mut self, observer: Box<dyn StoreObserver>) {
        self.base.observe(observer);
    }

    /// Remove every entity; every derived query ends empty.
    pub fn clear(&mut self) {
        while let Some(&entity) = self.base.entities().last() {
            self.remove(entity);
        }
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
