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

//! Capability predicates and live queries.
//!
//! A capability names the attributes an entity must have and must not have.
//! A live query is a derived store mirroring the subset of a source store's
//! entities that satisfy a capability, re-checked incrementally on every
//! relevant mutation instead of rescanned.

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::entity::{AttrSource, EntityId};
use crate::store::{ObjectStore, StoreObserver};

/// Normalized capability predicate.
///
/// Both attribute lists stay sorted and deduplicated, so two predicates
/// built in any order or with repeated names compare and hash equal. The
/// value itself is the cache signature: distinct predicates can never
/// collide the way an encoded string signature could.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Capability {
    must_have: Vec<String>,
    must_not_have: Vec<String>,
}

impl Capability {
    /// Empty predicate, matched by every entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Predicate requiring every name in `names`.
    pub fn having<N: AsRef<str>>(names: &[N]) -> Self {
        names
            .iter()
            .fold(Self::new(), |capability, name| capability.with(name.as_ref()))
    }

    /// Predicate rejecting every name in `names`.
    pub fn lacking<N: AsRef<str>>(names: &[N]) -> Self {
        names
            .iter()
            .fold(Self::new(), |capability, name| capability.without(name.as_ref()))
    }

    /// Require `name` to be present.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        insert_sorted(&mut self.must_have, name.into());
        self
    }

    /// Require `name` to be absent.
    pub fn without(mut self, name: impl Into<String>) -> Self {
        insert_sorted(&mut self.must_not_have, name.into());
        self
    }

    /// Names required to be present, sorted.
    pub fn must_have(&self) -> &[String] {
        &self.must_have
    }

    /// Names required to be absent, sorted.
    pub fn must_not_have(&self) -> &[String] {
        &self.must_not_have
    }

    /// Evaluate the predicate against one entity.
    ///
    /// Presence is whatever `attrs` reports; stored values like `false` or
    /// `0` still count as present.
    pub fn matches<S: AttrSource + ?Sized>(&self, attrs: &S, entity: EntityId) -> bool {
        self.must_have.iter().all(|name| attrs.has_attr(entity, name))
            && self
                .must_not_have
                .iter()
                .all(|name| !attrs.has_attr(entity, name))
    }
}

fn insert_sorted(list: &mut Vec<String>, name: String) {
    if let Err(position) = list.binary_search(&name) {
        list.insert(position, name);
    }
}

/// Attribute view with one name treated as absent.
///
/// Attribute removal is evaluated under this view before the arena is
/// mutated: the admit/evict decision must reflect the state the entity is
/// about to have, not the state it still has. A pure wrapper, never a
/// mutate-then-revert.
pub(crate) struct Masked<'a, S: AttrSource + ?Sized> {
    pub(crate) source: &'a S,
    pub(crate) hidden: &'a str,
}

impl<S: AttrSource + ?Sized> AttrSource for Masked<'_, S> {
    fn has_attr(&self, entity: EntityId, name: &str) -> bool {
        name != self.hidden && self.source.has_attr(entity, name)
    }
}

/// Automatically-maintained subset of a source store.
///
/// At every quiescent point, membership equals exactly the subset of the
/// owning store's entities satisfying the capability. Consumers iterate the
/// query directly and may observe its own add/remove notifications; they
/// never rescan the source.
pub struct LiveQuery {
    members: ObjectStore,
    capability: Capability,
}

impl LiveQuery {
    /// Back-fill from a single scan of `source`.
    pub(crate) fn new<S: AttrSource>(
        capability: Capability,
        source: &ObjectStore,
        attrs: &S,
    ) -> Self {
        #[cfg(feature = "profiling")]
        let span = info_span!("live_query.backfill", source_len = source.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let mut query = Self {
            members: ObjectStore::new(),
            capability,
        };
        for &entity in source.entities() {
            if query.capability.matches(attrs, entity) {
                query.members.add(entity);
            }
        }
        query
    }

    /// Re-check `entity` and admit or evict as needed.
    pub(crate) fn evaluate<S: AttrSource + ?Sized>(&mut self, attrs: &S, entity: EntityId) {
        let was_matching = self.members.has(entity);
        let will_match = self.capability.matches(attrs, entity);
        if !was_matching && will_match {
            self.members.add(entity);
        } else if was_matching && !will_match {
            self.members.remove(entity);
        }
    }

    /// Drop `entity` regardless of the predicate.
    ///
    /// Used when the source stops tracking it: a removed base entity can
    /// never still match a derived query.
    pub(crate) fn evict(&mut self, entity: EntityId) {
        self.members.remove(entity);
    }

    /// The query's normalized predicate.
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// O(1) membership test.
    pub fn has(&self, entity: EntityId) -> bool {
        self.members.has(entity)
    }

    /// Current slot of `entity` within the query, if a member.
    pub fn index_of(&self, entity: EntityId) -> Option<usize> {
        self.members.index_of(entity)
    }

    /// Member at slot `index`.
    pub fn at(&self, index: usize) -> Option<EntityId> {
        self.members.at(index)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if no entity matches.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Current member sequence, in slot order.
    pub fn entities(&self) -> &[EntityId] {
        self.members.entities()
    }

    /// Iterate members tail-first.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter()
    }

    /// Observe the query's own add/remove/shuffle notifications.
    pub fn observe(&mut self, observer: Box<dyn StoreObserver>) {
        self.members.observe(observer);
    }
}
