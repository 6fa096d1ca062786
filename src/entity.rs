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

//! Entity handles and the caller-owned attribute arena.
//!
//! Stores and grids never own entity data. Callers allocate handles from an
//! [`Entities`] arena, attach named attributes to them, and register the
//! handles with whatever indexing structures they use; those structures keep
//! only handle→slot bookkeeping and borrow the arena when a predicate needs
//! to look inside an entity.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::error::{Error, Result};

new_key_type! {
    /// Unique entity identifier backed by slotmap's generational keys.
    pub struct EntityId;
}

/// Presence lookup over entity attributes.
///
/// Predicates only ever ask whether an attribute is present. Keeping the
/// check behind a trait is what lets attribute removal be evaluated against
/// a prospective state before the arena is actually mutated.
pub trait AttrSource {
    /// True if `entity` currently carries an attribute named `name`.
    fn has_attr(&self, entity: EntityId, name: &str) -> bool;
}

/// Caller-owned arena of entity records.
///
/// Each record is a map of named attributes with payload type `V`. An
/// attribute is present iff its name is a key of the map: any stored value
/// counts, including payloads like `false` or `0`. Absence is the only
/// sentinel; there is no "present but unset" state.
pub struct Entities<V> {
    records: SlotMap<EntityId, FxHashMap<String, V>>,
}

impl<V> Entities<V> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            records: SlotMap::with_key(),
        }
    }

    /// Allocate a fresh entity with no attributes.
    pub fn create(&mut self) -> EntityId {
        self.records.insert(FxHashMap::default())
    }

    /// Destroy an entity.
    ///
    /// Destroying through a stale handle is the one caller error this crate
    /// surfaces; indexing structures holding the handle are unaffected and
    /// must be told separately.
    pub fn destroy(&mut self, entity: EntityId) -> Result<()> {
        self.records
            .remove(entity)
            .map(|_| ())
            .ok_or(Error::EntityNotFound)
    }

    /// True if the handle refers to a live entity.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.records.contains_key(entity)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no entities are alive.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Attribute value, if present.
    pub fn attr(&self, entity: EntityId, name: &str) -> Option<&V> {
        self.records.get(entity)?.get(name)
    }

    /// Mutable attribute value, if present.
    pub fn attr_mut(&mut self, entity: EntityId, name: &str) -> Option<&mut V> {
        self.records.get_mut(entity)?.get_mut(name)
    }

    /// Number of attributes on `entity`, zero for stale handles.
    pub fn attr_count(&self, entity: EntityId) -> usize {
        self.records.get(entity).map_or(0, |record| record.len())
    }

    /// Set an attribute directly, replacing any existing value.
    ///
    /// Returns false for stale handles. This bypasses live-query
    /// maintenance: entities tracked by an `EntityStore` must be mutated
    /// through `EntityStore::add_attribute` so derived queries stay in sync.
    pub fn set_attr(&mut self, entity: EntityId, name: impl Into<String>, value: V) -> bool {
        match self.records.get_mut(entity) {
            Some(record) => {
                record.insert(name.into(), value);
                true
            }
            None => false,
        }
    }

    /// Clear an attribute directly, returning the old value.
    ///
    /// Same caveat as [`set_attr`](Self::set_attr): tracked entities go
    /// through `EntityStore::remove_attribute` instead.
    pub fn clear_attr(&mut self, entity: EntityId, name: &str) -> Option<V> {
        self.records.get_mut(entity)?.remove(name)
    }
}

impl<V> Default for Entities<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> AttrSource for Entities<V> {
    fn has_attr(&self, entity: EntityId, name: &str) -> bool {
        self.records
            .get(entity)
            .is_some_and(|record| record.contains_key(name))
    }
}
