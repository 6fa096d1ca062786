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

//! Ordered object store with swap-and-pop removal.
//!
//! The base collection under entity stores and live queries: an ordered
//! sequence of entity handles with O(1) membership, positional lookup,
//! append, and removal, plus synchronous add/remove/shuffle notifications.

use slotmap::SecondaryMap;

use crate::entity::EntityId;

/// Observer of store mutations.
///
/// Callbacks receive the store itself, already back in a consistent state,
/// so re-entrant mutation (a consumer removing an entity while handling its
/// own add notification) is safe; notifications raised that way are
/// delivered to every observer in causal order before the outermost
/// mutating call returns. All hooks default to no-ops.
pub trait StoreObserver {
    /// `entity` was appended to the store.
    fn on_add(&mut self, _store: &mut ObjectStore, _entity: EntityId) {}

    /// `entity` was removed from the store.
    fn on_remove(&mut self, _store: &mut ObjectStore, _entity: EntityId) {}

    /// `entity` was moved into the slot vacated by a removal.
    ///
    /// Fires strictly before the matching `on_remove`.
    fn on_shuffle(&mut self, _store: &mut ObjectStore, _entity: EntityId, _new_index: usize) {}
}

/// Mutation notification payload.
#[derive(Clone, Copy)]
enum StoreEvent {
    Added(EntityId),
    Removed(EntityId),
    Shuffled(EntityId, usize),
}

/// Ordered, handle-keyed collection of entities.
///
/// Removal swaps the last element into the vacated slot: positions of other
/// entities are not stable across removals, identity is. Iteration runs
/// tail-first, so the entity just yielded can be removed without skipping
/// or revisiting any survivor.
#[derive(Default)]
pub struct ObjectStore {
    entries: Vec<EntityId>,
    indices: SecondaryMap<EntityId, usize>,
    observers: Vec<Box<dyn StoreObserver>>,
    /// Events raised by re-entrant mutation while a dispatch is running.
    pending: Vec<StoreEvent>,
    dispatching: bool,
}

impl ObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) membership test.
    pub fn has(&self, entity: EntityId) -> bool {
        self.indices.contains_key(entity)
    }

    /// Current slot of `entity`, if tracked.
    pub fn index_of(&self, entity: EntityId) -> Option<usize> {
        self.indices.get(entity).copied()
    }

    /// Entity at slot `index`.
    pub fn at(&self, index: usize) -> Option<EntityId> {
        self.entries.get(index).copied()
    }

    /// Number of tracked entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current entity sequence, in slot order.
    pub fn entities(&self) -> &[EntityId] {
        &self.entries
    }

    /// Append `entity` unless already tracked.
    ///
    /// Re-adding is a pure no-op returning false. The add notification
    /// fires after the entity is in place.
    pub fn add(&mut self, entity: EntityId) -> bool {
        if self.indices.contains_key(entity) {
            return false;
        }
        self.indices.insert(entity, self.entries.len());
        self.entries.push(entity);
        self.notify(StoreEvent::Added(entity));
        true
    }

    /// Remove `entity`, swapping the last element into its slot.
    ///
    /// Silent no-op if absent. If another entity gets moved, its shuffle
    /// notification fires strictly before the remove notification; the
    /// store is consistent at both points.
    pub fn remove(&mut self, entity: EntityId) {
        let Some(index) = self.indices.remove(entity) else {
            return;
        };
        self.entries.swap_remove(index);
        if let Some(&moved) = self.entries.get(index) {
            if let Some(slot) = self.indices.get_mut(moved) {
                *slot = index;
            }
            self.notify(StoreEvent::Shuffled(moved, index));
        }
        self.notify(StoreEvent::Removed(entity));
    }

    /// Remove every entity, firing per-entity notifications.
    pub fn clear(&mut self) {
        while let Some(&entity) = self.entries.last() {
            self.remove(entity);
        }
    }

    /// Iterate entities tail-first (reverse of current slot order).
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.iter().rev().copied()
    }

    /// Tail-cursor iteration that tolerates mutation from the callback.
    ///
    /// Visits each current entity once even when the callback removes the
    /// yielded entity or any other; entities added during the walk are not
    /// visited.
    pub fn for_each_rev(&mut self, mut f: impl FnMut(&mut Self, EntityId)) {
        let mut cursor = self.entries.len();
        while cursor > 0 {
            cursor -= 1;
            if cursor >= self.entries.len() {
                // Removals below the cursor shrank the store; resume from the tail.
                cursor = self.entries.len();
                continue;
            }
            let entity = self.entries[cursor];
            f(self, entity);
        }
    }

    /// Register an observer.
    ///
    /// Safe to call from inside a notification; late registrations only see
    /// subsequent events.
    pub fn observe(&mut self, observer: Box<dyn StoreObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Two-phase notification dispatch.
    ///
    /// The observer list is detached while callbacks run, so no borrow is
    /// held over it when an observer mutates the store. Events raised by
    /// such re-entrant mutation are queued and delivered, in causal order,
    /// to every observer before the outermost mutating call returns.
    fn notify(&mut self, event: StoreEvent) {
        if self.observers.is_empty() && !self.dispatching {
            return;
        }
        self.pending.push(event);
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        let mut cursor = 0;
        while cursor < self.pending.len() {
            let event = self.pending[cursor];
            cursor += 1;
            let mut observers = std::mem::take(&mut self.observers);
            for observer in &mut observers {
                match event {
                    StoreEvent::Added(entity) => observer.on_add(self, entity),
                    StoreEvent::Removed(entity) => observer.on_remove(self, entity),
                    StoreEvent::Shuffled(entity, index) => {
                        observer.on_shuffle(self, entity, index);
                    }
                }
            }
            // Observers registered during dispatch landed in self.observers.
            let late = std::mem::replace(&mut self.observers, observers);
            self.observers.extend(late);
        }
        self.pending.clear();
        self.dispatching = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entities;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Note {
        Added(EntityId),
        Removed(EntityId),
        Shuffled(EntityId, usize),
    }

    struct Recorder {
        notes: Rc<RefCell<Vec<Note>>>,
    }

    impl StoreObserver for Recorder {
        fn on_add(&mut self, _store: &mut ObjectStore, entity: EntityId) {
            self.notes.borrow_mut().push(Note::Added(entity));
        }

        fn on_remove(&mut self, _store: &mut ObjectStore, entity: EntityId) {
            self.notes.borrow_mut().push(Note::Removed(entity));
        }

        fn on_shuffle(&mut self, _store: &mut ObjectStore, entity: EntityId, new_index: usize) {
            self.notes.borrow_mut().push(Note::Shuffled(entity, new_index));
        }
    }

    fn three_entities() -> (Entities<()>, EntityId, EntityId, EntityId) {
        let mut entities = Entities::new();
        let a = entities.create();
        let b = entities.create();
        let c = entities.create();
        (entities, a, b, c)
    }

    #[test]
    fn test_add_is_idempotent() {
        let (_entities, a, _, _) = three_entities();
        let mut store = ObjectStore::new();

        assert!(store.add(a));
        assert!(!store.add(a));
        assert_eq!(store.len(), 1);
        assert_eq!(store.index_of(a), Some(0));
    }

    #[test]
    fn test_remove_only_entity() {
        let (_entities, a, _, _) = three_entities();
        let mut store = ObjectStore::new();
        store.add(a);
        store.remove(a);

        assert!(!store.has(a));
        assert_eq!(store.index_of(a), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (_entities, a, b, _) = three_entities();
        let mut store = ObjectStore::new();
        store.add(a);
        store.remove(b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_shuffle_fires_before_remove() {
        let (_entities, a, b, c) = three_entities();
        let mut store = ObjectStore::new();
        store.add(a);
        store.add(b);
        store.add(c);

        let notes = Rc::new(RefCell::new(Vec::new()));
        store.observe(Box::new(Recorder {
            notes: notes.clone(),
        }));

        store.remove(a);

        assert_eq!(
            *notes.borrow(),
            vec![Note::Shuffled(c, 0), Note::Removed(a)]
        );
        assert_eq!(store.entities(), &[c, b]);
        assert_eq!(store.index_of(c), Some(0));
        assert_eq!(store.index_of(b), Some(1));
    }

    #[test]
    fn test_removing_last_entity_fires_no_shuffle() {
        let (_entities, a, b, _) = three_entities();
        let mut store = ObjectStore::new();
        store.add(a);
        store.add(b);

        let notes = Rc::new(RefCell::new(Vec::new()));
        store.observe(Box::new(Recorder {
            notes: notes.clone(),
        }));

        store.remove(b);
        assert_eq!(*notes.borrow(), vec![Note::Removed(b)]);
    }

    #[test]
    fn test_reverse_iteration_with_in_loop_removal() {
        let (_entities, a, b, c) = three_entities();
        let mut store = ObjectStore::new();
        store.add(a);
        store.add(b);
        store.add(c);

        let mut visited = Vec::new();
        store.for_each_rev(|store, entity| {
            visited.push(entity);
            store.remove(entity);
        });

        assert_eq!(visited, vec![c, b, a]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_iteration_order_is_reverse_of_slots() {
        let (_entities, a, b, c) = three_entities();
        let mut store = ObjectStore::new();
        store.add(a);
        store.add(b);
        store.add(c);

        let order: Vec<_> = store.iter().collect();
        assert_eq!(order, vec![c, b, a]);
    }

    #[test]
    fn test_clear_notifies_per_entity() {
        let (_entities, a, b, c) = three_entities();
        let mut store = ObjectStore::new();
        store.add(a);
        store.add(b);
        store.add(c);

        let notes = Rc::new(RefCell::new(Vec::new()));
        store.observe(Box::new(Recorder {
            notes: notes.clone(),
        }));

        store.clear();
        assert!(store.is_empty());

        let removed: Vec<_> = notes
            .borrow()
            .iter()
            .filter(|n| matches!(n, Note::Removed(_)))
            .cloned()
            .collect();
        assert_eq!(removed.len(), 3);
    }

    struct RemoveOnAdd;

    impl StoreObserver for RemoveOnAdd {
        fn on_add(&mut self, store: &mut ObjectStore, entity: EntityId) {
            store.remove(entity);
        }
    }

    #[test]
    fn test_reentrant_removal_from_add_notification() {
        let (_entities, a, _, _) = three_entities();
        let mut store = ObjectStore::new();
        store.observe(Box::new(RemoveOnAdd));

        store.add(a);
        assert!(!store.has(a));
        assert!(store.is_empty());
    }

    #[test]
    fn test_reentrant_events_still_reach_all_observers() {
        let (_entities, a, _, _) = three_entities();
        let mut store = ObjectStore::new();
        let notes = Rc::new(RefCell::new(Vec::new()));
        store.observe(Box::new(Recorder {
            notes: notes.clone(),
        }));
        store.observe(Box::new(RemoveOnAdd));

        store.add(a);

        // The removal triggered inside the add dispatch is observed too.
        assert_eq!(*notes.borrow(), vec![Note::Added(a), Note::Removed(a)]);
        assert!(store.is_empty());
    }
}
