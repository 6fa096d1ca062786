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

//! Spatial hash grid keyed by the Z-order curve.
//!
//! Buckets entities into fixed-size square cells by bounding-box overlap.
//! Independent of the store layer: broad-phase collision, light culling, and
//! other position-aware systems drive it directly with insert/update/remove
//! as objects move. Moving within a cell costs nothing.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SecondaryMap;
use smallvec::SmallVec;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::entity::EntityId;
use crate::zorder;

/// Inclusive rectangle of grid cells covered by a bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// One registered cell: bucket key plus the entity's slot in that bucket.
#[derive(Clone, Copy)]
struct CellSlot {
    key: u64,
    index: usize,
}

/// Per-entity grid bookkeeping. The recorded range and slots always match
/// the buckets the entity actually sits in.
struct GridEntry {
    range: CellRange,
    slots: SmallVec<[CellSlot; 4]>,
}

/// Spatial hash grid over square cells of side `2^cell_bits` world units.
pub struct SpatialGrid {
    cell_bits: u32,
    hash: fn(u32, u32) -> u64,
    buckets: FxHashMap<u64, Vec<EntityId>>,
    entries: SecondaryMap<EntityId, GridEntry>,
}

impl SpatialGrid {
    /// Grid keyed by the Z-order hash.
    pub fn new(cell_bits: u32) -> Self {
        Self::with_hash(cell_bits, zorder::interleave)
    }

    /// Grid with a custom bucket hash.
    pub fn with_hash(cell_bits: u32, hash: fn(u32, u32) -> u64) -> Self {
        Self {
            cell_bits,
            hash,
            buckets: FxHashMap::default(),
            entries: SecondaryMap::new(),
        }
    }

    /// Side length of one cell in world units.
    pub fn cell_size(&self) -> i32 {
        1 << self.cell_bits
    }

    /// Cells covered by a bounding box, inclusive on both ends.
    ///
    /// Arithmetic shift keeps negative space addressable; adjacent cells
    /// stay adjacent across the origin.
    pub fn cell_range(&self, x: i32, y: i32, width: i32, height: i32) -> CellRange {
        CellRange {
            left: x >> self.cell_bits,
            top: y >> self.cell_bits,
            right: (x + width) >> self.cell_bits,
            bottom: (y + height) >> self.cell_bits,
        }
    }

    #[inline]
    fn key(&self, cell_x: i32, cell_y: i32) -> u64 {
        // The i32 -> u32 cast is a bijection, so distinct cells always get
        // distinct keys; locality degrades across the origin, which is fine
        // for an opaque bucket key.
        (self.hash)(cell_x as u32, cell_y as u32)
    }

    /// Register `entity` in every cell its bounding box overlaps.
    ///
    /// No-op if already tracked; use [`update`](Self::update) to move a
    /// tracked entity.
    pub fn insert(&mut self, x: i32, y: i32, width: i32, height: i32, entity: EntityId) {
        if self.entries.contains_key(entity) {
            return;
        }
        let range = self.cell_range(x, y, width, height);
        let mut slots = SmallVec::new();
        for cell_y in range.top..=range.bottom {
            for cell_x in range.left..=range.right {
                let key = self.key(cell_x, cell_y);
                let bucket = self.buckets.entry(key).or_default();
                slots.push(CellSlot {
                    key,
                    index: bucket.len(),
                });
                bucket.push(entity);
            }
        }
        self.entries.insert(entity, GridEntry { range, slots });
    }

    /// Move `entity` to a new bounding box.
    ///
    /// When the covered cell range is unchanged this does no bucket work at
    /// all — moving within a cell is free. A range change rebuckets via
    /// remove + insert. Untracked entities are inserted.
    pub fn update(&mut self, x: i32, y: i32, width: i32, height: i32, entity: EntityId) {
        let range = self.cell_range(x, y, width, height);
        match self.entries.get(entity) {
            Some(entry) if entry.range == range => {}
            Some(_) => {
                #[cfg(feature = "profiling")]
                let span = info_span!("grid.rebucket");
                #[cfg(feature = "profiling")]
                let _span_guard = span.enter();

                self.remove(entity);
                self.insert(x, y, width, height, entity);
            }
            None => self.insert(x, y, width, height, entity),
        }
    }

    /// Unregister `entity` from every cell it occupies.
    ///
    /// Each bucket removal is swap-and-pop; the displaced entity's recorded
    /// slot for that bucket is patched so its own later removal stays O(1)
    /// per cell. Silent no-op if untracked.
    pub fn remove(&mut self, entity: EntityId) {
        let Some(entry) = self.entries.remove(entity) else {
            return;
        };
        for slot in entry.slots {
            let Some(bucket) = self.buckets.get_mut(&slot.key) else {
                debug_assert!(false, "grid metadata points at a missing bucket");
                continue;
            };
            debug_assert_eq!(bucket.get(slot.index).copied(), Some(entity));
            bucket.swap_remove(slot.index);
            if let Some(&moved) = bucket.get(slot.index) {
                if let Some(moved_entry) = self.entries.get_mut(moved) {
                    if let Some(moved_slot) = moved_entry
                        .slots
                        .iter_mut()
                        .find(|candidate| candidate.key == slot.key)
                    {
                        moved_slot.index = slot.index;
                    }
                }
            } else if bucket.is_empty() {
                self.buckets.remove(&slot.key);
            }
        }
    }

    /// Entities whose bounding boxes overlap any cell of the given box.
    ///
    /// Deduplicated (an entity spanning several queried cells appears
    /// once); order unspecified.
    pub fn query(&self, x: i32, y: i32, width: i32, height: i32) -> Vec<EntityId> {
        let range = self.cell_range(x, y, width, height);
        let mut seen = FxHashSet::default();
        let mut found = Vec::new();
        for cell_y in range.top..=range.bottom {
            for cell_x in range.left..=range.right {
                if let Some(bucket) = self.buckets.get(&self.key(cell_x, cell_y)) {
                    for &entity in bucket {
                        if seen.insert(entity) {
                            found.push(entity);
                        }
                    }
                }
            }
        }
        found
    }

    /// Walk every occupied cell's raw member list.
    ///
    /// For bulk broad-phase work that wants cell locality rather than a
    /// deduplicated flat list.
    pub fn buckets(&self) -> impl Iterator<Item = &[EntityId]> {
        self.buckets.values().map(Vec::as_slice)
    }

    /// True if `entity` is currently registered.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains_key(entity)
    }

    /// Cell range `entity` last occupied.
    pub fn cell_range_of(&self, entity: EntityId) -> Option<CellRange> {
        self.entries.get(entity).map(|entry| entry.range)
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all buckets and metadata.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.entries.clear();
    }
}
