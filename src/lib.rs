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

//! live_index - Incremental in-memory entity indexing
//!
//! Ordered entity stores with swap-and-pop removal, live capability queries
//! kept in sync on every mutation, and a Z-order spatial hash grid for
//! rectangle queries. Everything is single-threaded, synchronous, and
//! O(1)-ish per operation: built to be called every frame.

pub mod entity;
pub mod entity_store;
pub mod error;
pub mod grid;
pub mod prelude;
pub mod query;
pub mod store;
pub mod zorder;

pub use entity::*;
pub use entity_store::*;
pub use error::*;
pub use grid::*;
pub use query::*;
pub use store::*;
