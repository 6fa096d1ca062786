//! Convenient re-exports of commonly used types.
//!
//! The prelude can be imported with:
//! ```
//! use live_index::prelude::*;
//! ```

pub use crate::entity::{AttrSource, Entities, EntityId};
pub use crate::entity_store::{EntityStore, QueryId};
pub use crate::grid::{CellRange, SpatialGrid};
pub use crate::query::{Capability, LiveQuery};
pub use crate::store::{ObjectStore, StoreObserver};
