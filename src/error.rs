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

//! Error types
//!
//! Indexing operations are deliberately permissive: re-adding, removing an
//! absent entity, or toggling an attribute to its current presence state are
//! silent no-ops so callers can repeat them safely. The only operation that
//! can fail is destroying an entity through a stale handle.

use std::fmt;

/// Indexing error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Entity handle is stale or was never allocated
    EntityNotFound,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EntityNotFound => write!(f, "Entity not found"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
