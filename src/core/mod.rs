// Copyright 2025 Stoolap Contributors
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

//! Core types and definitions for the join core
//!
//! - [`DataType`] - runtime value types
//! - [`CompareOp`] - comparison operators (=, !=, >, <, etc.)
//! - [`JoinType`] - INNER / LEFT
//! - [`AliasId`] - stable alias ordinal
//! - [`Value`] - runtime values with type information
//! - [`Row`] - an operator output row (per-alias segments plus children)
//! - [`Error`] - error types for build and execution

pub mod error;
pub mod row;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use row::{ChildRows, JoinedRow, Row, RowView, Segment};
pub use types::{AliasId, CompareOp, DataType, JoinType};
pub use value::Value;
