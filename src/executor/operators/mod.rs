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

//! Physical operators for streaming join execution.
//!
//! Each operator implements the `Operator` trait; `open()` returns a fresh
//! row iterator, so one operator tree can run any number of times.
//!
//! # Available Operators
//!
//! ## Join Operators
//!
//! - `NestedLoopJoinOperator` - Fallback for non-equi and correlated joins, O(N*M)
//! - `HashMatchOperator` - In-memory hash join, O(N+M)
//! - `BatchHashJoinOperator` - Batched index seeks plus a per-batch hash table
//!
//! ## Helpers
//!
//! - `CachingOperator` - Buffers an uncorrelated inner side once
//! - `FilterOperator` - Pushed-down predicate above a source
//!
//! # Algorithm Selection
//!
//! | Condition | Operator |
//! |-----------|----------|
//! | Inner alias has a full-row index covered by the join keys | `BatchHashJoinOperator` |
//! | Equality join keys | `HashMatchOperator` |
//! | Non-equality conditions, correlated inner side | `NestedLoopJoinOperator` |
//! | CROSS JOIN | `NestedLoopJoinOperator` |

pub mod batch_hash_join;
pub mod caching;
pub mod filter;
pub mod hash_match;
pub mod nested_loop_join;

pub use batch_hash_join::BatchHashJoinOperator;
pub use caching::CachingOperator;
pub use filter::FilterOperator;
pub use hash_match::HashMatchOperator;
pub use nested_loop_join::NestedLoopJoinOperator;
