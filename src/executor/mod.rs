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

//! Join executor
//!
//! Turns a logical plan into a tree of pull-based physical operators and
//! runs it.
//!
//! # Architecture
//!
//! ```text
//! LogicalPlan + Catalog metadata
//!   ↓
//! OperatorBuilder (analysis, pushdown, strategy selection)
//!   ↓
//! Operator tree (NestedLoopJoin / HashMatch / BatchHashJoin, ...)
//!   ↓
//! RowIterator::next() until exhausted
//! ```
//!
//! # Components
//!
//! - [`OperatorBuilder`] - Lowers logical joins to physical operators
//! - [`ExecutionContext`] - Cancellation flag and outer-row stack
//! - [`RowMerger`] - Flattening and populating of matched rows
//! - [`JoinHashTable`] - Bucket-chained hash table shared by hash joins
//! - [`explain()`] - Indented rendering of an operator tree

pub mod builder;
pub mod context;
pub mod explain;
pub mod hash_table;
pub mod merge;
pub mod operator;
pub mod operators;

pub use builder::{JoinStrategy, OperatorBuilder};
pub use context::{CancellationHandle, ExecutionContext};
pub use explain::explain;
pub use hash_table::JoinHashTable;
pub use merge::{MergeMode, RowMerger};
pub use operator::{collect_rows, BoxedRowIterator, MaterializedOperator, Operator, RowIterator};
pub use operators::{
    BatchHashJoinOperator, CachingOperator, FilterOperator, HashMatchOperator,
    NestedLoopJoinOperator,
};
