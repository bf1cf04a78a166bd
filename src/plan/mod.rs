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

//! Build-time inputs of the join core
//!
//! - [`AliasTree`] - resolved aliases with stable ordinals
//! - [`Expression`] - predicate trees over qualified columns
//! - [`LogicalPlan`] - the join tree to lower into physical operators

pub mod alias;
pub mod expr;
pub mod logical;

pub use alias::{AliasNode, AliasTree};
pub use expr::{
    and_all, arithmetic, col, compare, eq, is_null, lit, not, or_all, unqualified, AliasRefs,
    ArithmeticOp, ColumnRef, Expression,
};
pub use logical::{JoinNode, LogicalPlan, ScanNode};
