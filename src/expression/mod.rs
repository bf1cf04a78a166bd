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

// Expression evaluation seam of the join core
//
// Join operators never look at expression trees. They hold the three
// extractor traits below and call them per row:
//
//   ┌─────────────┐     ┌──────────────┐     ┌──────────────────────┐
//   │ Expression  │ ──► │   compile    │ ──► │ CompiledPredicate /  │
//   │   (plan)    │     │ (BindScope)  │     │ KeyExtractor         │
//   └─────────────┘     └──────────────┘     └──────────────────────┘
//                                                   │
//                                                   ▼
//                                         ┌───────────────────┐
//                                         │ Row / JoinedRow   │
//                                         └───────────────────┘
//
// Column names are bound to (alias ordinal, column index) once, at build
// time. Columns not present in the evaluated row are read from the outer-row
// stack of the execution context, which is how correlated sub-plans see the
// current outer row.

mod compiled;
mod compiler;

use std::fmt;

use smallvec::SmallVec;

use crate::core::{Result, RowView, Value};
use crate::executor::context::ExecutionContext;
use crate::executor::hash_table::{has_null_key, hash_values};

pub use compiled::{CompiledExpr, CompiledPredicate, KeyExtractor};
pub use compiler::{compile, BindScope};

/// Join-key tuple
pub type KeyValues = SmallVec<[Value; 4]>;

/// Boolean predicate over a row
pub trait ExpressionPredicate: Send + Sync + fmt::Debug {
    /// Evaluate the predicate. NULL counts as "no match"; any other
    /// non-boolean result is an error.
    fn eval(&self, row: &dyn RowView, ctx: &ExecutionContext) -> Result<bool>;
}

/// Join-key tuple extraction
pub trait ExpressionValuesExtractor: Send + Sync + fmt::Debug {
    fn eval_values(&self, row: &dyn RowView, ctx: &ExecutionContext) -> Result<KeyValues>;

    /// Number of values in each extracted tuple
    fn arity(&self) -> usize;
}

/// Join-key hashing
pub trait ExpressionHashFunction {
    /// Hash of the join key, or `None` when the key contains NULL and can
    /// therefore never match
    fn eval_hash(&self, row: &dyn RowView, ctx: &ExecutionContext) -> Result<Option<u64>>;
}

impl<T: ExpressionValuesExtractor + ?Sized> ExpressionHashFunction for T {
    fn eval_hash(&self, row: &dyn RowView, ctx: &ExecutionContext) -> Result<Option<u64>> {
        let values = self.eval_values(row, ctx)?;
        if has_null_key(&values) {
            Ok(None)
        } else {
            Ok(Some(hash_values(&values)))
        }
    }
}

#[cfg(test)]
mod tests;
