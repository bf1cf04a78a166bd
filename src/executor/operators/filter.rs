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

//! Filter Operator.
//!
//! Carries a pushed-down predicate directly above a scan so rows are dropped
//! before any join sees them.

use std::sync::Arc;

use crate::core::{Result, Row};
use crate::executor::context::ExecutionContext;
use crate::executor::operator::{BoxedRowIterator, Operator, RowIterator};
use crate::expression::ExpressionPredicate;

/// Passes through the input rows for which the predicate is true
pub struct FilterOperator {
    input: Box<dyn Operator>,
    predicate: Arc<dyn ExpressionPredicate>,
    // Source text of the predicate, for EXPLAIN
    display: String,
}

impl FilterOperator {
    pub fn new(
        input: Box<dyn Operator>,
        predicate: Arc<dyn ExpressionPredicate>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            input,
            predicate,
            display: display.into(),
        }
    }
}

impl Operator for FilterOperator {
    fn open<'a>(&'a self, ctx: &ExecutionContext) -> Result<BoxedRowIterator<'a>> {
        Ok(Box::new(FilterIterator {
            input: self.input.open(ctx)?,
            predicate: self.predicate.as_ref(),
            ctx: ctx.clone(),
        }))
    }

    fn name(&self) -> &str {
        "Filter"
    }

    fn describe(&self) -> String {
        format!("Filter ({})", self.display)
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.input.as_ref()]
    }
}

struct FilterIterator<'a> {
    input: BoxedRowIterator<'a>,
    predicate: &'a dyn ExpressionPredicate,
    ctx: ExecutionContext,
}

impl RowIterator for FilterIterator<'_> {
    fn next(&mut self) -> Result<Option<Row>> {
        while let Some(row) = self.input.next()? {
            if self.ctx.is_cancelled() {
                return Ok(None);
            }
            if self.predicate.eval(&row, &self.ctx)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}
