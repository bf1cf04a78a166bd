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

//! Nested Loop Join Operator.
//!
//! The fallback strategy with O(N*M) complexity. It's used when:
//! - No equality join keys exist (non-equi joins)
//! - The inner side is correlated to the current outer row
//! - No ON predicate exists (cross join)
//!
//! The inner side is re-opened once per outer row. A correlated inner side is
//! opened with the outer row pushed onto the context's outer-row stack; an
//! uncorrelated one is usually wrapped in a `CachingOperator` by the builder.

use std::sync::Arc;

use crate::core::{Error, JoinType, JoinedRow, Result, Row};
use crate::executor::context::ExecutionContext;
use crate::executor::merge::RowMerger;
use crate::executor::operator::{BoxedRowIterator, Operator, RowIterator};
use crate::expression::ExpressionPredicate;

/// Nested Loop Join Operator.
///
/// For each row of the outer input, scans the inner input and emits matches
/// based on the join predicate, in outer order.
pub struct NestedLoopJoinOperator {
    outer: Box<dyn Operator>,
    inner: Box<dyn Operator>,

    join_type: JoinType,
    merger: RowMerger,
    predicate: Option<Arc<dyn ExpressionPredicate>>,

    // Inner side reads the current outer row through the context
    correlated: bool,

    // Source text of the predicate, for EXPLAIN
    display: Option<String>,
}

impl NestedLoopJoinOperator {
    /// Create a new nested loop join operator.
    ///
    /// # Arguments
    /// * `outer` - Outer input, drives output order
    /// * `inner` - Inner input, re-opened per outer row
    /// * `join_type` - INNER or LEFT
    /// * `merger` - Flatten or populate merging
    /// * `predicate` - Join predicate (None for a cross join)
    pub fn new(
        outer: Box<dyn Operator>,
        inner: Box<dyn Operator>,
        join_type: JoinType,
        merger: RowMerger,
        predicate: Option<Arc<dyn ExpressionPredicate>>,
    ) -> Self {
        Self {
            outer,
            inner,
            join_type,
            merger,
            predicate,
            correlated: false,
            display: None,
        }
    }

    /// Mark the inner side as depending on the current outer row
    pub fn with_correlated(mut self, correlated: bool) -> Self {
        self.correlated = correlated;
        self
    }

    /// Predicate text shown by EXPLAIN
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn is_correlated(&self) -> bool {
        self.correlated
    }
}

impl Operator for NestedLoopJoinOperator {
    fn open<'a>(&'a self, ctx: &ExecutionContext) -> Result<BoxedRowIterator<'a>> {
        tracing::debug!(
            join_type = %self.join_type,
            correlated = self.correlated,
            populate = self.merger.is_populate(),
            "opening nested loop join"
        );
        Ok(Box::new(NestedLoopIterator {
            op: self,
            outer: self.outer.open(ctx)?,
            inner: None,
            current: None,
            matched: false,
            children: Vec::new(),
            ctx: ctx.clone(),
        }))
    }

    fn name(&self) -> &str {
        "NestedLoopJoin"
    }

    fn describe(&self) -> String {
        let mut desc = format!("NestedLoopJoin ({}", self.join_type);
        if let Some(populate) = self.merger.describe() {
            desc.push_str(", ");
            desc.push_str(&populate);
        }
        if self.correlated {
            desc.push_str(", correlated");
        }
        match &self.display {
            Some(cond) => desc.push_str(&format!(", on {})", cond)),
            None => desc.push(')'),
        }
        desc
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.outer.as_ref(), self.inner.as_ref()]
    }
}

struct NestedLoopIterator<'a> {
    op: &'a NestedLoopJoinOperator,
    outer: BoxedRowIterator<'a>,

    // Pass over the inner side for the current outer row
    inner: Option<BoxedRowIterator<'a>>,
    current: Option<Row>,
    matched: bool,

    // Populate mode: matches of the current outer row
    children: Vec<Row>,

    ctx: ExecutionContext,
}

impl NestedLoopIterator<'_> {
    fn matches(&self, outer: &Row, inner: &Row) -> Result<bool> {
        match &self.op.predicate {
            Some(pred) => pred.eval(&JoinedRow::new(outer, inner), &self.ctx),
            None => Ok(true),
        }
    }
}

impl RowIterator for NestedLoopIterator<'_> {
    fn next(&mut self) -> Result<Option<Row>> {
        loop {
            if self.ctx.is_cancelled() {
                return Ok(None);
            }

            // OUTER_NEXT
            if self.current.is_none() {
                let outer = match self.outer.next()? {
                    Some(row) => row,
                    None => return Ok(None),
                };
                let inner = if self.op.correlated {
                    self.op.inner.open(&self.ctx.with_outer_row(outer.clone()))?
                } else {
                    self.op.inner.open(&self.ctx)?
                };
                self.inner = Some(inner);
                self.current = Some(outer);
                self.matched = false;
                self.children.clear();
            }

            // INNER_SCAN
            let next_inner = match self.inner.as_mut() {
                Some(inner) => inner.next()?,
                None => None,
            };
            match next_inner {
                Some(inner_row) => {
                    let outer = match self.current.as_ref() {
                        Some(row) => row,
                        None => return Err(Error::internal("inner row pulled without an outer row")),
                    };
                    if !self.matches(outer, &inner_row)? {
                        continue;
                    }
                    self.matched = true;
                    if self.op.merger.is_populate() {
                        self.children.push(inner_row);
                    } else {
                        return Ok(Some(self.op.merger.merge(outer, Some(&inner_row))));
                    }
                }
                None => {
                    // Inner exhausted, or stopped early by cancellation
                    self.inner = None;
                    let outer = match self.current.take() {
                        Some(row) => row,
                        None => return Err(Error::internal("inner side finished without an outer row")),
                    };
                    if self.ctx.is_cancelled() {
                        return Ok(None);
                    }
                    if self.op.merger.is_populate() {
                        if self.matched || self.op.join_type.preserves_outer() {
                            let children = std::mem::take(&mut self.children);
                            return Ok(Some(self.op.merger.merge_all(outer, children)));
                        }
                    } else if !self.matched && self.op.join_type.preserves_outer() {
                        return Ok(Some(self.op.merger.merge(&outer, None)));
                    }
                }
            }
        }
    }
}
