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

//! Volcano-style operator interface for streaming join execution.
//!
//! Operators pull rows on demand rather than materializing everything
//! upfront.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ Consumer     │ ← Pulls rows via next()
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │ Join Op      │ ← Outer side streamed, inner side scanned/hashed/seeked
//! └──────┬───────┘
//!        │
//! ┌──────┴──────┐
//! │             │
//! ▼             ▼
//! ┌─────┐   ┌────────┐
//! │Scan │   │ Filter │ ← Pushed-down predicate
//! └─────┘   └───┬────┘
//!               ▼
//!           ┌─────┐
//!           │Scan │ ← Stream rows from the catalog
//!           └─────┘
//! ```
//!
//! An [`Operator`] is an immutable plan node. `open()` hands out a fresh
//! [`RowIterator`] holding all execution state, so the same operator can be
//! opened any number of times; a nested loop re-opens its inner side once per
//! outer row.

use std::sync::Arc;

use crate::core::{Result, Row};

use super::context::ExecutionContext;

/// Pull-based row cursor returned by [`Operator::open`].
///
/// Returns:
/// - `Ok(Some(row))` - A row is available
/// - `Ok(None)` - No more rows (exhausted, or the query was cancelled)
/// - `Err(e)` - An error occurred; the query must stop
///
/// After returning `None`, subsequent calls should continue to return `None`.
pub trait RowIterator {
    fn next(&mut self) -> Result<Option<Row>>;
}

/// Boxed iterator borrowing from the operator that opened it
pub type BoxedRowIterator<'a> = Box<dyn RowIterator + 'a>;

/// Physical plan node.
///
/// # Thread Safety
///
/// Operators are `Send` so a finished tree can be moved to the thread that
/// runs the query. Execution itself is single-threaded.
pub trait Operator: Send {
    /// Start a new pass over this operator's rows.
    fn open<'a>(&'a self, ctx: &ExecutionContext) -> Result<BoxedRowIterator<'a>>;

    /// Get a descriptive name for this operator (for EXPLAIN).
    fn name(&self) -> &str;

    /// One-line description with the operator's parameters (for EXPLAIN).
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Child operators, outer side first.
    fn children(&self) -> Vec<&dyn Operator> {
        Vec::new()
    }

    /// Get an estimate of the number of rows this operator will produce.
    fn estimated_rows(&self) -> Option<usize> {
        None
    }
}

/// Drain one pass of `op` into a vector.
pub fn collect_rows(op: &dyn Operator, ctx: &ExecutionContext) -> Result<Vec<Row>> {
    let mut iter = op.open(ctx)?;
    let mut rows = Vec::new();
    while let Some(row) = iter.next()? {
        rows.push(row);
    }
    Ok(rows)
}

// ============================================================================
// Helper Operators
// ============================================================================

/// Iterator replaying a shared, already materialized row sequence.
pub(crate) struct ReplayIterator {
    rows: Arc<Vec<Row>>,
    pos: usize,
    ctx: ExecutionContext,
}

impl ReplayIterator {
    pub(crate) fn new(rows: Arc<Vec<Row>>, ctx: &ExecutionContext) -> Self {
        Self {
            rows,
            pos: 0,
            ctx: ctx.clone(),
        }
    }
}

impl RowIterator for ReplayIterator {
    fn next(&mut self) -> Result<Option<Row>> {
        if self.ctx.is_cancelled() {
            return Ok(None);
        }
        let row = self.rows.get(self.pos).cloned();
        if row.is_some() {
            self.pos += 1;
        }
        Ok(row)
    }
}

/// An operator that yields rows from a pre-materialized vector.
///
/// Every `open()` replays the same rows from the start.
pub struct MaterializedOperator {
    rows: Arc<Vec<Row>>,
}

impl MaterializedOperator {
    /// Create an operator from a vector of rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Arc::new(rows),
        }
    }

    /// Create from shared rows without copying them.
    pub fn from_arc(rows: Arc<Vec<Row>>) -> Self {
        Self { rows }
    }
}

impl Operator for MaterializedOperator {
    fn open<'a>(&'a self, ctx: &ExecutionContext) -> Result<BoxedRowIterator<'a>> {
        Ok(Box::new(ReplayIterator::new(self.rows.clone(), ctx)))
    }

    fn name(&self) -> &str {
        "Materialized"
    }

    fn describe(&self) -> String {
        format!("Materialized ({} rows)", self.rows.len())
    }

    fn estimated_rows(&self) -> Option<usize> {
        Some(self.rows.len())
    }
}
