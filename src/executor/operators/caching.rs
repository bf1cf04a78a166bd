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

//! Caching Operator.
//!
//! Materializes its input on the first pull of the first pass and replays the
//! buffered rows on every later pass. Used for the inner side of a nested
//! loop that does not depend on the current outer row.
//!
//! A pass interrupted by cancellation is not cached, so a later pass still
//! sees the complete input.

use std::cell::RefCell;
use std::sync::Arc;

use crate::core::{Result, Row};
use crate::executor::context::ExecutionContext;
use crate::executor::operator::{BoxedRowIterator, Operator, ReplayIterator, RowIterator};

/// Buffers its input once and replays it on every later open.
///
/// The buffer lives as long as the operator, so it outlives a single run:
/// re-running a built plan with a fresh [`ExecutionContext`] replays the rows
/// read by the first run, even if the underlying data has changed since.
/// Rebuild the plan to see new data.
pub struct CachingOperator {
    input: Box<dyn Operator>,
    cache: RefCell<Option<Arc<Vec<Row>>>>,
}

impl CachingOperator {
    pub fn new(input: Box<dyn Operator>) -> Self {
        Self {
            input,
            cache: RefCell::new(None),
        }
    }

    /// Check if the input has been buffered
    pub fn is_cached(&self) -> bool {
        self.cache.borrow().is_some()
    }

    fn cached(&self) -> Option<Arc<Vec<Row>>> {
        self.cache.borrow().clone()
    }

    /// Drain the input once and keep the rows
    fn fill(&self, ctx: &ExecutionContext) -> Result<Arc<Vec<Row>>> {
        let mut iter = self.input.open(ctx)?;
        let mut rows = Vec::new();
        while let Some(row) = iter.next()? {
            rows.push(row);
        }
        let rows = Arc::new(rows);
        if !ctx.is_cancelled() {
            tracing::debug!(rows = rows.len(), "cached inner side");
            *self.cache.borrow_mut() = Some(rows.clone());
        }
        Ok(rows)
    }
}

impl Operator for CachingOperator {
    fn open<'a>(&'a self, ctx: &ExecutionContext) -> Result<BoxedRowIterator<'a>> {
        let replay = self.cached().map(|rows| ReplayIterator::new(rows, ctx));
        Ok(Box::new(CachingIterator {
            op: self,
            replay,
            ctx: ctx.clone(),
        }))
    }

    fn name(&self) -> &str {
        "Cache"
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.input.as_ref()]
    }

    fn estimated_rows(&self) -> Option<usize> {
        match self.cache.borrow().as_ref() {
            Some(rows) => Some(rows.len()),
            None => self.input.estimated_rows(),
        }
    }
}

struct CachingIterator<'a> {
    op: &'a CachingOperator,
    // None until the first pull
    replay: Option<ReplayIterator>,
    ctx: ExecutionContext,
}

impl RowIterator for CachingIterator<'_> {
    fn next(&mut self) -> Result<Option<Row>> {
        if self.replay.is_none() {
            let rows = match self.op.cached() {
                Some(rows) => rows,
                None => self.op.fill(&self.ctx)?,
            };
            self.replay = Some(ReplayIterator::new(rows, &self.ctx));
        }
        match self.replay.as_mut() {
            Some(replay) => replay.next(),
            None => Ok(None),
        }
    }
}
