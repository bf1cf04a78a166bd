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

//! Execution Context
//!
//! This module provides the execution context threaded through every
//! `open()` call: the cooperative cancellation flag and the stack of outer
//! rows that correlated inner sub-plans read from.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{AliasId, Row, RowView, Value};

/// One level of the outer-row stack
#[derive(Debug)]
struct OuterFrame {
    row: Row,
    parent: Option<Arc<OuterFrame>>,
}

/// Execution context for join pipelines
///
/// Cloning is cheap: the cancellation flag and the outer-row stack are both
/// behind `Arc`, so a correlated nested loop can derive a context per outer
/// row without copying anything but the new row.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Cancellation flag, shared by every context derived from this one
    cancelled: Arc<AtomicBool>,
    /// Innermost outer row for correlated sub-plans
    outer: Option<Arc<OuterFrame>>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    /// Create a new empty execution context
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            outer: None,
        }
    }

    /// Check if the query has been cancelled
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Cancel the query
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Get a handle that can cancel this query from another thread
    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle {
            cancelled: self.cancelled.clone(),
        }
    }

    /// Create a new context with `row` pushed on the outer-row stack.
    ///
    /// The new context shares the cancellation flag with `self`.
    pub fn with_outer_row(&self, row: Row) -> Self {
        Self {
            cancelled: self.cancelled.clone(),
            outer: Some(Arc::new(OuterFrame {
                row,
                parent: self.outer.clone(),
            })),
        }
    }

    /// Check if any outer row is bound
    pub fn has_outer_row(&self) -> bool {
        self.outer.is_some()
    }

    /// Depth of the outer-row stack
    pub fn outer_depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self.outer.as_deref();
        while let Some(f) = frame {
            depth += 1;
            frame = f.parent.as_deref();
        }
        depth
    }

    /// Look up a column in the outer-row stack, innermost frame first
    pub fn outer_value(&self, alias: AliasId, index: usize) -> Option<&Value> {
        let mut frame = self.outer.as_deref();
        while let Some(f) = frame {
            if let Some(v) = f.row.value(alias, index) {
                return Some(v);
            }
            frame = f.parent.as_deref();
        }
        None
    }
}

/// Handle for cancelling a query from another thread
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    /// Cancel the query
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Check if the query has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_new() {
        let ctx = ExecutionContext::new();
        assert!(!ctx.is_cancelled());
        assert!(!ctx.has_outer_row());
        assert_eq!(ctx.outer_depth(), 0);
    }

    #[test]
    fn test_context_cancellation() {
        let ctx = ExecutionContext::new();
        let handle = ctx.cancellation_handle();
        assert!(!handle.is_cancelled());

        handle.cancel();
        assert!(ctx.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_derived_context_shares_cancellation() {
        let ctx = ExecutionContext::new();
        let derived = ctx.with_outer_row(Row::new(AliasId(0), 0, vec![Value::integer(1)]));
        ctx.cancel();
        assert!(derived.is_cancelled());
    }

    #[test]
    fn test_outer_row_stack() {
        let ctx = ExecutionContext::new()
            .with_outer_row(Row::new(AliasId(0), 0, vec![Value::integer(1)]))
            .with_outer_row(Row::new(AliasId(1), 0, vec![Value::integer(2)]));

        assert_eq!(ctx.outer_depth(), 2);
        assert_eq!(ctx.outer_value(AliasId(1), 0), Some(&Value::integer(2)));
        assert_eq!(ctx.outer_value(AliasId(0), 0), Some(&Value::integer(1)));
        assert_eq!(ctx.outer_value(AliasId(2), 0), None);
    }
}
