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

//! Batch Hash Join Operator - batched index seeks.
//!
//! Instead of one index lookup per outer row, this operator:
//! 1. Pulls up to `batch_size` rows from the outer side
//! 2. Evaluates one seek key per row, in index column order (constants from
//!    pushed-down equalities, join-key expressions otherwise)
//! 3. Issues a single batched seek for the distinct keys of the batch
//! 4. Hashes the returned inner rows by the index columns and probes them
//!    with the batch's outer rows, in outer order
//!
//! Each batch builds its own table; nothing is shared across batches.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::config::DEFAULT_BATCH_SIZE;
use crate::core::{Error, JoinType, Result, Row};
use crate::executor::context::ExecutionContext;
use crate::executor::hash_table::{has_null_key, hash_values};
use crate::executor::merge::RowMerger;
use crate::executor::operator::{BoxedRowIterator, Operator, RowIterator};
use crate::expression::{ExpressionPredicate, ExpressionValuesExtractor, KeyValues};
use crate::plan::AliasNode;
use crate::storage::{Catalog, Index};

use super::hash_match::BuildSide;

/// Batch Hash Join Operator.
pub struct BatchHashJoinOperator {
    outer: Box<dyn Operator>,

    // Inner side, read through batched index seeks
    catalog: Arc<dyn Catalog>,
    inner_alias: AliasNode,
    index: Index,

    join_type: JoinType,
    merger: RowMerger,

    // Seek key per outer row and index-column key per inner row, both in
    // index column order
    seek_keys: Arc<dyn ExpressionValuesExtractor>,
    inner_keys: Arc<dyn ExpressionValuesExtractor>,

    // Pushed-down predicate on the inner alias, applied before hashing
    inner_filter: Option<Arc<dyn ExpressionPredicate>>,
    // Full join predicate, re-checked per candidate
    predicate: Arc<dyn ExpressionPredicate>,

    batch_size: usize,
}

impl BatchHashJoinOperator {
    /// Create a new batch hash join.
    ///
    /// Fails with `IndexNotFullRow` unless the index leads to full rows, and
    /// with `InvalidPlan` when the key extractors do not match the index
    /// width.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        outer: Box<dyn Operator>,
        catalog: Arc<dyn Catalog>,
        inner_alias: AliasNode,
        index: Index,
        join_type: JoinType,
        merger: RowMerger,
        seek_keys: Arc<dyn ExpressionValuesExtractor>,
        inner_keys: Arc<dyn ExpressionValuesExtractor>,
        predicate: Arc<dyn ExpressionPredicate>,
    ) -> Result<Self> {
        if !index.is_full_row() {
            return Err(Error::index_not_full_row(&inner_alias.table, &index.columns));
        }
        let width = index.columns.len();
        if seek_keys.arity() != width || inner_keys.arity() != width {
            return Err(Error::invalid_plan(format!(
                "seek key width {} / {} does not match index {}",
                seek_keys.arity(),
                inner_keys.arity(),
                index
            )));
        }
        Ok(Self {
            outer,
            catalog,
            inner_alias,
            index,
            join_type,
            merger,
            seek_keys,
            inner_keys,
            inner_filter: None,
            predicate,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Filter applied to seeked inner rows before hashing
    pub fn with_inner_filter(mut self, filter: Option<Arc<dyn ExpressionPredicate>>) -> Self {
        self.inner_filter = filter;
        self
    }

    /// Outer rows per seek (at least 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn index(&self) -> &Index {
        &self.index
    }
}

impl Operator for BatchHashJoinOperator {
    fn open<'a>(&'a self, ctx: &ExecutionContext) -> Result<BoxedRowIterator<'a>> {
        tracing::debug!(
            join_type = %self.join_type,
            alias = %self.inner_alias.alias,
            index = %self.index,
            batch_size = self.batch_size,
            "opening batch hash join"
        );
        Ok(Box::new(BatchHashJoinIterator {
            op: self,
            outer: self.outer.open(ctx)?,
            outer_done: false,
            batch: VecDeque::with_capacity(self.batch_size),
            build: None,
            pending: VecDeque::new(),
            batches: 0,
            ctx: ctx.clone(),
        }))
    }

    fn name(&self) -> &str {
        "BatchHashJoin"
    }

    fn describe(&self) -> String {
        let mut desc = format!("BatchHashJoin ({}", self.join_type);
        if let Some(populate) = self.merger.describe() {
            desc.push_str(", ");
            desc.push_str(&populate);
        }
        desc.push_str(&format!(
            ", index {}, batch {})",
            self.index, self.batch_size
        ));
        desc
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.outer.as_ref()]
    }
}

struct BatchHashJoinIterator<'a> {
    op: &'a BatchHashJoinOperator,
    outer: BoxedRowIterator<'a>,
    outer_done: bool,

    // Outer rows of the current batch not probed yet, with their key hash
    // (None for a NULL key)
    batch: VecDeque<(Row, Option<u64>)>,
    // Inner rows of the current batch; None when the batch had no seek key
    build: Option<BuildSide>,
    pending: VecDeque<Row>,

    batches: usize,
    ctx: ExecutionContext,
}

impl BatchHashJoinIterator<'_> {
    /// Pull the next batch of outer rows and seek their inner matches
    fn load_batch(&mut self) -> Result<()> {
        let op = self.op;
        let mut keys: Vec<KeyValues> = Vec::new();
        let mut seen: FxHashSet<KeyValues> = FxHashSet::default();

        while self.batch.len() < op.batch_size {
            let outer = match self.outer.next()? {
                Some(row) => row,
                None => {
                    self.outer_done = true;
                    break;
                }
            };
            let values = op.seek_keys.eval_values(&outer, &self.ctx)?;
            let hash = if has_null_key(&values) {
                None
            } else {
                let hash = hash_values(&values);
                if seen.insert(values.clone()) {
                    keys.push(values);
                }
                Some(hash)
            };
            self.batch.push_back((outer, hash));
        }

        self.build = None;
        if keys.is_empty() || self.ctx.is_cancelled() {
            return Ok(());
        }

        self.batches += 1;
        tracing::trace!(
            batch = self.batches,
            outer_rows = self.batch.len(),
            seek_keys = keys.len(),
            "batched index seek"
        );
        let mut inner = op
            .catalog
            .open_batch(&self.ctx, &op.inner_alias, &op.index, &keys)?;
        let build = BuildSide::build(
            inner.as_mut(),
            op.inner_keys.as_ref(),
            op.inner_filter.as_deref(),
            &self.ctx,
        )?;
        tracing::trace!(batch = self.batches, inner_rows = build.rows.len(), "batch built");
        self.build = Some(build);
        Ok(())
    }
}

impl RowIterator for BatchHashJoinIterator<'_> {
    fn next(&mut self) -> Result<Option<Row>> {
        loop {
            if self.ctx.is_cancelled() {
                return Ok(None);
            }
            if let Some(row) = self.pending.pop_front() {
                return Ok(Some(row));
            }

            if let Some((outer, hash)) = self.batch.pop_front() {
                let matches: SmallVec<[&Row; 8]> = match &self.build {
                    Some(build) => build.verified_matches(
                        &outer,
                        hash,
                        self.op.predicate.as_ref(),
                        &self.ctx,
                    )?,
                    None => SmallVec::new(),
                };
                self.op
                    .merger
                    .emit_matches(self.op.join_type, outer, &matches, &mut self.pending);
                continue;
            }

            if self.outer_done {
                return Ok(None);
            }
            self.load_batch()?;
            if self.batch.is_empty() {
                return Ok(None);
            }
        }
    }
}
