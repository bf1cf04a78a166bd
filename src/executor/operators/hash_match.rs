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

//! HashMatch Operator - in-memory hash join.
//!
//! This operator implements hash join with O(N + M) complexity:
//! 1. Build phase: on the first outer row, materialize the inner side and
//!    hash its join keys
//! 2. Probe phase: stream the outer side, hash each row's keys and verify
//!    every candidate against the full join predicate
//!
//! The outer side is always the probe side, so a left join can emit its
//! unmatched rows in place and output follows outer order.
//!
//! Uses the same bucket-chain [`JoinHashTable`] as the batched index join.

use std::collections::VecDeque;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::core::{Error, JoinType, JoinedRow, Result, Row};
use crate::executor::context::ExecutionContext;
use crate::executor::hash_table::JoinHashTable;
use crate::executor::merge::RowMerger;
use crate::executor::operator::{BoxedRowIterator, Operator, RowIterator};
use crate::expression::{ExpressionHashFunction, ExpressionPredicate, ExpressionValuesExtractor};

/// Build side of a hash join: rows with non-NULL keys plus their table
pub(crate) struct BuildSide {
    pub(crate) rows: Vec<Row>,
    pub(crate) table: JoinHashTable,
}

impl BuildSide {
    /// Hash every row of `input` by `keys`; rows with a NULL key are dropped
    pub(crate) fn build(
        input: &mut dyn RowIterator,
        keys: &dyn ExpressionValuesExtractor,
        filter: Option<&dyn ExpressionPredicate>,
        ctx: &ExecutionContext,
    ) -> Result<Self> {
        let mut rows = Vec::new();
        let mut hashes: Vec<(u64, u32)> = Vec::new();
        while let Some(row) = input.next()? {
            if let Some(filter) = filter {
                if !filter.eval(&row, ctx)? {
                    continue;
                }
            }
            if let Some(hash) = keys.eval_hash(&row, ctx)? {
                hashes.push((hash, rows.len() as u32));
                rows.push(row);
            }
        }
        Ok(Self {
            table: JoinHashTable::from_hashes(&hashes),
            rows,
        })
    }

    /// Candidates for `hash` that satisfy `predicate` against `outer`, in
    /// build order
    pub(crate) fn verified_matches(
        &self,
        outer: &Row,
        hash: Option<u64>,
        predicate: &dyn ExpressionPredicate,
        ctx: &ExecutionContext,
    ) -> Result<SmallVec<[&Row; 8]>> {
        let mut matches = SmallVec::new();
        let hash = match hash {
            Some(hash) => hash,
            None => return Ok(matches),
        };
        for idx in self.table.probe(hash) {
            let inner = &self.rows[idx];
            if predicate.eval(&JoinedRow::new(outer, inner), ctx)? {
                matches.push(inner);
            }
        }
        Ok(matches)
    }
}

/// HashMatch Operator.
pub struct HashMatchOperator {
    outer: Box<dyn Operator>,
    inner: Box<dyn Operator>,

    join_type: JoinType,
    merger: RowMerger,

    // Join keys, pairwise aligned
    outer_keys: Arc<dyn ExpressionValuesExtractor>,
    inner_keys: Arc<dyn ExpressionValuesExtractor>,

    // Full join predicate, re-checked per candidate
    predicate: Arc<dyn ExpressionPredicate>,

    // Key text for EXPLAIN
    display: Option<String>,
}

impl HashMatchOperator {
    pub fn new(
        outer: Box<dyn Operator>,
        inner: Box<dyn Operator>,
        join_type: JoinType,
        merger: RowMerger,
        outer_keys: Arc<dyn ExpressionValuesExtractor>,
        inner_keys: Arc<dyn ExpressionValuesExtractor>,
        predicate: Arc<dyn ExpressionPredicate>,
    ) -> Self {
        Self {
            outer,
            inner,
            join_type,
            merger,
            outer_keys,
            inner_keys,
            predicate,
            display: None,
        }
    }

    /// Key text shown by EXPLAIN
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Build phase: materialize the inner side and hash its keys
    fn build_side(&self, ctx: &ExecutionContext) -> Result<BuildSide> {
        let mut inner = self.inner.open(ctx)?;
        let build = BuildSide::build(inner.as_mut(), self.inner_keys.as_ref(), None, ctx)?;
        tracing::debug!(
            join_type = %self.join_type,
            build_rows = build.rows.len(),
            buckets = build.table.bucket_count(),
            "hash match build complete"
        );
        Ok(build)
    }
}

impl Operator for HashMatchOperator {
    fn open<'a>(&'a self, ctx: &ExecutionContext) -> Result<BoxedRowIterator<'a>> {
        Ok(Box::new(HashMatchIterator {
            op: self,
            outer: self.outer.open(ctx)?,
            build: None,
            pending: VecDeque::new(),
            ctx: ctx.clone(),
        }))
    }

    fn name(&self) -> &str {
        "HashMatch"
    }

    fn describe(&self) -> String {
        let mut desc = format!("HashMatch ({}", self.join_type);
        if let Some(populate) = self.merger.describe() {
            desc.push_str(", ");
            desc.push_str(&populate);
        }
        match &self.display {
            Some(keys) => desc.push_str(&format!(", keys {})", keys)),
            None => desc.push(')'),
        }
        desc
    }

    fn children(&self) -> Vec<&dyn Operator> {
        vec![self.outer.as_ref(), self.inner.as_ref()]
    }
}

struct HashMatchIterator<'a> {
    op: &'a HashMatchOperator,
    outer: BoxedRowIterator<'a>,

    // Built on the first outer row; an empty outer side never reads the inner
    build: Option<BuildSide>,

    // Output of the last probed outer row not yet returned
    pending: VecDeque<Row>,

    ctx: ExecutionContext,
}

impl RowIterator for HashMatchIterator<'_> {
    fn next(&mut self) -> Result<Option<Row>> {
        loop {
            if self.ctx.is_cancelled() {
                return Ok(None);
            }
            if let Some(row) = self.pending.pop_front() {
                return Ok(Some(row));
            }

            let outer = match self.outer.next()? {
                Some(row) => row,
                None => return Ok(None),
            };
            if self.build.is_none() {
                self.build = Some(self.op.build_side(&self.ctx)?);
            }
            let build = match &self.build {
                Some(build) => build,
                None => return Err(Error::internal("hash match probed before its build phase")),
            };

            // Probe phase
            let hash = self.op.outer_keys.eval_hash(&outer, &self.ctx)?;
            let matches = build.verified_matches(
                &outer,
                hash,
                self.op.predicate.as_ref(),
                &self.ctx,
            )?;
            self.op
                .merger
                .emit_matches(self.op.join_type, outer, &matches, &mut self.pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AliasId, CompareOp, RowView, Value};
    use crate::executor::operator::{collect_rows, MaterializedOperator};
    use crate::expression::{CompiledExpr, CompiledPredicate, KeyExtractor};
    use crate::plan::ArithmeticOp;

    const S: AliasId = AliasId(0);
    const A: AliasId = AliasId(1);

    fn make_input(alias: AliasId, values: &[Option<i64>]) -> Box<dyn Operator> {
        let rows = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let value = v.map(Value::integer).unwrap_or(Value::Null);
                Row::new(alias, i, vec![value])
            })
            .collect();
        Box::new(MaterializedOperator::new(rows))
    }

    fn col(alias: AliasId) -> CompiledExpr {
        CompiledExpr::Column { alias, index: 0 }
    }

    fn make_join(
        outer: &[Option<i64>],
        inner: &[Option<i64>],
        join_type: JoinType,
        merger: RowMerger,
    ) -> HashMatchOperator {
        let predicate = CompiledPredicate::new(CompiledExpr::Compare {
            op: CompareOp::Eq,
            left: Box::new(col(A)),
            right: Box::new(col(S)),
        });
        HashMatchOperator::new(
            make_input(S, outer),
            make_input(A, inner),
            join_type,
            merger,
            Arc::new(KeyExtractor::new(vec![col(S)])),
            Arc::new(KeyExtractor::new(vec![col(A)])),
            Arc::new(predicate),
        )
    }

    #[test]
    fn test_inner_and_left() {
        let outer = [Some(1), Some(2)];
        let inner = [Some(1), Some(1), Some(3)];
        let ctx = ExecutionContext::new();

        let op = make_join(&outer, &inner, JoinType::Inner, RowMerger::flatten(vec![(A, 1)]));
        let rows = collect_rows(&op, &ctx).unwrap();
        assert_eq!(rows.len(), 2);
        // Build order kept within one outer row
        let inner_values: Vec<Value> =
            rows.iter().map(|r| r.value(A, 0).cloned().unwrap()).collect();
        assert_eq!(inner_values, vec![Value::integer(1), Value::integer(1)]);

        let op = make_join(&outer, &inner, JoinType::Left, RowMerger::flatten(vec![(A, 1)]));
        let rows = collect_rows(&op, &ctx).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].value(A, 0), Some(&Value::Null));
    }

    #[test]
    fn test_populate() {
        let op = make_join(
            &[Some(1), Some(2)],
            &[Some(1), Some(1), Some(3)],
            JoinType::Inner,
            RowMerger::populate(A),
        );
        let rows = collect_rows(&op, &ExecutionContext::new()).unwrap();
        assert_eq!(rows.len(), 1);
        let children = rows[0].children(A).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].position(), 0);
        assert_eq!(children[1].position(), 1);
    }

    #[test]
    fn test_null_keys_never_match() {
        let op = make_join(
            &[None, Some(1)],
            &[None, Some(1)],
            JoinType::Left,
            RowMerger::flatten(vec![(A, 1)]),
        );
        let rows = collect_rows(&op, &ExecutionContext::new()).unwrap();
        assert_eq!(rows.len(), 2);
        // NULL outer row survives null-merged
        assert_eq!(rows[0].value(S, 0), Some(&Value::Null));
        assert_eq!(rows[0].value(A, 0), Some(&Value::Null));
        assert_eq!(rows[1].value(A, 0), Some(&Value::integer(1)));
    }

    #[test]
    fn test_probe_order_follows_outer() {
        let op = make_join(
            &[Some(3), Some(1), Some(2)],
            &[Some(1), Some(2), Some(3)],
            JoinType::Inner,
            RowMerger::flatten(vec![(A, 1)]),
        );
        let rows = collect_rows(&op, &ExecutionContext::new()).unwrap();
        let outer_positions: Vec<usize> = rows.iter().map(|r| r.position()).collect();
        assert_eq!(outer_positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_outer() {
        let op = make_join(
            &[],
            &[Some(1), Some(2)],
            JoinType::Inner,
            RowMerger::flatten(vec![(A, 1)]),
        );
        assert!(collect_rows(&op, &ExecutionContext::new()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_outer_never_reads_inner() {
        // Every inner key divides by zero; an empty outer side must not care
        let inner_keys = KeyExtractor::new(vec![CompiledExpr::Arithmetic {
            op: ArithmeticOp::Div,
            left: Box::new(col(A)),
            right: Box::new(CompiledExpr::Literal(Value::integer(0))),
        }]);
        let op = HashMatchOperator::new(
            make_input(S, &[]),
            make_input(A, &[Some(1), Some(2)]),
            JoinType::Left,
            RowMerger::flatten(vec![(A, 1)]),
            Arc::new(KeyExtractor::new(vec![col(S)])),
            Arc::new(inner_keys),
            Arc::new(CompiledPredicate::new(CompiledExpr::Literal(Value::boolean(true)))),
        );
        let ctx = ExecutionContext::new();
        assert!(collect_rows(&op, &ctx).unwrap().is_empty());

        // With an outer row the build runs and the error surfaces
        let op = HashMatchOperator::new(
            make_input(S, &[Some(1)]),
            op.inner,
            op.join_type,
            op.merger,
            op.outer_keys,
            op.inner_keys,
            op.predicate,
        );
        assert_eq!(collect_rows(&op, &ctx).unwrap_err(), Error::DivisionByZero);
    }

    #[test]
    fn test_describe() {
        let op = make_join(&[], &[], JoinType::Left, RowMerger::populate(A).with_label("a"))
            .with_display("s.id = a.art_id");
        assert_eq!(op.describe(), "HashMatch (LEFT, populate a, keys s.id = a.art_id)");
        assert_eq!(op.children().len(), 2);
    }
}
