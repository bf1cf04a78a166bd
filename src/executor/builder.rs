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

//! Operator builder: lowers a logical plan to a physical operator tree.
//!
//! For every join node the builder
//! 1. validates the aliases the ON predicate references
//! 2. analyzes the ON predicate and moves conjuncts local to the inner alias
//!    into the inner scan's filter
//! 3. picks a strategy, in priority order:
//!    - `BatchHashJoin` when a full-row index of the inner alias is covered by
//!      join keys plus constant equalities
//!    - `HashMatch` when at least one equi-join key exists
//!    - `NestedLoopJoin` otherwise, with a `CachingOperator` around an
//!      uncorrelated inner side
//!
//! An inner side that reads columns of the outer side is correlated: it is
//! always run as a nested loop and re-opened per outer row.
//!
//! Join type and populate mode never influence the choice.

use std::sync::Arc;

use crate::config::JoinConfig;
use crate::core::{AliasId, Error, Result, Value};
use crate::expression::{
    compile, BindScope, CompiledExpr, CompiledPredicate, ExpressionPredicate, KeyExtractor,
};
use crate::optimizer::{analyze, split_pushdown, AnalyzeResult};
use crate::plan::{and_all, AliasNode, AliasTree, Expression, JoinNode, LogicalPlan};
use crate::storage::{Catalog, Index};

use super::merge::RowMerger;
use super::operator::Operator;
use super::operators::{
    BatchHashJoinOperator, CachingOperator, FilterOperator, HashMatchOperator,
    NestedLoopJoinOperator,
};

/// Physical join strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrategy {
    NestedLoop,
    HashMatch,
    BatchHashJoin,
}

impl std::fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinStrategy::NestedLoop => write!(f, "NestedLoopJoin"),
            JoinStrategy::HashMatch => write!(f, "HashMatch"),
            JoinStrategy::BatchHashJoin => write!(f, "BatchHashJoin"),
        }
    }
}

/// Which side of a join an expression reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Constant,
    Outer,
    Inner,
    Mixed,
}

/// Alias names visible to one join, lowercased
struct JoinScope {
    outer: Vec<String>,
    inner: Vec<String>,
    enclosing: Vec<String>,
}

impl JoinScope {
    fn contains(names: &[String], name: &str) -> bool {
        names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Unqualified columns belong to the inner (current) alias
    fn side_of(&self, expr: &Expression) -> Side {
        let refs = expr.alias_refs();
        if refs.is_empty() {
            return Side::Constant;
        }
        let all_inner = refs.qualified.iter().all(|a| Self::contains(&self.inner, a));
        let all_outer = !refs.has_unqualified
            && refs
                .qualified
                .iter()
                .all(|a| Self::contains(&self.outer, a) || Self::contains(&self.enclosing, a));
        match (all_inner, all_outer) {
            (true, _) => Side::Inner,
            (false, true) => Side::Outer,
            _ => Side::Mixed,
        }
    }

    /// First referenced alias unknown to this join
    fn unknown_alias(&self, expr: &Expression) -> Option<String> {
        expr.alias_refs().qualified.into_iter().find(|a| {
            !Self::contains(&self.outer, a)
                && !Self::contains(&self.inner, a)
                && !Self::contains(&self.enclosing, a)
        })
    }
}

/// Equi-join key pair: (outer side, inner side)
type KeyPair = (Expression, Expression);

/// Builds physical operators from logical plans
pub struct OperatorBuilder {
    catalog: Arc<dyn Catalog>,
    tree: Arc<AliasTree>,
    config: JoinConfig,
}

impl OperatorBuilder {
    pub fn new(catalog: Arc<dyn Catalog>, tree: Arc<AliasTree>) -> Self {
        Self {
            catalog,
            tree,
            config: JoinConfig::default(),
        }
    }

    /// Builder method to set the configuration
    pub fn with_config(mut self, config: JoinConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    pub fn tree(&self) -> &AliasTree {
        &self.tree
    }

    /// Lower `plan` to an operator tree
    pub fn build(&self, plan: &LogicalPlan) -> Result<Box<dyn Operator>> {
        self.validate_aliases(plan)?;
        self.build_plan(plan, &[])
    }

    /// Strategy `build` would pick for the topmost join of `plan`
    pub fn choose_strategy(&self, plan: &LogicalPlan) -> Result<Option<JoinStrategy>> {
        match plan {
            LogicalPlan::Scan(_) => Ok(None),
            LogicalPlan::Join(join) => {
                self.validate_aliases(plan)?;
                let lowered = self.lower_join(join, &[])?;
                Ok(Some(lowered.strategy))
            }
        }
    }

    /// Every scanned alias must exist and be scanned only once
    fn validate_aliases(&self, plan: &LogicalPlan) -> Result<()> {
        let aliases = plan.aliases();
        for (i, id) in aliases.iter().enumerate() {
            let node = self.tree.node(*id)?;
            if aliases[..i].contains(id) {
                return Err(Error::invalid_plan(format!(
                    "alias '{}' is scanned more than once",
                    node.alias
                )));
            }
        }
        Ok(())
    }

    fn build_plan(&self, plan: &LogicalPlan, enclosing: &[AliasId]) -> Result<Box<dyn Operator>> {
        match plan {
            LogicalPlan::Scan(scan) => self.build_scan(scan.alias, scan.filter.as_ref(), enclosing),
            LogicalPlan::Join(join) => Ok(self.lower_join(join, enclosing)?.op),
        }
    }

    /// Scan of `alias` with `filter` applied directly above it
    fn build_scan(
        &self,
        alias: AliasId,
        filter: Option<&Expression>,
        enclosing: &[AliasId],
    ) -> Result<Box<dyn Operator>> {
        let node = self.tree.node(alias)?;
        let scan = self.catalog.scan_operator(node)?;
        let filter = match filter {
            Some(filter) => filter,
            None => return Ok(scan),
        };
        let mut visible = vec![alias];
        visible.extend_from_slice(enclosing);
        let predicate = self.compile_predicate(filter, visible, alias)?;
        Ok(Box::new(FilterOperator::new(
            scan,
            predicate,
            filter.to_string(),
        )))
    }

    fn lower_join(&self, join: &JoinNode, enclosing: &[AliasId]) -> Result<LoweredJoin> {
        let outer_aliases = join.outer.segment_aliases();
        let inner_aliases = join.inner.segment_aliases();
        let inner_root = join.inner.root_alias();
        let inner_node = self.tree.node(inner_root)?;

        let scope = JoinScope {
            outer: self.names(&outer_aliases),
            inner: self.names(&inner_aliases),
            enclosing: self.names(enclosing),
        };

        if let Some(on) = &join.on {
            if let Some(unknown) = scope.unknown_alias(on) {
                return Err(Error::UnknownAlias(unknown));
            }
        }

        if join.populate {
            let all_outer = join.outer.aliases();
            match inner_node.parent {
                Some(parent) if all_outer.contains(&parent) => {}
                _ => {
                    return Err(Error::invalid_plan(format!(
                        "populate join: alias '{}' is not a child of the outer side",
                        inner_node.alias
                    )))
                }
            }
        }

        let outer = self.build_plan(&join.outer, enclosing)?;

        let mut analysis = join.on.as_ref().map(analyze).unwrap_or_default();

        // Aliases the inner side may read: its own, the outer side's and
        // whatever encloses this join
        let mut inner_enclosing = outer_aliases.clone();
        inner_enclosing.extend_from_slice(enclosing);

        let merger = if join.populate {
            RowMerger::populate(inner_root).with_label(inner_node.alias.clone())
        } else {
            let shape = inner_aliases
                .iter()
                .map(|id| Ok((*id, self.tree.node(*id)?.columns.len())))
                .collect::<Result<Vec<_>>>()?;
            RowMerger::flatten(shape)
        };

        let inner = match &join.inner {
            LogicalPlan::Scan(scan) => {
                let pushed = analysis.extract_pushdown_predicate(&inner_node.alias, true);
                let local = and_all(scan.filter.iter().cloned().chain(pushed).collect());
                let split = local
                    .as_ref()
                    .map(|f| split_pushdown(f, &inner_node.alias))
                    .unwrap_or_default();
                let correlated = split.residual.is_some();
                if let Some(pushdown) = &split.pushdown {
                    tracing::debug!(alias = %inner_node.alias, filter = %pushdown, "pushdown filter");
                }
                InnerSide {
                    correlated,
                    local,
                    pushdown: split.pushdown,
                }
            }
            LogicalPlan::Join(_) => InnerSide {
                correlated: self.references_outside(&join.inner),
                local: None,
                pushdown: None,
            },
        };

        let join_predicate = analysis.get_predicate();
        let keys = self.join_keys(&analysis, &scope);

        let mut pred_visible = outer_aliases.clone();
        pred_visible.extend_from_slice(&inner_aliases);
        pred_visible.extend_from_slice(enclosing);

        // 1. BatchHashJoin
        if !inner.correlated && self.config.enable_batch_hash_join {
            if let LogicalPlan::Scan(_) = &join.inner {
                if let Some(seek) =
                    self.find_seek_index(inner_node, &analysis, &scope, inner.pushdown.as_ref())?
                {
                    tracing::debug!(
                        strategy = %JoinStrategy::BatchHashJoin,
                        alias = %inner_node.alias,
                        index = %seek.index,
                        join_type = %join.join_type,
                        "join strategy selected"
                    );
                    let seek_visible = inner_enclosing.clone();
                    let seek_exprs = seek
                        .seek_exprs
                        .iter()
                        .map(|e| compile(e, &BindScope::new(&self.tree, seek_visible.clone())))
                        .collect::<Result<Vec<_>>>()?;
                    let inner_exprs = seek
                        .index
                        .columns
                        .iter()
                        .map(|c| {
                            inner_node
                                .column_index(c)
                                .map(|index| CompiledExpr::Column {
                                    alias: inner_root,
                                    index,
                                })
                                .ok_or_else(|| Error::unknown_column(&inner_node.alias, c))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    let inner_filter = match &inner.pushdown {
                        Some(f) => Some(self.compile_predicate(f, vec![inner_root], inner_root)?),
                        None => None,
                    };
                    let predicate =
                        self.compile_optional(join_predicate.as_ref(), pred_visible, inner_root)?;

                    let op = BatchHashJoinOperator::new(
                        outer,
                        self.catalog.clone(),
                        inner_node.clone(),
                        seek.index,
                        join.join_type,
                        merger,
                        Arc::new(KeyExtractor::new(seek_exprs)),
                        Arc::new(KeyExtractor::new(inner_exprs)),
                        predicate,
                    )?
                    .with_inner_filter(inner_filter)
                    .with_batch_size(self.config.effective_batch_size());
                    return Ok(LoweredJoin {
                        op: Box::new(op),
                        strategy: JoinStrategy::BatchHashJoin,
                    });
                }
            }
        }

        let inner_op = match &join.inner {
            LogicalPlan::Scan(scan) => {
                let visible = if inner.correlated {
                    inner_enclosing.clone()
                } else {
                    enclosing.to_vec()
                };
                self.build_scan(scan.alias, inner.local.as_ref(), &visible)?
            }
            LogicalPlan::Join(_) => self.build_plan(&join.inner, &inner_enclosing)?,
        };

        // 2. HashMatch
        if !inner.correlated && self.config.enable_hash_match && !keys.is_empty() {
            tracing::debug!(
                strategy = %JoinStrategy::HashMatch,
                alias = %inner_node.alias,
                keys = keys.len(),
                join_type = %join.join_type,
                "join strategy selected"
            );
            let outer_keys = keys
                .iter()
                .map(|(o, _)| compile(o, &BindScope::new(&self.tree, inner_enclosing.clone())))
                .collect::<Result<Vec<_>>>()?;
            let mut inner_visible = inner_aliases.clone();
            inner_visible.extend_from_slice(enclosing);
            let inner_keys = keys
                .iter()
                .map(|(_, i)| {
                    let scope =
                        BindScope::new(&self.tree, inner_visible.clone()).with_default_alias(inner_root);
                    compile(i, &scope)
                })
                .collect::<Result<Vec<_>>>()?;
            let predicate =
                self.compile_optional(join_predicate.as_ref(), pred_visible, inner_root)?;
            let display = keys
                .iter()
                .map(|(o, i)| format!("{} = {}", o, i))
                .collect::<Vec<_>>()
                .join(", ");

            let op = HashMatchOperator::new(
                outer,
                inner_op,
                join.join_type,
                merger,
                Arc::new(KeyExtractor::new(outer_keys)),
                Arc::new(KeyExtractor::new(inner_keys)),
                predicate,
            )
            .with_display(display);
            return Ok(LoweredJoin {
                op: Box::new(op),
                strategy: JoinStrategy::HashMatch,
            });
        }

        // 3. NestedLoopJoin
        tracing::debug!(
            strategy = %JoinStrategy::NestedLoop,
            alias = %inner_node.alias,
            correlated = inner.correlated,
            join_type = %join.join_type,
            "join strategy selected"
        );
        let predicate: Option<Arc<dyn ExpressionPredicate>> = match &join_predicate {
            Some(p) => Some(self.compile_predicate(p, pred_visible, inner_root)?),
            None => None,
        };
        let inner_op: Box<dyn Operator> = if !inner.correlated && self.config.cache_uncorrelated_inner
        {
            Box::new(CachingOperator::new(inner_op))
        } else {
            inner_op
        };
        let mut op = NestedLoopJoinOperator::new(outer, inner_op, join.join_type, merger, predicate)
            .with_correlated(inner.correlated);
        if let Some(p) = &join_predicate {
            op = op.with_display(p.to_string());
        }
        Ok(LoweredJoin {
            op: Box::new(op),
            strategy: JoinStrategy::NestedLoop,
        })
    }

    /// Equality conjuncts with one side reading only the outer side and the
    /// other reading only the inner side, in discovery order
    fn join_keys(&self, analysis: &AnalyzeResult, scope: &JoinScope) -> Vec<KeyPair> {
        let mut keys = Vec::new();
        for item in analysis.remaining() {
            let right = match &item.right_expr {
                Some(right) => right,
                None => continue,
            };
            let left = &item.left_expr;
            match (scope.side_of(left), scope.side_of(right)) {
                (Side::Outer, Side::Inner) => keys.push((left.clone(), right.clone())),
                (Side::Inner, Side::Outer) => keys.push((right.clone(), left.clone())),
                _ => {}
            }
        }
        keys
    }

    /// Full-row index of the inner alias whose columns all have a seek value:
    /// an outer-side join key or a pushed-down constant. Prefers the index
    /// with the most columns; at least one column must be a join key.
    fn find_seek_index(
        &self,
        inner: &AliasNode,
        analysis: &AnalyzeResult,
        scope: &JoinScope,
        pushdown: Option<&Expression>,
    ) -> Result<Option<SeekPlan>> {
        // (column, seek expression, is join key)
        let mut available: Vec<(String, Expression, bool)> = Vec::new();
        let mut add = |column: &str, expr: &Expression, is_key: bool| {
            if !available.iter().any(|(c, _, _)| c.eq_ignore_ascii_case(column)) {
                available.push((column.to_string(), expr.clone(), is_key));
            }
        };

        for item in analysis.get_equi_items(&inner.alias) {
            if let Some(key) = item.equi_key(&inner.alias) {
                if scope.side_of(key.other_expr) == Side::Outer {
                    add(key.column, key.other_expr, true);
                }
            }
        }
        if let Some(pushdown) = pushdown {
            for item in analyze(pushdown).items() {
                let right = match &item.right_expr {
                    Some(right) => right,
                    None => continue,
                };
                for (a, b) in [(&item.left_expr, right), (right, &item.left_expr)] {
                    if let Some(column) = local_column(a, &inner.alias) {
                        if b.is_constant() {
                            add(column, b, false);
                        }
                    }
                }
            }
        }
        if !available.iter().any(|(_, _, is_key)| *is_key) {
            return Ok(None);
        }

        let columns: Vec<&str> = available.iter().map(|(c, _, _)| c.as_str()).collect();
        let mut best: Option<Index> = None;
        for index in self.catalog.indices(&inner.table)? {
            if !index.is_full_row() || index.columns.is_empty() || !index.is_covered_by(&columns) {
                continue;
            }
            let uses_key = index.columns.iter().any(|c| {
                available
                    .iter()
                    .any(|(a, _, is_key)| *is_key && a.eq_ignore_ascii_case(c))
            });
            if !uses_key {
                continue;
            }
            match &best {
                Some(b) if b.columns.len() >= index.columns.len() => {}
                _ => best = Some(index),
            }
        }

        Ok(best.map(|index| {
            let seek_exprs = index
                .columns
                .iter()
                .filter_map(|c| {
                    available
                        .iter()
                        .find(|(a, _, _)| a.eq_ignore_ascii_case(c))
                        .map(|(_, e, _)| e.clone())
                })
                .collect();
            SeekPlan { index, seek_exprs }
        }))
    }

    /// Check if any predicate inside `plan` reads an alias `plan` does not scan
    fn references_outside(&self, plan: &LogicalPlan) -> bool {
        let own = self.names(&plan.aliases());
        let mut exprs: Vec<&Expression> = Vec::new();
        collect_predicates(plan, &mut exprs);
        exprs.iter().any(|e| {
            e.alias_refs()
                .qualified
                .iter()
                .any(|a| !JoinScope::contains(&own, a))
        })
    }

    fn names(&self, ids: &[AliasId]) -> Vec<String> {
        ids.iter()
            .map(|id| self.tree.name(*id).to_ascii_lowercase())
            .collect()
    }

    fn compile_predicate(
        &self,
        expr: &Expression,
        visible: Vec<AliasId>,
        default_alias: AliasId,
    ) -> Result<Arc<dyn ExpressionPredicate>> {
        let scope = BindScope::new(&self.tree, visible).with_default_alias(default_alias);
        Ok(Arc::new(CompiledPredicate::new(compile(expr, &scope)?)))
    }

    /// A missing predicate always matches
    fn compile_optional(
        &self,
        expr: Option<&Expression>,
        visible: Vec<AliasId>,
        default_alias: AliasId,
    ) -> Result<Arc<dyn ExpressionPredicate>> {
        match expr {
            Some(expr) => self.compile_predicate(expr, visible, default_alias),
            None => Ok(Arc::new(CompiledPredicate::new(CompiledExpr::Literal(
                Value::boolean(true),
            )))),
        }
    }
}

struct LoweredJoin {
    op: Box<dyn Operator>,
    strategy: JoinStrategy,
}

struct InnerSide {
    correlated: bool,
    // Scan filter plus conjuncts pushed down from ON
    local: Option<Expression>,
    // Part of `local` reading only the inner alias
    pushdown: Option<Expression>,
}

struct SeekPlan {
    index: Index,
    // One per index column, in index column order
    seek_exprs: Vec<Expression>,
}

/// Column name when `expr` is a bare column of `alias` (or unqualified)
fn local_column<'e>(expr: &'e Expression, alias: &str) -> Option<&'e str> {
    let column = expr.as_column()?;
    match &column.alias {
        Some(a) if !a.eq_ignore_ascii_case(alias) => None,
        _ => Some(column.column.as_str()),
    }
}

fn collect_predicates<'p>(plan: &'p LogicalPlan, out: &mut Vec<&'p Expression>) {
    match plan {
        LogicalPlan::Scan(scan) => out.extend(scan.filter.iter()),
        LogicalPlan::Join(join) => {
            out.extend(join.on.iter());
            collect_predicates(&join.outer, out);
            collect_predicates(&join.inner, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompareOp, JoinType};
    use crate::executor::context::ExecutionContext;
    use crate::executor::operator::collect_rows;
    use crate::plan::{col, compare, eq, lit};
    use crate::storage::MemoryCatalog;

    struct Fixture {
        catalog: Arc<MemoryCatalog>,
        tree: Arc<AliasTree>,
        s: AliasId,
        a: AliasId,
    }

    fn make_fixture(index: bool) -> Fixture {
        let mut catalog = MemoryCatalog::new();
        catalog.create_table("stock", ["id"]).unwrap();
        catalog.create_table("articles", ["art_id", "club_id"]).unwrap();
        catalog
            .insert_rows("stock", vec![vec![Value::integer(1)], vec![Value::integer(2)]])
            .unwrap();
        catalog
            .insert_rows(
                "articles",
                vec![
                    vec![Value::integer(1), Value::integer(10)],
                    vec![Value::integer(1), Value::integer(20)],
                    vec![Value::integer(3), Value::integer(10)],
                ],
            )
            .unwrap();
        if index {
            catalog.create_index("articles", &["art_id"]).unwrap();
        }

        let mut tree = AliasTree::new();
        let s = tree.add_root("stock", "s", ["id"]).unwrap();
        let a = tree.add_child(s, "articles", "a", ["art_id", "club_id"]).unwrap();
        Fixture {
            catalog: Arc::new(catalog),
            tree: Arc::new(tree),
            s,
            a,
        }
    }

    fn builder(f: &Fixture, config: JoinConfig) -> OperatorBuilder {
        OperatorBuilder::new(f.catalog.clone(), f.tree.clone()).with_config(config)
    }

    fn on_art_id() -> Option<Expression> {
        Some(eq(col("a", "art_id"), col("s", "id")))
    }

    #[test]
    fn test_strategy_priority() {
        let f = make_fixture(true);
        let plan = LogicalPlan::join(
            LogicalPlan::scan(f.s),
            LogicalPlan::scan(f.a),
            JoinType::Inner,
            on_art_id(),
        );

        let strategy = |config| builder(&f, config).choose_strategy(&plan).unwrap();
        assert_eq!(strategy(JoinConfig::default()), Some(JoinStrategy::BatchHashJoin));
        assert_eq!(strategy(JoinConfig::without_index_joins()), Some(JoinStrategy::HashMatch));
        assert_eq!(strategy(JoinConfig::nested_loop_only()), Some(JoinStrategy::NestedLoop));

        let no_index = make_fixture(false);
        let b = builder(&no_index, JoinConfig::default());
        assert_eq!(b.choose_strategy(&plan).unwrap(), Some(JoinStrategy::HashMatch));
        assert_eq!(b.choose_strategy(&LogicalPlan::scan(f.s)).unwrap(), None);
    }

    #[test]
    fn test_non_equi_join_uses_nested_loop() {
        let f = make_fixture(true);
        let plan = LogicalPlan::join(
            LogicalPlan::scan(f.s),
            LogicalPlan::scan(f.a),
            JoinType::Inner,
            Some(compare(CompareOp::Gt, col("a", "art_id"), col("s", "id"))),
        );
        let b = builder(&f, JoinConfig::default());
        assert_eq!(b.choose_strategy(&plan).unwrap(), Some(JoinStrategy::NestedLoop));
        let rows = collect_rows(b.build(&plan).unwrap().as_ref(), &ExecutionContext::new()).unwrap();
        // 3 > 1, 3 > 2
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_constant_pushdown_reaches_inner() {
        let f = make_fixture(true);
        let on = and_all(vec![
            eq(col("a", "art_id"), col("s", "id")),
            eq(col("a", "club_id"), lit(20)),
        ]);
        let plan = LogicalPlan::join(
            LogicalPlan::scan(f.s),
            LogicalPlan::scan(f.a),
            JoinType::Left,
            on,
        );
        for config in [
            JoinConfig::default(),
            JoinConfig::without_index_joins(),
            JoinConfig::nested_loop_only(),
        ] {
            let op = builder(&f, config).build(&plan).unwrap();
            let rows = collect_rows(op.as_ref(), &ExecutionContext::new()).unwrap();
            // s=1 matches (1, 20) only, s=2 null-merged
            assert_eq!(rows.len(), 2);
        }
    }

    #[test]
    fn test_unknown_alias_in_on() {
        let f = make_fixture(true);
        let plan = LogicalPlan::join(
            LogicalPlan::scan(f.s),
            LogicalPlan::scan(f.a),
            JoinType::Inner,
            Some(eq(col("a", "art_id"), col("x", "id"))),
        );
        let err = builder(&f, JoinConfig::default()).build(&plan).err().unwrap();
        assert!(matches!(err, Error::UnknownAlias(ref a) if a == "x"));
        assert!(err.is_build_error());
    }

    #[test]
    fn test_alias_scanned_twice() {
        let f = make_fixture(true);
        let plan = LogicalPlan::join(
            LogicalPlan::scan(f.s),
            LogicalPlan::scan(f.s),
            JoinType::Inner,
            None,
        );
        assert!(builder(&f, JoinConfig::default()).build(&plan).is_err());
    }

    #[test]
    fn test_populate_requires_child_alias() {
        let f = make_fixture(true);
        // s is not a child of a
        let plan = LogicalPlan::populate(
            LogicalPlan::scan(f.a),
            LogicalPlan::scan(f.s),
            JoinType::Inner,
            Some(eq(col("a", "art_id"), col("s", "id"))),
        );
        let err = builder(&f, JoinConfig::default()).build(&plan).err().unwrap();
        assert!(matches!(err, Error::InvalidPlan(_)));
    }

    #[test]
    fn test_uncorrelated_nested_loop_is_cached() {
        let f = make_fixture(true);
        let plan = LogicalPlan::join(
            LogicalPlan::scan(f.s),
            LogicalPlan::scan(f.a),
            JoinType::Inner,
            None,
        );
        let op = builder(&f, JoinConfig::default()).build(&plan).unwrap();
        assert_eq!(op.name(), "NestedLoopJoin");
        assert_eq!(op.children()[1].name(), "Cache");

        f.catalog.reset_stats();
        let rows = collect_rows(op.as_ref(), &ExecutionContext::new()).unwrap();
        assert_eq!(rows.len(), 6);
        // outer scan + one inner scan
        assert_eq!(f.catalog.stats().scans, 2);
    }

    #[test]
    fn test_correlated_scan_filter() {
        let f = make_fixture(true);
        // Inner scan filter reads the outer alias
        let plan = LogicalPlan::join(
            LogicalPlan::scan(f.s),
            LogicalPlan::scan_filtered(f.a, eq(col("a", "art_id"), col("s", "id"))),
            JoinType::Inner,
            None,
        );
        let b = builder(&f, JoinConfig::default());
        assert_eq!(b.choose_strategy(&plan).unwrap(), Some(JoinStrategy::NestedLoop));
        let op = b.build(&plan).unwrap();
        assert!(op.describe().contains("correlated"));
        let rows = collect_rows(op.as_ref(), &ExecutionContext::new()).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
