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

//! Predicate Analyzer
//!
//! Decomposes a conjunctive predicate into [`AnalyzeItem`]s:
//!
//! - an equality conjunct keeps both sides; a side that is a bare qualified
//!   column `alias.column` records the alias and column, any other side is
//!   kept as an opaque key expression
//! - every other conjunct becomes a single-sided item, tagged with its alias
//!   when it references exactly one
//!
//! Items are kept in discovery order. Re-ANDing them reproduces the input, and
//! the remaining predicate after extractions is always rebuilt in that order
//! so plans stay reproducible.

use crate::core::CompareOp;
use crate::plan::{and_all, AliasRefs, Expression};

/// One decomposed conjunct
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeItem {
    pub left_alias: Option<String>,
    pub left_column: Option<String>,
    pub left_expr: Expression,
    pub right_alias: Option<String>,
    pub right_column: Option<String>,
    pub right_expr: Option<Expression>,
    refs: AliasRefs,
}

/// Join key found in an equality item for a given alias
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquiKey<'a> {
    /// Column of the alias the item was looked up for
    pub column: &'a str,
    /// The side holding that column
    pub alias_expr: &'a Expression,
    /// The opposite side
    pub other_expr: &'a Expression,
}

impl AnalyzeItem {
    fn new(conjunct: &Expression) -> Self {
        let refs = conjunct.alias_refs();
        if let Expression::Comparison {
            op: CompareOp::Eq,
            left,
            right,
        } = conjunct
        {
            let (left_alias, left_column) = split_column(left);
            let (right_alias, right_column) = split_column(right);
            return Self {
                left_alias,
                left_column,
                left_expr: (**left).clone(),
                right_alias,
                right_column,
                right_expr: Some((**right).clone()),
                refs,
            };
        }

        let left_alias = match refs.qualified.as_slice() {
            [only] if !refs.has_unqualified => Some(only.clone()),
            _ => None,
        };
        Self {
            left_alias,
            left_column: None,
            left_expr: conjunct.clone(),
            right_alias: None,
            right_column: None,
            right_expr: None,
            refs,
        }
    }

    /// Check if the item is an equality with both sides recorded
    pub fn is_equality(&self) -> bool {
        self.right_expr.is_some()
    }

    /// Aliases referenced by the conjunct
    pub fn refs(&self) -> &AliasRefs {
        &self.refs
    }

    /// Rebuild the conjunct this item came from
    pub fn conjunct(&self) -> Expression {
        match &self.right_expr {
            Some(right) => Expression::Comparison {
                op: CompareOp::Eq,
                left: Box::new(self.left_expr.clone()),
                right: Box::new(right.clone()),
            },
            None => self.left_expr.clone(),
        }
    }

    /// Join key for `alias`: exactly one side is a bare `alias.column` and
    /// the other side does not mention `alias` at all
    pub fn equi_key(&self, alias: &str) -> Option<EquiKey<'_>> {
        let right_expr = self.right_expr.as_ref()?;
        let is = |a: &Option<String>| a.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(alias));
        let mentions = |e: &Expression| {
            e.alias_refs()
                .qualified
                .iter()
                .any(|a| a.eq_ignore_ascii_case(alias))
        };

        if is(&self.left_alias) && !is(&self.right_alias) && !mentions(right_expr) {
            Some(EquiKey {
                column: self.left_column.as_deref()?,
                alias_expr: &self.left_expr,
                other_expr: right_expr,
            })
        } else if is(&self.right_alias) && !is(&self.left_alias) && !mentions(&self.left_expr) {
            Some(EquiKey {
                column: self.right_column.as_deref()?,
                alias_expr: right_expr,
                other_expr: &self.left_expr,
            })
        } else {
            None
        }
    }

    /// Check if the item only concerns `alias` (and constants).
    ///
    /// Items without any qualified alias count only when `include_unqualified`
    /// is set; so do items mixing `alias` with unqualified columns.
    fn is_local_to(&self, alias: &str, include_unqualified: bool) -> bool {
        if self.refs.qualified.is_empty() {
            return include_unqualified;
        }
        self.refs.only(alias) && (include_unqualified || !self.refs.has_unqualified)
    }
}

fn split_column(expr: &Expression) -> (Option<String>, Option<String>) {
    match expr.as_column() {
        Some(c) if c.alias.is_some() => (c.alias.clone(), Some(c.column.clone())),
        _ => (None, None),
    }
}

/// Items of one predicate plus extraction state
#[derive(Debug, Clone, Default)]
pub struct AnalyzeResult {
    items: Vec<AnalyzeItem>,
    extracted: Vec<bool>,
}

impl AnalyzeResult {
    /// All items in discovery order, extracted ones included
    pub fn items(&self) -> &[AnalyzeItem] {
        &self.items
    }

    /// Items not yet extracted
    pub fn remaining(&self) -> impl Iterator<Item = &AnalyzeItem> {
        self.items
            .iter()
            .zip(self.extracted.iter())
            .filter(|(_, extracted)| !**extracted)
            .map(|(item, _)| item)
    }

    /// AND of the items not extracted yet, `None` once everything is gone
    pub fn get_predicate(&self) -> Option<Expression> {
        and_all(self.remaining().map(AnalyzeItem::conjunct).collect())
    }

    /// Remaining equality items where `alias` appears on exactly one side
    pub fn get_equi_items(&self, alias: &str) -> Vec<&AnalyzeItem> {
        self.remaining()
            .filter(|item| item.equi_key(alias).is_some())
            .collect()
    }

    /// Remove and return the AND of every remaining item that concerns only
    /// `alias`. A second call for the same alias returns `None`.
    pub fn extract_pushdown_predicate(
        &mut self,
        alias: &str,
        include_unqualified: bool,
    ) -> Option<Expression> {
        let mut taken = Vec::new();
        for (item, extracted) in self.items.iter().zip(self.extracted.iter_mut()) {
            if !*extracted && item.is_local_to(alias, include_unqualified) {
                *extracted = true;
                taken.push(item.conjunct());
            }
        }
        and_all(taken)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Decompose `predicate` into analyze items
pub fn analyze(predicate: &Expression) -> AnalyzeResult {
    let items: Vec<AnalyzeItem> = predicate.conjuncts().into_iter().map(AnalyzeItem::new).collect();
    let extracted = vec![false; items.len()];
    AnalyzeResult { items, extracted }
}
