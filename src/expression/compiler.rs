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

// Name binding: Expression -> CompiledExpr

use crate::core::{AliasId, Error, Result};
use crate::plan::{AliasTree, ColumnRef, Expression};

use super::compiled::CompiledExpr;

/// Aliases a compiled expression may reference
#[derive(Debug, Clone)]
pub struct BindScope<'a> {
    tree: &'a AliasTree,
    visible: Vec<AliasId>,
    default_alias: Option<AliasId>,
}

impl<'a> BindScope<'a> {
    pub fn new(tree: &'a AliasTree, visible: Vec<AliasId>) -> Self {
        Self {
            tree,
            visible,
            default_alias: None,
        }
    }

    /// Alias that unqualified columns bind to
    pub fn with_default_alias(mut self, alias: AliasId) -> Self {
        self.default_alias = Some(alias);
        self
    }

    pub fn visible(&self) -> &[AliasId] {
        &self.visible
    }

    /// Find a visible alias by name
    pub fn lookup_alias(&self, name: &str) -> Result<AliasId> {
        self.visible
            .iter()
            .copied()
            .find(|id| {
                self.tree
                    .get(*id)
                    .is_some_and(|n| n.alias.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| Error::UnknownAlias(name.to_string()))
    }

    /// Resolve a column reference to (alias ordinal, column index)
    pub fn resolve(&self, column: &ColumnRef) -> Result<(AliasId, usize)> {
        let alias = match &column.alias {
            Some(name) => self.lookup_alias(name)?,
            None => self.default_alias.ok_or_else(|| {
                Error::invalid_plan(format!(
                    "unqualified column '{}' has no alias context",
                    column.column
                ))
            })?,
        };
        let node = self.tree.node(alias)?;
        let index = node
            .column_index(&column.column)
            .ok_or_else(|| Error::unknown_column(&node.alias, &column.column))?;
        Ok((alias, index))
    }
}

/// Bind every column of `expr` against `scope`
pub fn compile(expr: &Expression, scope: &BindScope<'_>) -> Result<CompiledExpr> {
    Ok(match expr {
        Expression::Column(c) => {
            let (alias, index) = scope.resolve(c)?;
            CompiledExpr::Column { alias, index }
        }
        Expression::Literal(v) => CompiledExpr::Literal(v.clone()),
        Expression::Comparison { op, left, right } => CompiledExpr::Compare {
            op: *op,
            left: Box::new(compile(left, scope)?),
            right: Box::new(compile(right, scope)?),
        },
        Expression::And(items) => CompiledExpr::And(compile_all(items, scope)?),
        Expression::Or(items) => CompiledExpr::Or(compile_all(items, scope)?),
        Expression::Not(inner) => CompiledExpr::Not(Box::new(compile(inner, scope)?)),
        Expression::IsNull { expr, negated } => CompiledExpr::IsNull {
            expr: Box::new(compile(expr, scope)?),
            negated: *negated,
        },
        Expression::Arithmetic { op, left, right } => CompiledExpr::Arithmetic {
            op: *op,
            left: Box::new(compile(left, scope)?),
            right: Box::new(compile(right, scope)?),
        },
    })
}

fn compile_all(items: &[Expression], scope: &BindScope<'_>) -> Result<Vec<CompiledExpr>> {
    items.iter().map(|e| compile(e, scope)).collect()
}
