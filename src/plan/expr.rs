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

//! Expression tree consumed by join analysis
//!
//! Only the node kinds that influence join planning are distinguished:
//! column references, literals, comparisons, AND, OR. Everything else
//! (NOT, IS NULL, arithmetic) is opaque to the analyzer and only matters
//! to the evaluator.

use std::fmt;

use crate::core::{CompareOp, Value};

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

/// Column reference, optionally qualified by an alias name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub alias: Option<String>,
    pub column: String,
}

impl ColumnRef {
    /// Check if this reference is qualified with `alias`
    pub fn is_qualified_by(&self, alias: &str) -> bool {
        self.alias
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case(alias))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{}.{}", alias, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Column(ColumnRef),
    Literal(Value),
    Comparison {
        op: CompareOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
    IsNull {
        expr: Box<Expression>,
        negated: bool,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

/// Aliases referenced by an expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasRefs {
    /// Qualified alias names, first occurrence order, lowercased
    pub qualified: Vec<String>,
    /// Whether any column reference is unqualified
    pub has_unqualified: bool,
}

impl AliasRefs {
    /// True when no column is referenced at all
    pub fn is_empty(&self) -> bool {
        self.qualified.is_empty() && !self.has_unqualified
    }

    /// True when every column belongs to `alias`, treating unqualified
    /// columns as belonging to it
    pub fn only(&self, alias: &str) -> bool {
        self.qualified.iter().all(|a| a.eq_ignore_ascii_case(alias))
    }

    fn add(&mut self, alias: &str) {
        if !self.qualified.iter().any(|a| a.eq_ignore_ascii_case(alias)) {
            self.qualified.push(alias.to_ascii_lowercase());
        }
    }
}

// =========================================================================
// Constructors
// =========================================================================

/// Qualified column reference `alias.column`
pub fn col(alias: &str, column: &str) -> Expression {
    Expression::Column(ColumnRef {
        alias: Some(alias.to_string()),
        column: column.to_string(),
    })
}

/// Unqualified column reference
pub fn unqualified(column: &str) -> Expression {
    Expression::Column(ColumnRef {
        alias: None,
        column: column.to_string(),
    })
}

/// Literal value
pub fn lit(value: impl Into<Value>) -> Expression {
    Expression::Literal(value.into())
}

/// Comparison `left op right`
pub fn compare(op: CompareOp, left: Expression, right: Expression) -> Expression {
    Expression::Comparison {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Equality `left = right`
pub fn eq(left: Expression, right: Expression) -> Expression {
    compare(CompareOp::Eq, left, right)
}

/// Arithmetic `left op right`
pub fn arithmetic(op: ArithmeticOp, left: Expression, right: Expression) -> Expression {
    Expression::Arithmetic {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// `expr IS NULL`
pub fn is_null(expr: Expression) -> Expression {
    Expression::IsNull {
        expr: Box::new(expr),
        negated: false,
    }
}

/// `NOT expr`
pub fn not(expr: Expression) -> Expression {
    Expression::Not(Box::new(expr))
}

/// AND of all `exprs`; `None` when empty, the single member when only one
pub fn and_all(exprs: Vec<Expression>) -> Option<Expression> {
    let mut flat = Vec::with_capacity(exprs.len());
    for e in exprs {
        match e {
            Expression::And(items) => flat.extend(items),
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => None,
        1 => flat.pop(),
        _ => Some(Expression::And(flat)),
    }
}

/// OR of all `exprs`; `None` when empty
pub fn or_all(mut exprs: Vec<Expression>) -> Option<Expression> {
    match exprs.len() {
        0 => None,
        1 => exprs.pop(),
        _ => Some(Expression::Or(exprs)),
    }
}

impl Expression {
    /// Top-level conjuncts, with nested ANDs flattened
    pub fn conjuncts(&self) -> Vec<&Expression> {
        let mut out = Vec::new();
        collect_conjuncts(self, &mut out);
        out
    }

    /// Owned variant of [`Expression::conjuncts`]
    pub fn into_conjuncts(self) -> Vec<Expression> {
        match self {
            Expression::And(items) => items.into_iter().flat_map(Self::into_conjuncts).collect(),
            other => vec![other],
        }
    }

    /// The column reference, if this node is a bare column
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expression::Column(c) => Some(c),
            _ => None,
        }
    }

    /// Check if the expression references no column
    pub fn is_constant(&self) -> bool {
        self.alias_refs().is_empty()
    }

    /// Aliases referenced anywhere in the expression
    pub fn alias_refs(&self) -> AliasRefs {
        let mut refs = AliasRefs::default();
        self.walk_columns(&mut |c| match &c.alias {
            Some(a) => refs.add(a),
            None => refs.has_unqualified = true,
        });
        refs
    }

    /// Visit every column reference
    pub fn walk_columns(&self, f: &mut dyn FnMut(&ColumnRef)) {
        match self {
            Expression::Column(c) => f(c),
            Expression::Literal(_) => {}
            Expression::Comparison { left, right, .. }
            | Expression::Arithmetic { left, right, .. } => {
                left.walk_columns(f);
                right.walk_columns(f);
            }
            Expression::And(items) | Expression::Or(items) => {
                for item in items {
                    item.walk_columns(f);
                }
            }
            Expression::Not(inner) => inner.walk_columns(f),
            Expression::IsNull { expr, .. } => expr.walk_columns(f),
        }
    }
}

fn collect_conjuncts<'a>(expr: &'a Expression, out: &mut Vec<&'a Expression>) {
    match expr {
        Expression::And(items) => {
            for item in items {
                collect_conjuncts(item, out);
            }
        }
        other => out.push(other),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column(c) => write!(f, "{}", c),
            Expression::Literal(v) => write!(f, "{}", v),
            Expression::Comparison { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expression::Arithmetic { op, left, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
            Expression::And(items) => write_joined(f, items, " AND ", false),
            Expression::Or(items) => write_joined(f, items, " OR ", true),
            Expression::Not(inner) => write!(f, "NOT ({})", inner),
            Expression::IsNull { expr, negated } => {
                if *negated {
                    write!(f, "{} IS NOT NULL", expr)
                } else {
                    write!(f, "{} IS NULL", expr)
                }
            }
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    items: &[Expression],
    sep: &str,
    parens: bool,
) -> fmt::Result {
    if parens {
        write!(f, "(")?;
    }
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", item)?;
    }
    if parens {
        write!(f, ")")?;
    }
    Ok(())
}
