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

// Bound expressions and the extractor implementations built on them

use std::cmp::Ordering;

use crate::core::{AliasId, CompareOp, Error, Result, RowView, Value};
use crate::executor::context::ExecutionContext;
use crate::plan::ArithmeticOp;

use super::{ExpressionPredicate, ExpressionValuesExtractor, KeyValues};

/// Expression with every column bound to (alias ordinal, column index)
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledExpr {
    Column {
        alias: AliasId,
        index: usize,
    },
    Literal(Value),
    Compare {
        op: CompareOp,
        left: Box<CompiledExpr>,
        right: Box<CompiledExpr>,
    },
    And(Vec<CompiledExpr>),
    Or(Vec<CompiledExpr>),
    Not(Box<CompiledExpr>),
    IsNull {
        expr: Box<CompiledExpr>,
        negated: bool,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<CompiledExpr>,
        right: Box<CompiledExpr>,
    },
}

impl CompiledExpr {
    /// Evaluate against `row`, falling back to the context's outer rows for
    /// columns the row does not carry
    pub fn eval(&self, row: &dyn RowView, ctx: &ExecutionContext) -> Result<Value> {
        match self {
            CompiledExpr::Column { alias, index } => row
                .value(*alias, *index)
                .or_else(|| ctx.outer_value(*alias, *index))
                .cloned()
                .ok_or_else(|| {
                    Error::evaluation(format!("column {}[{}] is not bound", alias, index))
                }),
            CompiledExpr::Literal(v) => Ok(v.clone()),
            CompiledExpr::Compare { op, left, right } => {
                let l = left.eval(row, ctx)?;
                let r = right.eval(row, ctx)?;
                compare_values(*op, &l, &r)
            }
            CompiledExpr::And(items) => {
                let mut saw_null = false;
                for item in items {
                    match logical_operand(item.eval(row, ctx)?)? {
                        Some(false) => return Ok(Value::Boolean(false)),
                        Some(true) => {}
                        None => saw_null = true,
                    }
                }
                Ok(if saw_null {
                    Value::Null
                } else {
                    Value::Boolean(true)
                })
            }
            CompiledExpr::Or(items) => {
                let mut saw_null = false;
                for item in items {
                    match logical_operand(item.eval(row, ctx)?)? {
                        Some(true) => return Ok(Value::Boolean(true)),
                        Some(false) => {}
                        None => saw_null = true,
                    }
                }
                Ok(if saw_null {
                    Value::Null
                } else {
                    Value::Boolean(false)
                })
            }
            CompiledExpr::Not(inner) => Ok(match logical_operand(inner.eval(row, ctx)?)? {
                Some(b) => Value::Boolean(!b),
                None => Value::Null,
            }),
            CompiledExpr::IsNull { expr, negated } => {
                let v = expr.eval(row, ctx)?;
                Ok(Value::Boolean(v.is_null() != *negated))
            }
            CompiledExpr::Arithmetic { op, left, right } => {
                let l = left.eval(row, ctx)?;
                let r = right.eval(row, ctx)?;
                arithmetic(*op, &l, &r)
            }
        }
    }
}

fn compare_values(op: CompareOp, l: &Value, r: &Value) -> Result<Value> {
    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }
    let result = match op {
        // Equality agrees with Value's Hash impl, which hash joins rely on
        CompareOp::Eq => l == r,
        CompareOp::Ne => l != r,
        CompareOp::Gt => l.compare(r)? == Ordering::Greater,
        CompareOp::Gte => l.compare(r)? != Ordering::Less,
        CompareOp::Lt => l.compare(r)? == Ordering::Less,
        CompareOp::Lte => l.compare(r)? != Ordering::Greater,
    };
    Ok(Value::Boolean(result))
}

/// Operand of AND / OR / NOT: boolean, NULL (unknown), or an error
fn logical_operand(v: Value) -> Result<Option<bool>> {
    match v {
        Value::Boolean(b) => Ok(Some(b)),
        Value::Null => Ok(None),
        other => Err(non_boolean(&other)),
    }
}

fn non_boolean(v: &Value) -> Error {
    Error::NonBooleanPredicate {
        value: v.to_string(),
        data_type: v.data_type().to_string(),
    }
}

fn arithmetic(op: ArithmeticOp, l: &Value, r: &Value) -> Result<Value> {
    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => {
            let (a, b) = (*a, *b);
            let out = match op {
                ArithmeticOp::Add => a.checked_add(b),
                ArithmeticOp::Sub => a.checked_sub(b),
                ArithmeticOp::Mul => a.checked_mul(b),
                ArithmeticOp::Div => {
                    if b == 0 {
                        return Err(Error::DivisionByZero);
                    }
                    a.checked_div(b)
                }
            };
            out.map(Value::Integer)
                .ok_or_else(|| Error::evaluation(format!("integer overflow in {} {} {}", a, op, b)))
        }
        _ => match (l.as_float64(), r.as_float64()) {
            (Some(a), Some(b)) => {
                let out = match op {
                    ArithmeticOp::Add => a + b,
                    ArithmeticOp::Sub => a - b,
                    ArithmeticOp::Mul => a * b,
                    ArithmeticOp::Div => {
                        if b == 0.0 {
                            return Err(Error::DivisionByZero);
                        }
                        a / b
                    }
                };
                Ok(Value::Float(out))
            }
            _ => Err(Error::evaluation(format!(
                "cannot apply {} to {} and {}",
                op,
                l.data_type(),
                r.data_type()
            ))),
        },
    }
}

/// Predicate backed by a compiled expression
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    expr: CompiledExpr,
}

impl CompiledPredicate {
    pub fn new(expr: CompiledExpr) -> Self {
        Self { expr }
    }

    pub fn expr(&self) -> &CompiledExpr {
        &self.expr
    }
}

impl ExpressionPredicate for CompiledPredicate {
    fn eval(&self, row: &dyn RowView, ctx: &ExecutionContext) -> Result<bool> {
        match self.expr.eval(row, ctx)? {
            Value::Boolean(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(non_boolean(&other)),
        }
    }
}

/// Join-key extractor: one compiled expression per key column
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    exprs: Vec<CompiledExpr>,
}

impl KeyExtractor {
    pub fn new(exprs: Vec<CompiledExpr>) -> Self {
        Self { exprs }
    }

    pub fn exprs(&self) -> &[CompiledExpr] {
        &self.exprs
    }
}

impl ExpressionValuesExtractor for KeyExtractor {
    fn eval_values(&self, row: &dyn RowView, ctx: &ExecutionContext) -> Result<KeyValues> {
        self.exprs.iter().map(|e| e.eval(row, ctx)).collect()
    }

    fn arity(&self) -> usize {
        self.exprs.len()
    }
}
