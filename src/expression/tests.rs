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

// Tests for name binding and compiled expression evaluation

use super::*;
use crate::core::{AliasId, CompareOp, Error, JoinedRow, Row, Value};
use crate::plan::{
    and_all, arithmetic, col, compare, eq, is_null, lit, not, unqualified, AliasTree,
    ArithmeticOp, Expression,
};

fn tree() -> (AliasTree, AliasId, AliasId) {
    let mut tree = AliasTree::new();
    let s = tree.add_root("sales", "s", ["id", "qty"]).unwrap();
    let a = tree.add_child(s, "articles", "a", ["art_id", "name"]).unwrap();
    (tree, s, a)
}

fn sale(id: i64, qty: Value) -> Row {
    Row::new(AliasId(0), 0, vec![Value::integer(id), qty])
}

fn article(art_id: Value, name: &str) -> Row {
    Row::new(AliasId(1), 0, vec![art_id, Value::text(name)])
}

fn predicate(expr: &Expression, tree: &AliasTree, visible: Vec<AliasId>) -> CompiledPredicate {
    let scope = BindScope::new(tree, visible).with_default_alias(AliasId(1));
    CompiledPredicate::new(compile(expr, &scope).unwrap())
}

#[test]
fn test_bind_qualified_and_unqualified() {
    let (tree, s, a) = tree();
    let scope = BindScope::new(&tree, vec![s, a]).with_default_alias(a);

    let c = compile(&col("S", "qty"), &scope).unwrap();
    assert_eq!(c, CompiledExpr::Column { alias: s, index: 1 });

    let c = compile(&unqualified("name"), &scope).unwrap();
    assert_eq!(c, CompiledExpr::Column { alias: a, index: 1 });
}

#[test]
fn test_bind_errors() {
    let (tree, s, a) = tree();
    let scope = BindScope::new(&tree, vec![s, a]);

    assert_eq!(
        compile(&col("x", "id"), &scope).unwrap_err(),
        Error::UnknownAlias("x".to_string())
    );
    assert_eq!(
        compile(&col("a", "price"), &scope).unwrap_err(),
        Error::unknown_column("a", "price")
    );
    assert!(compile(&unqualified("id"), &scope)
        .unwrap_err()
        .is_build_error());

    // Aliases outside the scope are unknown even if the tree has them
    let narrow = BindScope::new(&tree, vec![s]);
    assert!(matches!(
        compile(&col("a", "art_id"), &narrow),
        Err(Error::UnknownAlias(_))
    ));
}

#[test]
fn test_join_predicate_on_joined_row() {
    let (tree, s, a) = tree();
    let ctx = ExecutionContext::new();
    let p = predicate(&eq(col("a", "art_id"), col("s", "id")), &tree, vec![s, a]);

    let outer = sale(1, Value::integer(5));
    assert!(p
        .eval(&JoinedRow::new(&outer, &article(Value::integer(1), "x")), &ctx)
        .unwrap());
    assert!(!p
        .eval(&JoinedRow::new(&outer, &article(Value::integer(2), "x")), &ctx)
        .unwrap());
    // NULL never matches
    assert!(!p
        .eval(&JoinedRow::new(&outer, &article(Value::Null, "x")), &ctx)
        .unwrap());
}

#[test]
fn test_three_valued_logic() {
    let (tree, s, a) = tree();
    let ctx = ExecutionContext::new();
    let row = sale(1, Value::Null);

    let gt = compare(CompareOp::Gt, col("s", "qty"), lit(3));
    let or = Expression::Or(vec![gt.clone(), eq(col("s", "id"), lit(1))]);
    assert!(predicate(&or, &tree, vec![s, a]).eval(&row, &ctx).unwrap());

    let and = and_all(vec![gt.clone(), eq(col("s", "id"), lit(1))]).unwrap();
    assert!(!predicate(&and, &tree, vec![s, a]).eval(&row, &ctx).unwrap());

    assert!(!predicate(&not(gt), &tree, vec![s, a]).eval(&row, &ctx).unwrap());
    assert!(predicate(&is_null(col("s", "qty")), &tree, vec![s, a])
        .eval(&row, &ctx)
        .unwrap());
}

#[test]
fn test_non_boolean_predicate_is_an_error() {
    let (tree, s, a) = tree();
    let ctx = ExecutionContext::new();
    let p = predicate(&col("s", "qty"), &tree, vec![s, a]);

    let err = p.eval(&sale(1, Value::integer(7)), &ctx).unwrap_err();
    assert_eq!(
        err,
        Error::NonBooleanPredicate {
            value: "7".to_string(),
            data_type: "INTEGER".to_string(),
        }
    );
    assert!(err.is_evaluation_error());
}

#[test]
fn test_incomparable_ordering_is_an_error() {
    let (tree, s, a) = tree();
    let ctx = ExecutionContext::new();
    let p = predicate(
        &compare(CompareOp::Lt, col("s", "qty"), lit("abc")),
        &tree,
        vec![s, a],
    );
    assert_eq!(
        p.eval(&sale(1, Value::integer(7)), &ctx).unwrap_err(),
        Error::IncomparableTypes
    );
}

#[test]
fn test_arithmetic() {
    let (tree, s, a) = tree();
    let ctx = ExecutionContext::new();
    let scope = BindScope::new(&tree, vec![s, a]);
    let row = sale(10, Value::integer(4));

    let sum = compile(&arithmetic(ArithmeticOp::Add, col("s", "id"), col("s", "qty")), &scope).unwrap();
    assert_eq!(sum.eval(&row, &ctx).unwrap(), Value::integer(14));

    let mixed = compile(&arithmetic(ArithmeticOp::Mul, col("s", "qty"), lit(0.5)), &scope).unwrap();
    assert_eq!(mixed.eval(&row, &ctx).unwrap(), Value::float(2.0));

    let div = compile(&arithmetic(ArithmeticOp::Div, col("s", "id"), lit(0)), &scope).unwrap();
    assert_eq!(div.eval(&row, &ctx).unwrap_err(), Error::DivisionByZero);
}

#[test]
fn test_outer_row_fallback() {
    let (tree, s, a) = tree();
    let p = predicate(&eq(col("a", "art_id"), col("s", "id")), &tree, vec![s, a]);

    // Inner row alone, outer row supplied by the context
    let ctx = ExecutionContext::new().with_outer_row(sale(3, Value::Null));
    assert!(p.eval(&article(Value::integer(3), "x"), &ctx).unwrap());

    // Without the outer row the column is unbound
    let err = p
        .eval(&article(Value::integer(3), "x"), &ExecutionContext::new())
        .unwrap_err();
    assert!(matches!(err, Error::Evaluation(_)));
}

#[test]
fn test_key_extractor_and_hash() {
    let (tree, s, a) = tree();
    let ctx = ExecutionContext::new();
    let scope = BindScope::new(&tree, vec![s, a]);
    let keys = KeyExtractor::new(vec![
        compile(&col("s", "id"), &scope).unwrap(),
        compile(&lit(1460), &scope).unwrap(),
    ]);
    assert_eq!(keys.arity(), 2);

    let row = sale(1, Value::Null);
    let values = keys.eval_values(&row, &ctx).unwrap();
    assert_eq!(values.as_slice(), &[Value::integer(1), Value::integer(1460)]);
    assert!(keys.eval_hash(&row, &ctx).unwrap().is_some());

    let nullable = KeyExtractor::new(vec![compile(&col("s", "qty"), &scope).unwrap()]);
    assert_eq!(nullable.eval_hash(&row, &ctx).unwrap(), None);
}
