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

// Randomized laws for the analyzer and the pushdown splitter

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::core::CompareOp;
use crate::plan::{col, compare, is_null, lit, not, unqualified, Expression};

const ALIASES: [&str; 3] = ["a", "s", "c"];
const COLUMNS: [&str; 2] = ["x", "y"];
const OPS: [CompareOp; 6] = [
    CompareOp::Eq,
    CompareOp::Eq,
    CompareOp::Ne,
    CompareOp::Gt,
    CompareOp::Lt,
    CompareOp::Gte,
];
const CASES: usize = 500;

fn random_operand(rng: &mut StdRng) -> Expression {
    match rng.gen_range(0..5) {
        0 | 1 => col(
            ALIASES[rng.gen_range(0..ALIASES.len())],
            COLUMNS[rng.gen_range(0..COLUMNS.len())],
        ),
        2 => unqualified(COLUMNS[rng.gen_range(0..COLUMNS.len())]),
        _ => lit(rng.gen_range(0..10i64)),
    }
}

fn random_comparison(rng: &mut StdRng) -> Expression {
    let op = OPS[rng.gen_range(0..OPS.len())];
    compare(op, random_operand(rng), random_operand(rng))
}

fn random_tree(rng: &mut StdRng, depth: usize) -> Expression {
    if depth == 0 {
        return random_comparison(rng);
    }
    match rng.gen_range(0..6) {
        0 => Expression::And(
            (0..rng.gen_range(2..4))
                .map(|_| random_tree(rng, depth - 1))
                .collect(),
        ),
        1 => Expression::Or(
            (0..rng.gen_range(2..4))
                .map(|_| random_tree(rng, depth - 1))
                .collect(),
        ),
        2 => not(random_tree(rng, depth - 1)),
        3 => is_null(random_operand(rng)),
        _ => random_comparison(rng),
    }
}

/// A top-level AND of 1..6 random subtrees
fn random_predicate(rng: &mut StdRng) -> Expression {
    let mut items: Vec<Expression> = (0..rng.gen_range(1..6))
        .map(|_| random_tree(rng, 2))
        .collect();
    if items.len() == 1 {
        items.pop().unwrap_or_else(|| lit(true))
    } else {
        Expression::And(items)
    }
}

/// Reads `alias` and nothing else: no other alias, no unqualified column
fn reads_only(expr: &Expression, alias: &str) -> bool {
    let refs = expr.alias_refs();
    !refs.has_unqualified && refs.qualified.len() == 1 && refs.qualified[0] == alias
}

fn owned(exprs: Vec<&Expression>) -> Vec<Expression> {
    exprs.into_iter().cloned().collect()
}

fn conjuncts_of(expr: Option<Expression>) -> Vec<Expression> {
    expr.map(Expression::into_conjuncts).unwrap_or_default()
}

#[test]
fn test_items_recombine_to_the_input() {
    let mut rng = StdRng::seed_from_u64(1460);
    for _ in 0..CASES {
        let p = random_predicate(&mut rng);
        let result = analyze(&p);

        assert_eq!(result.items().len(), p.conjuncts().len(), "{}", p);
        let rebuilt: Vec<Expression> = result.items().iter().map(|i| i.conjunct()).collect();
        assert_eq!(rebuilt, owned(p.conjuncts()), "{}", p);
        assert_eq!(conjuncts_of(result.get_predicate()), owned(p.conjuncts()), "{}", p);
    }
}

#[test]
fn test_extraction_is_idempotent_and_complete() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..CASES {
        let p = random_predicate(&mut rng);
        for alias in ALIASES {
            for include_unqualified in [false, true] {
                let mut result = analyze(&p);
                let pushed = conjuncts_of(result.extract_pushdown_predicate(alias, include_unqualified));

                // Second call finds nothing
                assert_eq!(
                    result.extract_pushdown_predicate(alias, include_unqualified),
                    None,
                    "{} / {}",
                    p,
                    alias
                );

                // Nothing reading only `alias` is left behind
                let remaining = conjuncts_of(result.get_predicate());
                for c in &remaining {
                    assert!(!reads_only(c, alias), "{} left {} for {}", p, c, alias);
                }

                // Pushed conjuncts never read another alias
                for c in &pushed {
                    assert!(c.alias_refs().only(alias), "{} pushed {} for {}", p, c, alias);
                }

                // Pushed and remaining partition the input, order preserved
                let original = owned(p.conjuncts());
                assert_eq!(pushed.len() + remaining.len(), original.len());
                let (mut pi, mut ri) = (0, 0);
                for c in &original {
                    if pi < pushed.len() && &pushed[pi] == c {
                        pi += 1;
                    } else {
                        assert_eq!(remaining.get(ri), Some(c), "{} / {}", p, alias);
                        ri += 1;
                    }
                }
            }
        }
    }
}

#[test]
fn test_split_partitions_by_alias() {
    let mut rng = StdRng::seed_from_u64(2025);
    for _ in 0..CASES {
        let p = random_predicate(&mut rng);
        for alias in ALIASES {
            let split = split_pushdown(&p, alias);
            let original = owned(p.conjuncts());

            let expected_pushdown: Vec<Expression> = original
                .iter()
                .filter(|c| c.alias_refs().only(alias))
                .cloned()
                .collect();
            let expected_residual: Vec<Expression> = original
                .iter()
                .filter(|c| !c.alias_refs().only(alias))
                .cloned()
                .collect();

            assert_eq!(conjuncts_of(split.pushdown), expected_pushdown, "{} / {}", p, alias);
            assert_eq!(conjuncts_of(split.residual), expected_residual, "{} / {}", p, alias);
        }
    }
}
