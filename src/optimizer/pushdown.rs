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

//! Pushdown Predicate Splitter
//!
//! Partitions a predicate into the conjuncts that only read one alias (and
//! constants), which can run directly above that alias' scan, and the rest.
//! Unqualified columns resolve to the current alias and stay pushable.
//! An OR is pushed only when every branch is; it is never split.

use crate::plan::{and_all, Expression};

/// Result of splitting a predicate for one alias
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushdownSplit {
    pub pushdown: Option<Expression>,
    pub residual: Option<Expression>,
}

/// Split `predicate` into the part local to `alias` and the remainder,
/// preserving the relative order of conjuncts within each part
pub fn split_pushdown(predicate: &Expression, alias: &str) -> PushdownSplit {
    let mut pushdown = Vec::new();
    let mut residual = Vec::new();
    for conjunct in predicate.conjuncts() {
        if is_local(conjunct, alias) {
            pushdown.push(conjunct.clone());
        } else {
            residual.push(conjunct.clone());
        }
    }
    PushdownSplit {
        pushdown: and_all(pushdown),
        residual: and_all(residual),
    }
}

fn is_local(expr: &Expression, alias: &str) -> bool {
    match expr {
        Expression::Or(branches) => branches.iter().all(|b| is_local(b, alias)),
        Expression::And(items) => items.iter().all(|i| is_local(i, alias)),
        other => other.alias_refs().only(alias),
    }
}
