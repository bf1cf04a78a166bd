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

//! EXPLAIN output for physical operator trees
//!
//! Renders one line per operator, children indented below their parent,
//! outer side first:
//!
//! ```text
//! BatchHashJoin (LEFT, populate a, index [art_id, club_id], batch 100)
//!   -> Scan stock AS s
//! ```

use super::operator::Operator;

/// Render `op` and its children as an indented plan
pub fn explain(op: &dyn Operator) -> String {
    let mut lines: Vec<String> = Vec::new();
    explain_node(op, 0, &mut lines);
    lines.join("\n")
}

fn explain_node(op: &dyn Operator, depth: usize, lines: &mut Vec<String>) {
    let prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}-> ", "  ".repeat(depth))
    };
    lines.push(format!("{}{}", prefix, op.describe()));
    for child in op.children() {
        explain_node(child, depth + 1, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AliasId, CompareOp, JoinType, Row, Value};
    use crate::executor::merge::RowMerger;
    use crate::executor::operator::MaterializedOperator;
    use crate::executor::operators::{CachingOperator, FilterOperator, NestedLoopJoinOperator};
    use crate::expression::{CompiledExpr, CompiledPredicate};
    use std::sync::Arc;

    #[test]
    fn test_explain_tree() {
        let outer = MaterializedOperator::new(vec![Row::new(AliasId(0), 0, vec![Value::integer(1)])]);
        let inner = FilterOperator::new(
            Box::new(MaterializedOperator::new(Vec::new())),
            Arc::new(CompiledPredicate::new(CompiledExpr::Compare {
                op: CompareOp::Gt,
                left: Box::new(CompiledExpr::Column {
                    alias: AliasId(1),
                    index: 0,
                }),
                right: Box::new(CompiledExpr::Literal(Value::integer(3))),
            })),
            "a.qty > 3",
        );
        let join = NestedLoopJoinOperator::new(
            Box::new(outer),
            Box::new(CachingOperator::new(Box::new(inner))),
            JoinType::Inner,
            RowMerger::flatten(vec![(AliasId(1), 1)]),
            None,
        );

        let expected = [
            "NestedLoopJoin (INNER)",
            "  -> Materialized (1 rows)",
            "  -> Cache",
            "    -> Filter (a.qty > 3)",
            "      -> Materialized (0 rows)",
        ]
        .join("\n");
        assert_eq!(explain(&join), expected);
    }
}
