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

//! Logical join tree handed to the operator builder

use crate::core::{AliasId, JoinType};

use super::expr::Expression;

/// Scan of one alias, with the filter the resolver attached to it
#[derive(Debug, Clone, PartialEq)]
pub struct ScanNode {
    pub alias: AliasId,
    pub filter: Option<Expression>,
}

/// Join of two sub-plans
#[derive(Debug, Clone, PartialEq)]
pub struct JoinNode {
    pub outer: LogicalPlan,
    pub inner: LogicalPlan,
    pub join_type: JoinType,
    pub on: Option<Expression>,
    /// Nest inner rows under the outer row instead of flattening
    pub populate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    Scan(ScanNode),
    Join(Box<JoinNode>),
}

impl LogicalPlan {
    pub fn scan(alias: AliasId) -> Self {
        LogicalPlan::Scan(ScanNode {
            alias,
            filter: None,
        })
    }

    pub fn scan_filtered(alias: AliasId, filter: Expression) -> Self {
        LogicalPlan::Scan(ScanNode {
            alias,
            filter: Some(filter),
        })
    }

    /// Flattening join
    pub fn join(
        outer: LogicalPlan,
        inner: LogicalPlan,
        join_type: JoinType,
        on: Option<Expression>,
    ) -> Self {
        LogicalPlan::Join(Box::new(JoinNode {
            outer,
            inner,
            join_type,
            on,
            populate: false,
        }))
    }

    /// Populate join
    pub fn populate(
        outer: LogicalPlan,
        inner: LogicalPlan,
        join_type: JoinType,
        on: Option<Expression>,
    ) -> Self {
        LogicalPlan::Join(Box::new(JoinNode {
            outer,
            inner,
            join_type,
            on,
            populate: true,
        }))
    }

    /// Alias of the leftmost scan; it names every row this plan produces
    pub fn root_alias(&self) -> AliasId {
        match self {
            LogicalPlan::Scan(scan) => scan.alias,
            LogicalPlan::Join(join) => join.outer.root_alias(),
        }
    }

    /// Every alias scanned by this plan, outer side first
    pub fn aliases(&self) -> Vec<AliasId> {
        let mut out = Vec::new();
        self.collect_aliases(&mut out, false);
        out
    }

    /// Aliases whose values are flattened into the output rows, in row order.
    ///
    /// The inner side of a populate join lives in child collections and is
    /// therefore excluded.
    pub fn segment_aliases(&self) -> Vec<AliasId> {
        let mut out = Vec::new();
        self.collect_aliases(&mut out, true);
        out
    }

    fn collect_aliases(&self, out: &mut Vec<AliasId>, flattened_only: bool) {
        match self {
            LogicalPlan::Scan(scan) => out.push(scan.alias),
            LogicalPlan::Join(join) => {
                join.outer.collect_aliases(out, flattened_only);
                if !(flattened_only && join.populate) {
                    join.inner.collect_aliases(out, flattened_only);
                }
            }
        }
    }

    pub fn is_scan(&self) -> bool {
        matches!(self, LogicalPlan::Scan(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_collection() {
        let (s, a, c) = (AliasId(0), AliasId(1), AliasId(2));
        let plan = LogicalPlan::join(
            LogicalPlan::populate(
                LogicalPlan::scan(s),
                LogicalPlan::scan(a),
                JoinType::Inner,
                None,
            ),
            LogicalPlan::scan(c),
            JoinType::Left,
            None,
        );
        assert_eq!(plan.root_alias(), s);
        assert_eq!(plan.aliases(), vec![s, a, c]);
        assert_eq!(plan.segment_aliases(), vec![s, c]);
        assert!(!plan.is_scan());
    }
}
