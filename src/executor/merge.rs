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

//! Row merging for join output.
//!
//! A flattening join appends the inner row's segments to the outer row. A
//! populate join instead files the inner rows as a child collection of the
//! outer row. In both cases the merged row keeps the outer row's alias and
//! position.

use std::collections::VecDeque;

use crate::core::{AliasId, JoinType, Row};

/// How matched inner rows are combined with their outer row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeMode {
    /// Inner segments are appended. `inner_shape` lists the (alias, width)
    /// of every segment an inner row carries, used for null padding.
    Flatten { inner_shape: Vec<(AliasId, usize)> },
    /// Inner rows are nested under `alias`
    Populate { alias: AliasId },
}

/// Combines outer and inner rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMerger {
    mode: MergeMode,
    // Alias name shown by EXPLAIN for populate joins
    label: Option<String>,
}

impl RowMerger {
    pub fn flatten(inner_shape: Vec<(AliasId, usize)>) -> Self {
        Self {
            mode: MergeMode::Flatten { inner_shape },
            label: None,
        }
    }

    pub fn populate(alias: AliasId) -> Self {
        Self {
            mode: MergeMode::Populate { alias },
            label: None,
        }
    }

    /// Name the populated alias for plan output
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// "populate <alias>" for populate joins, `None` when flattening
    pub fn describe(&self) -> Option<String> {
        match (&self.mode, &self.label) {
            (MergeMode::Populate { .. }, Some(label)) => Some(format!("populate {}", label)),
            (MergeMode::Populate { alias }, None) => Some(format!("populate {}", alias)),
            (MergeMode::Flatten { .. }, _) => None,
        }
    }

    pub fn mode(&self) -> &MergeMode {
        &self.mode
    }

    pub fn is_populate(&self) -> bool {
        matches!(self.mode, MergeMode::Populate { .. })
    }

    /// Merge one outer row with one inner row, or with "no match".
    ///
    /// Flatten pads a missing inner side with NULLs. Populate with `None`
    /// yields the outer row with an empty child collection.
    pub fn merge(&self, outer: &Row, inner: Option<&Row>) -> Row {
        let mut merged = outer.clone();
        match (&self.mode, inner) {
            (MergeMode::Flatten { .. }, Some(inner)) => merged.append_row(inner),
            (MergeMode::Flatten { inner_shape }, None) => {
                for (alias, len) in inner_shape {
                    merged.append_nulls(*alias, *len);
                }
            }
            (MergeMode::Populate { alias }, Some(inner)) => {
                merged.push_children(*alias, vec![inner.clone()]);
            }
            (MergeMode::Populate { alias }, None) => merged.push_children(*alias, Vec::new()),
        }
        merged
    }

    /// Populate `outer` with every matched inner row at once.
    ///
    /// In flatten mode only the first match is merged; callers flattening
    /// several matches use [`RowMerger::merge`] per match.
    pub fn merge_all(&self, outer: Row, matches: Vec<Row>) -> Row {
        match &self.mode {
            MergeMode::Populate { alias } => {
                let mut merged = outer;
                merged.push_children(*alias, matches);
                merged
            }
            MergeMode::Flatten { .. } => self.merge(&outer, matches.first()),
        }
    }

    /// Queue the output rows for one outer row and its verified matches.
    ///
    /// - flatten: one row per match, in match order
    /// - populate: exactly one row carrying every match
    /// - no match: nothing for inner joins, one null-merged row for left joins
    pub fn emit_matches(
        &self,
        join_type: JoinType,
        outer: Row,
        matches: &[&Row],
        out: &mut VecDeque<Row>,
    ) {
        if matches.is_empty() {
            if join_type.preserves_outer() {
                out.push_back(self.merge(&outer, None));
            }
            return;
        }
        match &self.mode {
            MergeMode::Flatten { .. } => {
                for inner in matches {
                    out.push_back(self.merge(&outer, Some(inner)));
                }
            }
            MergeMode::Populate { .. } => {
                let children = matches.iter().map(|r| (*r).clone()).collect();
                out.push_back(self.merge_all(outer, children));
            }
        }
    }
}
