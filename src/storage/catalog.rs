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

//! Catalog contract consumed by the join core
//!
//! The catalog owns table data. The join core only asks it for index
//! metadata, for a scan operator per alias, and for batched index seeks.

use std::fmt;

use crate::core::Result;
use crate::executor::context::ExecutionContext;
use crate::executor::operator::{BoxedRowIterator, Operator};
use crate::expression::KeyValues;
use crate::plan::AliasNode;

/// What an index entry carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexColumnsType {
    /// Entries lead to the full row
    All,
    /// Entries carry only some columns
    Some,
}

impl fmt::Display for IndexColumnsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexColumnsType::All => write!(f, "ALL"),
            IndexColumnsType::Some => write!(f, "SOME"),
        }
    }
}

/// Index metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Index {
    pub columns: Vec<String>,
    pub columns_type: IndexColumnsType,
}

impl Index {
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        columns_type: IndexColumnsType,
    ) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            columns_type,
        }
    }

    /// Check if index entries lead to full rows
    pub fn is_full_row(&self) -> bool {
        self.columns_type == IndexColumnsType::All
    }

    /// Check if this index is over exactly `columns`, in order
    pub fn has_columns(&self, columns: &[String]) -> bool {
        self.columns.len() == columns.len()
            && self
                .columns
                .iter()
                .zip(columns.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Check if every index column is in `available`
    pub fn is_covered_by(&self, available: &[&str]) -> bool {
        self.columns
            .iter()
            .all(|c| available.iter().any(|a| a.eq_ignore_ascii_case(c)))
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.columns.join(", "))
    }
}

/// Storage collaborator
pub trait Catalog: Send + Sync {
    /// Indices defined on `table`
    fn indices(&self, table: &str) -> Result<Vec<Index>>;

    /// Operator producing every row of `alias`, with the alias' columns in
    /// alias order
    fn scan_operator(&self, alias: &AliasNode) -> Result<Box<dyn Operator>>;

    /// Batched index seek: rows of `alias` whose `index` columns equal any
    /// of `keys`. Each key lists values in index column order.
    ///
    /// Fails with [`crate::core::Error::IndexNotProvided`] when the catalog
    /// has no such index.
    fn open_batch<'a>(
        &'a self,
        ctx: &ExecutionContext,
        alias: &AliasNode,
        index: &Index,
        keys: &[KeyValues],
    ) -> Result<BoxedRowIterator<'a>>;
}
