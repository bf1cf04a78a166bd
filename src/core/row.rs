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

//! Row type - the unit produced by every physical operator
//!
//! A row is a flat value vector split into per-alias segments. A flattened
//! join appends the inner row's segments to the outer row's; a populate join
//! instead files the inner rows as a child collection keyed by the inner
//! alias ordinal.
//!
//! ```text
//! Row (s JOIN a, flattened)           Row (s POPULATE a)
//! ├── segments: [s@0..2, a@2..4]      ├── segments: [s@0..2]
//! ├── values:   [s.id, s.x, a.id, ..] ├── values:   [s.id, s.x]
//! └── children: []                    └── children: [a -> [Row, Row]]
//! ```
//!
//! Children are owned rows, so moving a populated row into an enclosing
//! populate join moves the whole subtree with it.

use std::fmt;

use smallvec::SmallVec;

use super::types::AliasId;
use super::value::Value;

/// Location of one alias' values inside a row's value vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub alias: AliasId,
    pub offset: u32,
    pub len: u32,
}

impl Segment {
    #[inline]
    fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }
}

/// Rows nested under a row by a populate join
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRows {
    pub alias: AliasId,
    pub rows: Vec<Row>,
}

/// Column access by (alias ordinal, column index).
///
/// Implemented by [`Row`] and by [`JoinedRow`], which lets join predicates
/// look at an (outer, inner) pair without materializing the merged row.
pub trait RowView {
    fn value(&self, alias: AliasId, index: usize) -> Option<&Value>;
}

/// A row produced by an operator
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    alias: AliasId,
    position: usize,
    segments: SmallVec<[Segment; 4]>,
    values: Vec<Value>,
    children: SmallVec<[ChildRows; 2]>,
}

impl Row {
    /// Create a source row holding the values of a single alias
    pub fn new(alias: AliasId, position: usize, values: Vec<Value>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(Segment {
            alias,
            offset: 0,
            len: values.len() as u32,
        });
        Self {
            alias,
            position,
            segments,
            values,
            children: SmallVec::new(),
        }
    }

    /// Alias of the source that produced this row (the outermost alias)
    #[inline]
    pub fn alias(&self) -> AliasId {
        self.alias
    }

    /// Ordinal of the row within its source
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// All values, segment after segment
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of values across all segments
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Values belonging to `alias`, if the alias is flattened into this row
    pub fn segment(&self, alias: AliasId) -> Option<&[Value]> {
        self.segments
            .iter()
            .find(|s| s.alias == alias)
            .map(|s| &self.values[s.range()])
    }

    #[inline]
    pub fn contains_alias(&self, alias: AliasId) -> bool {
        self.segments.iter().any(|s| s.alias == alias)
    }

    /// Rows nested under this row for `alias` by a populate join
    pub fn children(&self, alias: AliasId) -> Option<&[Row]> {
        self.children
            .iter()
            .find(|c| c.alias == alias)
            .map(|c| c.rows.as_slice())
    }

    #[inline]
    pub fn child_collections(&self) -> &[ChildRows] {
        &self.children
    }

    /// Append every segment, value and child collection of `other`
    pub(crate) fn append_row(&mut self, other: &Row) {
        let base = self.values.len() as u32;
        self.segments.extend(other.segments.iter().map(|s| Segment {
            alias: s.alias,
            offset: s.offset + base,
            len: s.len,
        }));
        self.values.extend(other.values.iter().cloned());
        self.children.extend(other.children.iter().cloned());
    }

    /// Append an all-NULL segment for `alias`
    pub(crate) fn append_nulls(&mut self, alias: AliasId, len: usize) {
        self.segments.push(Segment {
            alias,
            offset: self.values.len() as u32,
            len: len as u32,
        });
        self.values
            .extend(std::iter::repeat(Value::Null).take(len));
    }

    /// File `rows` as the child collection of `alias`
    pub(crate) fn push_children(&mut self, alias: AliasId, rows: Vec<Row>) {
        match self.children.iter_mut().find(|c| c.alias == alias) {
            Some(existing) => existing.rows.extend(rows),
            None => self.children.push(ChildRows { alias, rows }),
        }
    }
}

impl RowView for Row {
    #[inline]
    fn value(&self, alias: AliasId, index: usize) -> Option<&Value> {
        let seg = self.segments.iter().find(|s| s.alias == alias)?;
        if index < seg.len as usize {
            self.values.get(seg.offset as usize + index)
        } else {
            None
        }
    }
}

/// An (outer, inner) pair viewed as one row.
#[derive(Debug, Clone, Copy)]
pub struct JoinedRow<'a> {
    pub outer: &'a Row,
    pub inner: &'a Row,
}

impl<'a> JoinedRow<'a> {
    #[inline]
    pub fn new(outer: &'a Row, inner: &'a Row) -> Self {
        Self { outer, inner }
    }
}

impl RowView for JoinedRow<'_> {
    #[inline]
    fn value(&self, alias: AliasId, index: usize) -> Option<&Value> {
        self.outer
            .value(alias, index)
            .or_else(|| self.inner.value(alias, index))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        for child in &self.children {
            write!(f, " | {}: [", child.alias)?;
            for (i, row) in child.rows.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", row)?;
            }
            write!(f, "]")?;
        }
        write!(f, ")")
    }
}
