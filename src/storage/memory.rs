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

//! In-memory catalog
//!
//! Tables are plain row vectors. Full-row indices are hash maps from the
//! index key tuple to row ordinals:
//!
//! ```text
//! MemoryTable
//! ├── columns: ["art_id", "club_id", "name"]
//! ├── rows: Arc<Vec<Vec<Value>>>
//! └── indices
//!     └── [art_id, club_id] ALL
//!         └── entries: {(1, 1460) -> [0, 4], (3, 1460) -> [2]}
//! ```
//!
//! Every scan and batch seek is counted so tests and benchmarks can observe
//! how often the join core touched storage.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::{AliasId, Error, Result, Row, Value};
use crate::executor::context::ExecutionContext;
use crate::executor::operator::{BoxedRowIterator, Operator, RowIterator};
use crate::expression::KeyValues;
use crate::plan::AliasNode;

use super::catalog::{Catalog, Index, IndexColumnsType};

type TableRows = Arc<Vec<Vec<Value>>>;

/// Storage access counters
#[derive(Debug, Default)]
pub struct CatalogStats {
    scans: AtomicUsize,
    batch_seeks: AtomicUsize,
    seek_keys: AtomicUsize,
    rows_read: AtomicUsize,
}

/// Point-in-time copy of [`CatalogStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogStatsSnapshot {
    /// Scan operators opened
    pub scans: usize,
    /// Batched seek requests served
    pub batch_seeks: usize,
    /// Seek keys received across all batches
    pub seek_keys: usize,
    /// Rows handed out by scans and seeks
    pub rows_read: usize,
}

impl CatalogStats {
    fn snapshot(&self) -> CatalogStatsSnapshot {
        CatalogStatsSnapshot {
            scans: self.scans.load(Ordering::Relaxed),
            batch_seeks: self.batch_seeks.load(Ordering::Relaxed),
            seek_keys: self.seek_keys.load(Ordering::Relaxed),
            rows_read: self.rows_read.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.scans.store(0, Ordering::Relaxed);
        self.batch_seeks.store(0, Ordering::Relaxed);
        self.seek_keys.store(0, Ordering::Relaxed);
        self.rows_read.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct MemoryIndex {
    meta: Index,
    /// Table column position of each index column
    positions: Vec<usize>,
    /// Key tuple -> row ordinals; empty for partial indices
    entries: FxHashMap<Vec<Value>, SmallVec<[u32; 4]>>,
}

impl MemoryIndex {
    fn add(&mut self, row_idx: u32, values: &[Value]) {
        if !self.meta.is_full_row() {
            return;
        }
        let key: Vec<Value> = self.positions.iter().map(|&p| values[p].clone()).collect();
        self.entries.entry(key).or_default().push(row_idx);
    }
}

#[derive(Debug)]
struct MemoryTable {
    name: String,
    columns: Vec<String>,
    rows: TableRows,
    indices: Vec<MemoryIndex>,
}

impl MemoryTable {
    fn column_position(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    }

    /// Table positions of the alias' columns, in alias order
    fn projection(&self, alias: &AliasNode) -> Result<Vec<usize>> {
        alias
            .columns
            .iter()
            .map(|c| {
                self.column_position(c)
                    .ok_or_else(|| Error::unknown_column(&alias.alias, c))
            })
            .collect()
    }
}

/// Catalog keeping every table in memory
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: FxHashMap<String, MemoryTable>,
    stats: Arc<CatalogStats>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table
    pub fn create_table<S: Into<String>>(
        &mut self,
        name: &str,
        columns: impl IntoIterator<Item = S>,
    ) -> Result<()> {
        let key = name.to_ascii_lowercase();
        if self.tables.contains_key(&key) {
            return Err(Error::catalog(format!("table '{}' already exists", name)));
        }
        self.tables.insert(
            key,
            MemoryTable {
                name: name.to_string(),
                columns: columns.into_iter().map(Into::into).collect(),
                rows: Arc::new(Vec::new()),
                indices: Vec::new(),
            },
        );
        Ok(())
    }

    fn table(&self, name: &str) -> Result<&MemoryTable> {
        self.tables
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemoryTable> {
        self.tables
            .get_mut(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Append one row; values follow the table's column order
    pub fn insert(&mut self, table: &str, values: Vec<Value>) -> Result<()> {
        let t = self.table_mut(table)?;
        if values.len() != t.columns.len() {
            return Err(Error::catalog(format!(
                "table '{}' has {} columns, got {} values",
                t.name,
                t.columns.len(),
                values.len()
            )));
        }
        let rows = Arc::make_mut(&mut t.rows);
        let row_idx = rows.len() as u32;
        for index in &mut t.indices {
            index.add(row_idx, &values);
        }
        rows.push(values);
        Ok(())
    }

    /// Append many rows
    pub fn insert_rows(
        &mut self,
        table: &str,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Result<()> {
        for values in rows {
            self.insert(table, values)?;
        }
        Ok(())
    }

    /// Create a full-row index over `columns`, indexing existing rows
    pub fn create_index(&mut self, table: &str, columns: &[&str]) -> Result<()> {
        self.add_index(table, columns, IndexColumnsType::All)
    }

    /// Register a partial index; it is reported by `indices()` but cannot
    /// serve batched seeks
    pub fn create_partial_index(&mut self, table: &str, columns: &[&str]) -> Result<()> {
        self.add_index(table, columns, IndexColumnsType::Some)
    }

    fn add_index(
        &mut self,
        table: &str,
        columns: &[&str],
        columns_type: IndexColumnsType,
    ) -> Result<()> {
        let t = self.table_mut(table)?;
        let positions = columns
            .iter()
            .map(|c| {
                t.column_position(c).ok_or_else(|| {
                    Error::catalog(format!("column '{}' not found in table '{}'", c, t.name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut index = MemoryIndex {
            meta: Index::new(columns.iter().copied(), columns_type),
            positions,
            entries: FxHashMap::default(),
        };
        for (row_idx, values) in t.rows.iter().enumerate() {
            index.add(row_idx as u32, values);
        }
        t.indices.push(index);
        Ok(())
    }

    /// Number of rows in `table`
    pub fn row_count(&self, table: &str) -> Result<usize> {
        Ok(self.table(table)?.rows.len())
    }

    /// Current access counters
    pub fn stats(&self) -> CatalogStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

impl Catalog for MemoryCatalog {
    fn indices(&self, table: &str) -> Result<Vec<Index>> {
        Ok(self
            .table(table)?
            .indices
            .iter()
            .map(|i| i.meta.clone())
            .collect())
    }

    fn scan_operator(&self, alias: &AliasNode) -> Result<Box<dyn Operator>> {
        let t = self.table(&alias.table)?;
        Ok(Box::new(MemoryScanOperator {
            table: t.name.clone(),
            alias: alias.id,
            alias_name: alias.alias.clone(),
            rows: t.rows.clone(),
            projection: t.projection(alias)?,
            stats: self.stats.clone(),
        }))
    }

    fn open_batch<'a>(
        &'a self,
        ctx: &ExecutionContext,
        alias: &AliasNode,
        index: &Index,
        keys: &[KeyValues],
    ) -> Result<BoxedRowIterator<'a>> {
        let t = self.table(&alias.table)?;
        let mem_index = t
            .indices
            .iter()
            .find(|i| i.meta.is_full_row() && i.meta.has_columns(&index.columns))
            .ok_or_else(|| Error::index_not_provided(&t.name, &index.columns))?;

        let mut matches = Vec::new();
        for key in keys {
            if let Some(rows) = mem_index.entries.get(key.as_slice()) {
                matches.extend(rows.iter().copied());
            }
        }

        self.stats.batch_seeks.fetch_add(1, Ordering::Relaxed);
        self.stats.seek_keys.fetch_add(keys.len(), Ordering::Relaxed);

        Ok(Box::new(TableRowIterator {
            alias: alias.id,
            rows: t.rows.clone(),
            projection: t.projection(alias)?,
            selection: Some(matches),
            pos: 0,
            stats: self.stats.clone(),
            ctx: ctx.clone(),
        }))
    }
}

/// Full scan of one alias over a memory table
pub struct MemoryScanOperator {
    table: String,
    alias: AliasId,
    alias_name: String,
    rows: TableRows,
    projection: Vec<usize>,
    stats: Arc<CatalogStats>,
}

impl Operator for MemoryScanOperator {
    fn open<'a>(&'a self, ctx: &ExecutionContext) -> Result<BoxedRowIterator<'a>> {
        self.stats.scans.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(TableRowIterator {
            alias: self.alias,
            rows: self.rows.clone(),
            projection: self.projection.clone(),
            selection: None,
            pos: 0,
            stats: self.stats.clone(),
            ctx: ctx.clone(),
        }))
    }

    fn name(&self) -> &str {
        "Scan"
    }

    fn describe(&self) -> String {
        if self.table.eq_ignore_ascii_case(&self.alias_name) {
            format!("Scan {}", self.table)
        } else {
            format!("Scan {} AS {}", self.table, self.alias_name)
        }
    }

    fn estimated_rows(&self) -> Option<usize> {
        Some(self.rows.len())
    }
}

/// Streams table rows, either all of them or a selection of ordinals
struct TableRowIterator {
    alias: AliasId,
    rows: TableRows,
    projection: Vec<usize>,
    selection: Option<Vec<u32>>,
    pos: usize,
    stats: Arc<CatalogStats>,
    ctx: ExecutionContext,
}

impl RowIterator for TableRowIterator {
    fn next(&mut self) -> Result<Option<Row>> {
        if self.ctx.is_cancelled() {
            return Ok(None);
        }
        let row_idx = match &self.selection {
            Some(sel) => match sel.get(self.pos) {
                Some(&idx) => idx as usize,
                None => return Ok(None),
            },
            None if self.pos < self.rows.len() => self.pos,
            None => return Ok(None),
        };
        self.pos += 1;

        let source = &self.rows[row_idx];
        let values = self.projection.iter().map(|&p| source[p].clone()).collect();
        self.stats.rows_read.fetch_add(1, Ordering::Relaxed);
        Ok(Some(Row::new(self.alias, row_idx, values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::operator::collect_rows;
    use crate::plan::AliasTree;
    use smallvec::smallvec;

    fn make_catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .create_table("articles", ["art_id", "club_id", "name"])
            .unwrap();
        catalog
            .insert_rows(
                "articles",
                vec![
                    vec![Value::integer(1), Value::integer(1460), Value::text("ball")],
                    vec![Value::integer(2), Value::integer(1460), Value::text("shirt")],
                    vec![Value::integer(1), Value::integer(7), Value::text("cap")],
                    vec![Value::integer(1), Value::integer(1460), Value::text("scarf")],
                ],
            )
            .unwrap();
        catalog
            .create_index("articles", &["art_id", "club_id"])
            .unwrap();
        catalog
    }

    fn alias_tree() -> AliasTree {
        let mut tree = AliasTree::new();
        tree.add_root("articles", "a", ["name", "art_id"]).unwrap();
        tree
    }

    #[test]
    fn test_scan_projects_alias_columns() {
        let catalog = make_catalog();
        let tree = alias_tree();
        let alias = tree.node(AliasId(0)).unwrap();
        let scan = catalog.scan_operator(alias).unwrap();
        assert_eq!(scan.describe(), "Scan articles AS a");

        let rows = collect_rows(scan.as_ref(), &ExecutionContext::new()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].values(), &[Value::text("cap"), Value::integer(1)]);
        assert_eq!(rows[2].position(), 2);
        assert_eq!(catalog.stats().scans, 1);
        assert_eq!(catalog.stats().rows_read, 4);
    }

    #[test]
    fn test_batch_seek() {
        let catalog = make_catalog();
        let tree = alias_tree();
        let alias = tree.node(AliasId(0)).unwrap();
        let index = Index::new(["art_id", "club_id"], IndexColumnsType::All);

        let keys: Vec<KeyValues> = vec![
            smallvec![Value::integer(1), Value::integer(1460)],
            smallvec![Value::integer(2), Value::integer(1460)],
            smallvec![Value::integer(9), Value::integer(1460)],
        ];
        let ctx = ExecutionContext::new();
        let mut iter = catalog.open_batch(&ctx, alias, &index, &keys).unwrap();
        let mut names = Vec::new();
        while let Some(row) = iter.next().unwrap() {
            names.push(row.values()[0].clone());
        }
        assert_eq!(
            names,
            vec![Value::text("ball"), Value::text("scarf"), Value::text("shirt")]
        );

        let stats = catalog.stats();
        assert_eq!(stats.batch_seeks, 1);
        assert_eq!(stats.seek_keys, 3);

        catalog.reset_stats();
        assert_eq!(catalog.stats(), CatalogStatsSnapshot::default());
    }

    #[test]
    fn test_seek_on_missing_index() {
        let mut catalog = make_catalog();
        catalog
            .create_partial_index("articles", &["name"])
            .unwrap();
        let tree = alias_tree();
        let alias = tree.node(AliasId(0)).unwrap();
        let ctx = ExecutionContext::new();

        for index in [
            Index::new(["club_id"], IndexColumnsType::All),
            Index::new(["name"], IndexColumnsType::Some),
        ] {
            let err = catalog.open_batch(&ctx, alias, &index, &[]).err().unwrap();
            assert!(matches!(err, Error::IndexNotProvided { .. }));
            assert!(err.is_evaluation_error());
        }
        assert_eq!(catalog.indices("articles").unwrap().len(), 2);
    }

    #[test]
    fn test_catalog_errors() {
        let mut catalog = make_catalog();
        assert!(matches!(
            catalog.insert("articles", vec![Value::integer(1)]),
            Err(Error::Catalog(_))
        ));
        assert!(matches!(
            catalog.indices("nope"),
            Err(Error::TableNotFound(_))
        ));

        let mut tree = AliasTree::new();
        let id = tree.add_root("articles", "a", ["price"]).unwrap();
        assert_eq!(
            catalog.scan_operator(tree.node(id).unwrap()).err(),
            Some(Error::unknown_column("a", "price"))
        );
    }
}
