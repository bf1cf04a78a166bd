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

//! # Stoolap Join - physical join core
//!
//! Lowers logical join trees to pull-based physical operators and runs them.
//! For every join the builder analyzes the ON predicate, pushes filters down
//! to the inner scan and picks one of three interchangeable strategies.
//!
//! ## Key Features
//!
//! - **NestedLoopJoin** - Any predicate, correlated inner sides, cross joins
//! - **HashMatch** - In-memory hash join over equi-join keys
//! - **BatchHashJoin** - One batched index seek per batch of outer rows
//! - **Populate joins** - Matched inner rows nested under their outer row
//! - **Cooperative cancellation** - Every join polls a shared abort flag
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use stoolap_join::executor::{collect_rows, ExecutionContext, OperatorBuilder};
//! use stoolap_join::plan::{col, eq, AliasTree, LogicalPlan};
//! use stoolap_join::storage::MemoryCatalog;
//! use stoolap_join::{JoinType, Value};
//!
//! let mut catalog = MemoryCatalog::new();
//! catalog.create_table("stock", ["id"]).unwrap();
//! catalog.create_table("articles", ["art_id"]).unwrap();
//! catalog.insert_rows("stock", vec![vec![Value::integer(1)], vec![Value::integer(2)]]).unwrap();
//! catalog
//!     .insert_rows("articles", [1, 1, 3].map(|id| vec![Value::integer(id)]))
//!     .unwrap();
//!
//! let mut tree = AliasTree::new();
//! let s = tree.add_root("stock", "s", ["id"]).unwrap();
//! let a = tree.add_child(s, "articles", "a", ["art_id"]).unwrap();
//!
//! let plan = LogicalPlan::join(
//!     LogicalPlan::scan(s),
//!     LogicalPlan::scan(a),
//!     JoinType::Left,
//!     Some(eq(col("a", "art_id"), col("s", "id"))),
//! );
//! let builder = OperatorBuilder::new(Arc::new(catalog), Arc::new(tree));
//! let op = builder.build(&plan).unwrap();
//! let rows = collect_rows(op.as_ref(), &ExecutionContext::new()).unwrap();
//! assert_eq!(rows.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`core`] - Core types ([`Value`], [`Row`], [`Error`], [`JoinType`])
//! - [`plan`] - Alias tree, expressions and logical plans
//! - [`optimizer`] - Predicate analyzer and pushdown splitter
//! - [`expression`] - Predicate, key and hash evaluation
//! - [`executor`] - Operator builder, join operators, execution context
//! - [`storage`] - Catalog contract and an in-memory catalog
//! - [`config`] - Join strategy configuration

pub mod config;
pub mod core;
pub mod executor;
pub mod expression;
pub mod optimizer;
pub mod plan;
pub mod storage;

pub use config::JoinConfig;

pub use core::{AliasId, DataType, Error, JoinType, Result, Row, RowView, Value};

pub use executor::{
    collect_rows, explain, CancellationHandle, ExecutionContext, JoinStrategy, Operator,
    OperatorBuilder, RowIterator, RowMerger,
};

pub use plan::{AliasNode, AliasTree, Expression, LogicalPlan};

pub use storage::{Catalog, Index, IndexColumnsType, MemoryCatalog};
