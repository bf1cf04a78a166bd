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

//! Join strategy comparison: BatchHashJoin vs HashMatch vs NestedLoopJoin
//!
//! Run with: cargo bench --bench join_strategies
//!
//! Every strategy runs the same plan over the same data:
//! 1. 2K stock rows, 20K article rows, 500 distinct article ids
//! 2. Equality join `a.art_id = s.id`, flattening and populate variants
//! 3. One operator tree per strategy, reopened for every iteration

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stoolap_join::plan::{col, eq};
use stoolap_join::storage::MemoryCatalog;
use stoolap_join::{
    collect_rows, AliasTree, ExecutionContext, JoinConfig, JoinType, LogicalPlan,
    OperatorBuilder, Value,
};

const STOCK_ROWS: usize = 2_000;
const ARTICLE_ROWS: usize = 20_000;
const DISTINCT_IDS: i64 = 500;

struct Setup {
    catalog: Arc<MemoryCatalog>,
    tree: Arc<AliasTree>,
    flat: LogicalPlan,
    populate: LogicalPlan,
}

fn setup() -> Setup {
    let mut rng = StdRng::seed_from_u64(1460);
    let mut catalog = MemoryCatalog::new();
    catalog.create_table("stock", ["id", "qty"]).unwrap();
    catalog
        .create_table("articles", ["art_id", "club_id", "name"])
        .unwrap();

    catalog
        .insert_rows(
            "stock",
            (0..STOCK_ROWS).map(|i| {
                vec![
                    Value::integer(rng.gen_range(0..DISTINCT_IDS * 2)),
                    Value::integer(i as i64),
                ]
            }),
        )
        .unwrap();
    catalog
        .insert_rows(
            "articles",
            (0..ARTICLE_ROWS).map(|i| {
                vec![
                    Value::integer(rng.gen_range(0..DISTINCT_IDS)),
                    Value::integer(rng.gen_range(0..50)),
                    Value::text(format!("Article_{}", i)),
                ]
            }),
        )
        .unwrap();
    catalog.create_index("articles", &["art_id"]).unwrap();

    let mut tree = AliasTree::new();
    let s = tree.add_root("stock", "s", ["id", "qty"]).unwrap();
    let a = tree
        .add_child(s, "articles", "a", ["art_id", "club_id", "name"])
        .unwrap();

    let on = || Some(eq(col("a", "art_id"), col("s", "id")));
    Setup {
        catalog: Arc::new(catalog),
        tree: Arc::new(tree),
        flat: LogicalPlan::join(
            LogicalPlan::scan(s),
            LogicalPlan::scan(a),
            JoinType::Left,
            on(),
        ),
        populate: LogicalPlan::populate(
            LogicalPlan::scan(s),
            LogicalPlan::scan(a),
            JoinType::Left,
            on(),
        ),
    }
}

fn bench_join_strategies(c: &mut Criterion) {
    let setup = setup();
    let configs = [
        ("batch_hash_join", JoinConfig::default()),
        ("hash_match", JoinConfig::without_index_joins()),
        ("nested_loop", JoinConfig::nested_loop_only()),
    ];

    let mut group = c.benchmark_group("left_join");
    group.sample_size(10);
    for (name, config) in &configs {
        for (shape, plan) in [("flat", &setup.flat), ("populate", &setup.populate)] {
            let op = OperatorBuilder::new(setup.catalog.clone(), setup.tree.clone())
                .with_config(config.clone())
                .build(plan)
                .unwrap();
            group.bench_with_input(BenchmarkId::new(*name, shape), &op, |b, op| {
                b.iter(|| {
                    let rows = collect_rows(op.as_ref(), &ExecutionContext::new()).unwrap();
                    black_box(rows.len())
                })
            });
        }
    }
    group.finish();

    let mut group = c.benchmark_group("batch_size");
    for batch_size in [10, 100, 1000] {
        let op = OperatorBuilder::new(setup.catalog.clone(), setup.tree.clone())
            .with_config(JoinConfig::default().with_batch_size(batch_size))
            .build(&setup.flat)
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &op, |b, op| {
            b.iter(|| {
                let rows = collect_rows(op.as_ref(), &ExecutionContext::new()).unwrap();
                black_box(rows.len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_join_strategies);
criterion_main!(benches);
