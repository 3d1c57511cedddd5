//! Performance benchmarks for schemafind
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use schemafind::catalog::{
    ColumnEntity, Generation, IncrementalLoader, MemorySource, SearchMode, TableEntity,
};
use schemafind::index::CatalogIndex;
use schemafind::query::{FuzzyConfig, FuzzyMatcher, SearchEngine};
use std::sync::Arc;

const WORDS: &[&str] = &[
    "ORDER", "ITEM", "CUSTOMER", "INVOICE", "PAYMENT", "SHIPMENT", "PRODUCT", "USER", "ACCOUNT",
    "AUDIT", "LEDGER", "REGION",
];

/// Synthetic catalog of `tables` tables with four columns each
fn catalog_source(tables: usize) -> MemorySource {
    let mut table_rows = Vec::with_capacity(tables);
    let mut column_rows = Vec::with_capacity(tables * 4);

    for i in 0..tables {
        let schema = format!("SCHEMA_{}", i % 7);
        let name = format!(
            "{}_{}_{}",
            WORDS[i % WORDS.len()],
            WORDS[(i / WORDS.len()) % WORDS.len()],
            i
        );
        for (j, column) in ["ID", "CREATED_AT", "STATUS", "AMOUNT"].iter().enumerate() {
            let column = if j == 0 {
                format!("{}_{}", WORDS[(i + 3) % WORDS.len()], column)
            } else {
                column.to_string()
            };
            column_rows.push(ColumnEntity::new(&schema, &name, column, "VARCHAR"));
        }
        table_rows.push(TableEntity::new(schema, name).with_remarks("synthetic table"));
    }

    MemorySource::new(table_rows, column_rows)
}

fn loaded(tables: usize) -> (IncrementalLoader, CatalogIndex) {
    let mut loader = IncrementalLoader::new(Arc::new(catalog_source(tables)), None);
    loader.load_initial(tables);
    let mut index = CatalogIndex::new();
    index.rebuild(loader.catalog(), loader.generation());
    (loader, index)
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    for size in [1_000usize, 10_000] {
        let (loader, _) = loaded(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut index = CatalogIndex::new();
                index.rebuild(black_box(loader.catalog()), Generation(1));
                index
            })
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let (loader, index) = loaded(10_000);
    let engine = SearchEngine::default();

    let mut group = c.benchmark_group("search");
    for (name, mode, query) in [
        ("prefix", SearchMode::Tables, "ord"),
        ("two_words", SearchMode::Tables, "invoice payment"),
        ("columns", SearchMode::Columns, "created"),
        // trie misses, full fuzzy scan
        ("fuzzy_fallback", SearchMode::Tables, "custmer"),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                engine.search(
                    loader.catalog(),
                    &index,
                    loader.generation(),
                    mode,
                    black_box(query),
                )
            })
        });
    }
    group.finish();
}

fn bench_fuzzy_match(c: &mut Criterion) {
    let matcher = FuzzyMatcher::new(FuzzyConfig::default());
    let mut group = c.benchmark_group("fuzzy_match");

    group.bench_function("substring", |b| {
        b.iter(|| matcher.matches(black_box("CUSTOMER_ORDER_ITEMS"), black_box("order")))
    });

    group.bench_function("edit_distance", |b| {
        b.iter(|| matcher.matches(black_box("CUSTOMER_ORDER_ITEMS"), black_box("itmes")))
    });

    group.bench_function("miss", |b| {
        b.iter(|| matcher.matches(black_box("CUSTOMER_ORDER_ITEMS"), black_box("zzzz")))
    });

    group.finish();
}

criterion_group!(benches, bench_index_build, bench_search, bench_fuzzy_match);
criterion_main!(benches);
