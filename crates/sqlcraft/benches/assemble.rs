use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlcraft::prelude::*;
use sqlcraft::{PgDialect, QueryCache};
use std::sync::Arc;

/// SELECT with `n` columns and `n` AND-ed predicates:
/// SELECT "col0","col1",... FROM "t" WHERE ("col0" = $1) AND ("col1" = $2) ...
fn build_select(n: usize) -> Select {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let mut q = Select::with_dialect(Arc::new(PgDialect)).from_cols("t", columns);
    for i in 0..n {
        q = q.where_(format!("col{i}"), "=", i as i64);
    }
    q
}

/// `depth` nested OR groups, each holding two predicates.
fn build_nested(depth: usize) -> Select {
    let mut q = select().from("t");
    for i in 0..depth {
        q = q
            .where_or()
            .where_(format!("a{i}"), "=", i as i64)
            .or_where(format!("b{i}"), "IN", vec![1, 2, 3]);
    }
    for _ in 0..depth {
        q = q.where_end();
    }
    q
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble/select");

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.assemble()));
        });
    }

    group.finish();
}

fn bench_build_and_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble/build_and_assemble");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let q = build_select(n);
                black_box(q.assemble())
            });
        });
    }

    group.finish();
}

fn bench_nested_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble/nested_groups");

    for depth in [1, 4, 16, 64] {
        let q = build_nested(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &q, |b, q| {
            b.iter(|| black_box(q.assemble()));
        });
    }

    group.finish();
}

fn bench_insert_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble/insert_rows");

    for rows in [1, 10, 100, 1000] {
        let mut q = insert().table("t").fields(["a", "b", "c"]);
        for i in 0..rows {
            q = q.values([Value::from(i as i64), Value::from("x"), Value::Null]);
        }
        group.bench_with_input(BenchmarkId::from_parameter(rows), &q, |b, q| {
            b.iter(|| black_box(q.assemble()));
        });
    }

    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let cache = QueryCache::new(16);
    let q = build_select(10);
    c.bench_function("assemble/cache_hit", |b| {
        b.iter(|| black_box(cache.get_or_try_insert_with("select10", || q.to_sql())));
    });
}

criterion_group!(
    benches,
    bench_assemble,
    bench_build_and_assemble,
    bench_nested_groups,
    bench_insert_rows,
    bench_cache_hit
);
criterion_main!(benches);
