//! Benchmarks for the API request log store
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use reqlog::{ApiRequestLogs, CacheConfig, LogQuery, LogRecordPatch, MemoryCache, StoreConfig};
use std::sync::Arc;
use tempfile::tempdir;

fn open_logs(dir: &tempfile::TempDir, cache_queries: bool) -> ApiRequestLogs {
    let cache_config = CacheConfig {
        cache_queries,
        ..Default::default()
    };
    ApiRequestLogs::open(
        &StoreConfig::new(dir.path().join("bench.db")),
        &cache_config,
        Arc::new(MemoryCache::new()),
    )
    .unwrap()
}

fn sample_patch(i: u64) -> LogRecordPatch {
    LogRecordPatch::new()
        .user_id(i % 50)
        .version("2")
        .ip(format!("10.0.{}.{}", (i / 256) % 256, i % 256))
        .request("GET /edd-api/v2/sales")
        .time(0.015)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(1));

    group.bench_function("insert_single", |b| {
        let dir = tempdir().unwrap();
        let logs = open_logs(&dir, false);
        let mut i = 0u64;

        b.iter(|| {
            i += 1;
            logs.insert(black_box(sample_patch(i))).unwrap()
        });
    });

    group.finish();
}

fn bench_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("count");

    for cache_queries in [false, true] {
        let dir = tempdir().unwrap();
        let logs = open_logs(&dir, cache_queries);
        for i in 0..10_000 {
            logs.insert(sample_patch(i)).unwrap();
        }

        let query = LogQuery::new().user_id(7);
        let name = if cache_queries { "by_user_cached" } else { "by_user" };

        group.bench_function(name, |b| {
            b.iter(|| logs.count(black_box(&query)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_count);
criterion_main!(benches);
