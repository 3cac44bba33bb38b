use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sqlkv::kv::store::{KeyValues, SetOptions, SqliteStore, SqliteStoreConfig, Store};
use tempfile::TempDir;
use tokio::runtime::Runtime;

const NUM_ITEMS: usize = 1_000;

// ========== 辅助函数 ==========

fn generate_key(i: usize) -> String {
    format!("key_{:010}", i)
}

fn generate_value(i: usize) -> Vec<u8> {
    format!("value_{:010}", i).into_bytes()
}

fn open_store(rt: &Runtime, dir: &TempDir) -> SqliteStore {
    let path = dir.path().join("bench.db");
    rt.block_on(SqliteStore::new(SqliteStoreConfig::with_path(
        path.to_string_lossy(),
    )))
    .unwrap()
}

fn fill(rt: &Runtime, store: &SqliteStore) {
    let kvs: KeyValues = (0..NUM_ITEMS)
        .map(|i| (generate_key(i), generate_value(i)))
        .collect();
    rt.block_on(store.mset(&kvs, &SetOptions::new())).unwrap();
}

// ========== 1. 单条写入 ==========

fn benchmark_set(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();
    let store = open_store(&rt, &dir);

    let mut i = 0;
    c.bench_function("sqlite_set", |b| {
        b.to_async(&rt).iter(|| {
            i = (i + 1) % NUM_ITEMS;
            let key = generate_key(i);
            let value = generate_value(i);
            let store = &store;
            async move {
                black_box(store.set(&key, &value, &SetOptions::new()).await.unwrap());
            }
        })
    });
}

// ========== 2. 单条读取 ==========

fn benchmark_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();
    let store = open_store(&rt, &dir);
    fill(&rt, &store);

    let mut i = 0;
    c.bench_function("sqlite_get", |b| {
        b.to_async(&rt).iter(|| {
            i = (i + 1) % NUM_ITEMS;
            let key = generate_key(i);
            let store = &store;
            async move {
                black_box(store.get(&key).await.unwrap());
            }
        })
    });
}

// ========== 3. 批量读取 ==========

fn benchmark_mget(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();
    let store = open_store(&rt, &dir);
    fill(&rt, &store);

    let mut group = c.benchmark_group("sqlite_mget");
    for batch in [10, 100] {
        let keys: Vec<String> = (0..batch).map(generate_key).collect();
        group.bench_with_input(BenchmarkId::from_parameter(batch), &keys, |b, keys| {
            b.to_async(&rt)
                .iter(|| async { black_box(store.mget(keys).await.unwrap()) })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_set, benchmark_get, benchmark_mget);
criterion_main!(benches);
