use std::sync::Arc;

use common::StockLine;
use criterion::{Criterion, criterion_group, criterion_main};
use inventory::{InMemoryInventoryStore, InventoryService};

fn bench_reserve_single_line(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = InventoryService::new(InMemoryInventoryStore::with_stock([("p1", u32::MAX)]));
    let lines = [StockLine::new("p1", 1)];

    c.bench_function("inventory/reserve_single_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.reserve(&lines).await.unwrap();
            });
        });
    });
}

fn bench_reserve_then_release(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = InventoryService::new(InMemoryInventoryStore::with_stock([
        ("p1", 1_000),
        ("p2", 1_000),
        ("p3", 1_000),
    ]));
    let lines = [
        StockLine::new("p1", 2),
        StockLine::new("p2", 1),
        StockLine::new("p3", 5),
    ];

    c.bench_function("inventory/reserve_then_release_3_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.reserve(&lines).await.unwrap();
                service.release(&lines).await.unwrap();
            });
        });
    });
}

fn bench_contended_reservations(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();

    c.bench_function("inventory/contended_32_tasks", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = Arc::new(InventoryService::new(
                    InMemoryInventoryStore::with_stock([("hot", 16)]),
                ));
                let handles: Vec<_> = (0..32)
                    .map(|_| {
                        let service = service.clone();
                        tokio::spawn(
                            async move { service.reserve(&[StockLine::new("hot", 1)]).await },
                        )
                    })
                    .collect();
                for handle in handles {
                    let _ = handle.await.unwrap();
                }
            });
        });
    });
}

criterion_group!(
    benches,
    bench_reserve_single_line,
    bench_reserve_then_release,
    bench_contended_reservations
);
criterion_main!(benches);
