//! Throughput benchmarks for waiting queue operations

use async_trait::async_trait;
use briscola_lobby::error::Result;
use briscola_lobby::events::EventPublisher;
use briscola_lobby::queue::QueueRegistry;
use briscola_lobby::service::QueueService;
use briscola_lobby::types::{JoinRequest, QueueEvent};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::thread;

// Event publisher that drops everything
#[derive(Debug, Clone)]
struct BenchEventPublisher;

#[async_trait]
impl EventPublisher for BenchEventPublisher {
    async fn publish(&self, _event: QueueEvent) -> Result<()> {
        Ok(())
    }
}

fn bench_join_and_start(c: &mut Criterion) {
    let registry = QueueRegistry::default();
    registry.create_queue("table4", 4).unwrap();

    c.bench_function("registry_round_of_four", |b| {
        b.iter(|| {
            for id in ["id1", "id2", "id3", "id4"] {
                registry.join_queue("table4", "Player", id).unwrap();
            }
            black_box(registry.start_match("table4").unwrap())
        })
    });
}

fn bench_rejected_join(c: &mut Criterion) {
    let registry = QueueRegistry::default();
    registry.create_queue("table2", 2).unwrap();
    registry.join_queue("table2", "Alice", "id1").unwrap();
    registry.join_queue("table2", "Bob", "id2").unwrap();

    c.bench_function("registry_join_full_queue", |b| {
        b.iter(|| black_box(registry.join_queue("table2", "Carol", "id3")))
    });
}

fn bench_contended_joins(c: &mut Criterion) {
    c.bench_function("registry_contended_joins_8_threads", |b| {
        b.iter(|| {
            let registry = QueueRegistry::default();
            registry.create_queue("table", 8).unwrap();

            thread::scope(|scope| {
                for i in 0..8 {
                    let registry = &registry;
                    scope.spawn(move || {
                        let id = format!("id{}", i);
                        let _ = registry.join_queue("table", "Player", &id);
                    });
                }
            });

            black_box(registry.start_match("table").unwrap())
        })
    });
}

fn bench_service_round(c: &mut Criterion) {
    let service = QueueService::new(QueueRegistry::default(), Arc::new(BenchEventPublisher));
    tokio_test::block_on(service.create_queue("table2", 2)).unwrap();

    c.bench_function("service_round_of_two", |b| {
        b.iter(|| {
            tokio_test::block_on(async {
                for id in ["id1", "id2"] {
                    let request = JoinRequest {
                        queue: "table2".to_string(),
                        player_name: "Player".to_string(),
                        player_id: id.to_string(),
                    };
                    service.join_queue(request).await.unwrap();
                }
                black_box(service.start_match("table2").await.unwrap())
            })
        })
    });
}

criterion_group!(
    benches,
    bench_join_and_start,
    bench_rejected_join,
    bench_contended_joins,
    bench_service_round
);
criterion_main!(benches);
