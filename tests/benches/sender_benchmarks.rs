//! # Concurrent Sender Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | Registry | register + take, no engine |
//! | Manual queue | send → respond → drain, single thread |
//! | Owner queue | send → respond from engine threads → barrier |

use concurrent_sender::domain::handlers::fail_bare;
use concurrent_sender::{
    ConcurrentSender, Handlers, InMemoryEngine, ManualQueue, PendingRegistry, RequestId,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::seq::SliceRandom;
use sender_tests::fixtures::{get_history, history_reply, OwnedSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// Registry
// ============================================================================

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    for size in [100u32, 1_000, 10_000] {
        let mut ids: Vec<RequestId> = (1..=size).map(RequestId).collect();
        ids.shuffle(&mut rand::thread_rng());

        group.throughput(Throughput::Elements(u64::from(size)));
        group.bench_with_input(BenchmarkId::new("register_take", size), &ids, |b, ids| {
            b.iter(|| {
                let mut registry = PendingRegistry::new();
                for id in ids {
                    registry.register(
                        *id,
                        "bench.method",
                        Handlers {
                            done: None,
                            fail: Some(fail_bare(|| {})),
                        },
                    );
                }
                for id in ids {
                    black_box(registry.take(*id).is_ok());
                }
            })
        });
    }

    group.finish();
}

// ============================================================================
// Manual queue round trip
// ============================================================================

fn bench_manual_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("manual_queue");
    let reply = history_reply(1, 0, 20);

    group.bench_function("send_respond_drain", |b| {
        let queue = ManualQueue::new();
        let engine = Arc::new(InMemoryEngine::new());
        let mut sender = ConcurrentSender::new(queue.bridge(), engine.clone());

        b.iter(|| {
            let id = sender
                .begin_request(get_history(1, 0, 20))
                .done_value(|page| {
                    black_box(page.message_ids.len());
                })
                .send();
            engine.respond(id, reply.clone());
            black_box(queue.drain(&mut sender))
        })
    });

    group.finish();
}

// ============================================================================
// Owner queue with foreign engine threads
// ============================================================================

fn bench_owner_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("owner_queue");
    group.measurement_time(Duration::from_secs(10));

    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let reply = history_reply(2, 0, 20);

    for batch in [16u64, 256] {
        group.throughput(Throughput::Elements(batch));
        group.bench_with_input(BenchmarkId::new("batch", batch), &batch, |b, &batch| {
            let harness = runtime.block_on(async { OwnedSender::spawn("bench") });

            b.iter(|| {
                runtime.block_on(async {
                    let ids = harness
                        .owner
                        .call(move |sender| {
                            (0..batch)
                                .map(|peer| {
                                    sender
                                        .begin_request(get_history(peer, 0, 20))
                                        .done_id(|id| {
                                            black_box(id);
                                        })
                                        .send()
                                })
                                .collect::<Vec<_>>()
                        })
                        .await
                        .expect("owner alive");

                    let workers: Vec<_> = ids
                        .chunks(ids.len().div_ceil(4))
                        .map(|chunk| {
                            let engine = harness.engine.clone();
                            let chunk = chunk.to_vec();
                            let reply = reply.clone();
                            thread::spawn(move || {
                                for id in chunk {
                                    engine.respond(id, reply.clone());
                                }
                            })
                        })
                        .collect();
                    for worker in workers {
                        worker.join().expect("engine thread");
                    }

                    harness.settle().await;
                })
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_registry,
    bench_manual_round_trip,
    bench_owner_queue
);
criterion_main!(benches);
