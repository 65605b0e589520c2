use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringhtm_rs::{mpsc, spsc, Config, LockStrategy};
use std::thread;

const MSG_PER_PRODUCER: u64 = 1_000_000; // 1M messages per producer
const CAPACITY: usize = 1 << 16;

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(MSG_PER_PRODUCER));

    group.bench_function("single_producer_consumer", |b| {
        b.iter(|| {
            let (mut tx, mut rx) = spsc::channel::<u32>(Config::new(CAPACITY)).unwrap();

            let producer_handle = thread::spawn(move || {
                for i in 0..MSG_PER_PRODUCER {
                    tx.push(i as u32);
                }
            });

            for _ in 0..MSG_PER_PRODUCER {
                black_box(rx.pop());
            }

            producer_handle.join().unwrap();
        });
    });

    group.finish();
}

fn bench_mpsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpsc");

    for strategy in [LockStrategy::Flag, LockStrategy::Spin, LockStrategy::Hybrid] {
        for num_producers in [1usize, 2, 4] {
            let total_msgs = MSG_PER_PRODUCER * num_producers as u64;
            group.throughput(Throughput::Elements(total_msgs));

            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), format!("{}P_1C", num_producers)),
                &num_producers,
                |b, &n| {
                    b.iter(|| {
                        let config = Config::new(CAPACITY).with_lock(strategy);
                        let (tx, mut rx) = mpsc::channel::<u32>(config).unwrap();

                        // Spawn producer threads
                        let producer_handles: Vec<_> = (0..n)
                            .map(|_| {
                                let tx = tx.clone();
                                thread::spawn(move || {
                                    for i in 0..MSG_PER_PRODUCER {
                                        tx.push(i as u32);
                                    }
                                })
                            })
                            .collect();

                        for _ in 0..total_msgs {
                            black_box(rx.pop());
                        }

                        for handle in producer_handles {
                            handle.join().unwrap();
                        }
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_spsc, bench_mpsc
}
criterion_main!(benches);
