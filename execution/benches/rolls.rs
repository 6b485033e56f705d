use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fairstake_execution::{compute_roll, demo_session, EngineConfig, Entropy, ProvablyFair};

fn rolls(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolls");
    let seed = [7u8; 32];
    for nonce in [0u64, 1_000, 1_000_000] {
        group.bench_function(BenchmarkId::new("compute_roll", nonce), |b| {
            b.iter(|| black_box(compute_roll(&seed, "client", nonce)))
        });
    }

    group.bench_function("provably_fair_roll", |b| {
        let mut fair = ProvablyFair::new(1, 500);
        b.iter(|| black_box(fair.roll()))
    });
    group.finish();
}

fn rounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("rounds");
    for rounds in [1u64, 10, 100] {
        group.bench_function(BenchmarkId::new("demo_table", rounds), |b| {
            b.iter_batched(
                || demo_session(EngineConfig::default(), Entropy::Replay(42)).expect("demo session"),
                |mut session| {
                    for _ in 0..rounds {
                        black_box(session.advance_round());
                    }
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, rolls, rounds);
criterion_main!(benches);
