use criterion::{measurement::WallTime, BenchmarkGroup, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use channel_histograms::{
    config::ProductLabels, BinCountPolicy, HistogramEngine, PolicyConfig, RangePolicy,
    SampleBatch,
};

const CHANNELS: u64 = 32;
const SAMPLES_PER_CYCLE: usize = 1024;
const CYCLES: usize = 8;

pub fn cycles(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("cycles");
    group.throughput(criterion::Throughput::Elements((SAMPLES_PER_CYCLE * CYCLES) as u64));

    bench_policy(
        &mut group,
        "fixed",
        PolicyConfig::new(
            RangePolicy::Fixed {
                min: 0.0,
                max: 10000.0,
            },
            BinCountPolicy::Fixed(100),
            "Integral",
        ),
    );
    bench_policy(
        &mut group,
        "relative",
        PolicyConfig::new(
            RangePolicy::RelativeToFirstSample {
                offset_min: -1000.0,
                offset_max: 1000.0,
            },
            BinCountPolicy::Fixed(100),
            "Integral",
        ),
    );
    bench_policy(&mut group, "auto", PolicyConfig::default());
}

fn bench_policy(group: &mut BenchmarkGroup<'_, WallTime>, name: &str, policy: PolicyConfig) {
    let mut rng = StdRng::seed_from_u64(13);
    let batch: SampleBatch = (0..SAMPLES_PER_CYCLE)
        .map(|_| (rng.gen_range(0..CHANNELS), rng.gen_range(0.0..10000.0)))
        .collect();

    group.bench_function(name, |bencher| {
        // Auto policies retain every value, so each measurement gets a fresh engine.
        bencher.iter_batched_ref(
            || {
                HistogramEngine::with_policy(
                    ProductLabels {
                        input: "in".to_string(),
                        output: "out".to_string(),
                    },
                    policy.clone(),
                )
            },
            |engine| {
                for _ in 0..CYCLES {
                    engine.process_batch(&batch);
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion::criterion_group!(benches, cycles);
