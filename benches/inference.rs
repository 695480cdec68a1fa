// Measures single-person latency and batch throughput of the risk engine
// across hidden-layer widths.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vitalrisk::params::{INPUT_FEATURES, OUTPUT_CLASSES};
use vitalrisk::vitals::ExamplePreset;
use vitalrisk::{Gender, RawVitals, RiskInferenceEngine};

/// Hidden-layer widths to compare.
const HIDDEN_UNITS: [usize; 4] = [2, 16, 64, 256];
/// People per batch in the throughput benchmark.
const BATCH_SIZE: usize = 10_000;

fn random_engine(rng: &mut StdRng, hidden: usize) -> RiskInferenceEngine {
    let w = Array2::from_shape_fn((INPUT_FEATURES, hidden), |_| rng.gen_range(-1.0..1.0));
    let b = Array1::from_shape_fn(hidden, |_| rng.gen_range(-1.0..1.0));
    let beta = Array2::from_shape_fn((hidden, OUTPUT_CLASSES), |_| rng.gen_range(-1.0..1.0));
    RiskInferenceEngine::from_arrays(w, b, beta).expect("valid benchmark parameters")
}

fn random_cohort(rng: &mut StdRng, size: usize) -> Vec<RawVitals> {
    (0..size)
        .map(|_| {
            RawVitals {
                age: rng.gen_range(18.0..90.0),
                gender: if rng.gen_bool(0.5) {
                    Gender::Male
                } else {
                    Gender::Female
                },
                weight: rng.gen_range(45.0..120.0),
                height: rng.gen_range(150.0..195.0),
                temperature: rng.gen_range(36.0..38.0),
                heart_rate: rng.gen_range(50.0..120.0),
                respiratory_rate: rng.gen_range(12.0..24.0),
                oxygen_saturation: rng.gen_range(90.0..100.0),
                bmi: 0.0,
            }
            .with_derived_bmi()
        })
        .collect()
}

fn bench_single(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let vitals = ExamplePreset::High.form().to_raw_vitals();
    let mut group = c.benchmark_group("infer_single");

    for hidden in HIDDEN_UNITS {
        let engine = random_engine(&mut rng, hidden);
        group.bench_with_input(BenchmarkId::from_parameter(hidden), &engine, |b, engine| {
            b.iter(|| engine.infer(black_box(&vitals)))
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let cohort = random_cohort(&mut rng, BATCH_SIZE);
    let mut group = c.benchmark_group("infer_batch");
    group.throughput(Throughput::Elements(BATCH_SIZE as u64));
    group.sample_size(20);

    for hidden in HIDDEN_UNITS {
        let engine = random_engine(&mut rng, hidden);
        group.bench_with_input(BenchmarkId::from_parameter(hidden), &engine, |b, engine| {
            b.iter(|| engine.infer_batch(black_box(&cohort)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single, bench_batch);
criterion_main!(benches);
