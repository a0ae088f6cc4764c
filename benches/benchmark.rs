// Performance benchmarks for mixed-type distance matrices
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mixdist::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

const GRADES: [&str; 4] = ["low", "mid", "high", "top"];
const COLORS: [&str; 5] = ["red", "green", "blue", "black", "white"];

fn generate_dataset(n: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(42);
    let rows = (0..n)
        .map(|_| {
            let income = if rng.random_bool(0.02) {
                Value::Number(rng.random_range(1e5..1e6))
            } else if rng.random_bool(0.05) {
                Value::Missing
            } else {
                Value::Number(rng.random_range(0.0..100.0))
            };
            vec![
                income,
                Value::Number(rng.random_range(-1.0..1.0)),
                Value::from(*COLORS.choose(&mut rng).unwrap_or(&"red")),
                Value::from(GRADES[rng.random_range(0..GRADES.len())]),
                Value::from(rng.random_bool(0.3)),
            ]
        })
        .collect();

    Dataset::new(
        ["income", "score", "color", "grade", "flag"].iter().map(|s| s.to_string()).collect(),
        rows,
    )
    .unwrap()
}

fn kinds() -> Vec<ColumnKind> {
    vec![
        ColumnKind::Continuous,
        ColumnKind::Continuous,
        ColumnKind::Nominal,
        ColumnKind::ordinal(GRADES),
        ColumnKind::Binary,
    ]
}

fn benchmark_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");

    for size in [1000, 10000].iter() {
        let dataset = generate_dataset(*size);
        let descriptors = validate_schema(&dataset, &kinds()).unwrap();
        let config = DistanceConfig::robust(3.0);
        group.bench_with_input(BenchmarkId::new("robust_winsorize", size), size, |b, _| {
            b.iter(|| black_box(preprocess(&dataset, &descriptors, &config).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix");
    group.sample_size(10);

    for size in [200, 1000].iter() {
        let dataset = generate_dataset(*size);
        for (name, config) in [
            ("gower", DistanceConfig::gower()),
            ("robust_mean", DistanceConfig::robust(3.0)),
            (
                "robust_euclidean",
                DistanceConfig::robust(3.0).with_combination(Combination::WeightedEuclidean),
            ),
        ] {
            let engine = MixedDistance::new(&dataset, &kinds(), config).unwrap();
            group.bench_with_input(BenchmarkId::new(name, size), size, |b, _| {
                b.iter(|| black_box(engine.build().unwrap()));
            });
        }
    }

    group.finish();
}

fn benchmark_parallel_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_blocks");
    group.sample_size(10);

    let dataset = generate_dataset(2000);
    let engine = MixedDistance::new(&dataset, &kinds(), DistanceConfig::robust(3.0)).unwrap();

    for threads in [1, 4].iter() {
        group.bench_with_input(BenchmarkId::new("threads", threads), threads, |b, &threads| {
            b.iter(|| {
                black_box(
                    engine
                        .builder()
                        .block_rows(128)
                        .parallelism(Parallelism::from_threads(threads))
                        .build()
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_preprocess, benchmark_matrix, benchmark_parallel_blocks);
criterion_main!(benches);
