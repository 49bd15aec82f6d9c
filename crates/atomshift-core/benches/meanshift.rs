//! Mode-seeking throughput on a synthetic three-blob cloud

use atomshift_core::{BandwidthEstimator, MeanShiftOptions, ModeSeekingClusterer};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use rand::prelude::*;
use rand_distr::Normal;

fn cloud(n_per_blob: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(1234);
    let normal = Normal::new(0.0, 1.5).unwrap();
    let centers = [[0.0, 0.0, 0.0], [40.0, 0.0, 0.0], [0.0, 40.0, 0.0]];

    let mut coords = Array2::zeros((n_per_blob * centers.len(), 3));
    let mut row = 0;
    for center in centers {
        for _ in 0..n_per_blob {
            for d in 0..3 {
                coords[(row, d)] = center[d] + rng.sample(normal);
            }
            row += 1;
        }
    }
    coords
}

fn bench_meanshift(c: &mut Criterion) {
    let mut group = c.benchmark_group("meanshift");
    for n_per_blob in [50usize, 150] {
        let coords = cloud(n_per_blob);
        let bandwidth = BandwidthEstimator::new(0.3)
            .unwrap()
            .estimate(coords.view())
            .unwrap();
        let clusterer = ModeSeekingClusterer::new(bandwidth, MeanShiftOptions::default()).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(n_per_blob * 3),
            &coords,
            |b, coords| b.iter(|| clusterer.cluster(coords.view()).unwrap()),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_meanshift);
criterion_main!(benches);
