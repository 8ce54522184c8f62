use cloudfeat_algorithms::{NeighborhoodStatistics, ScalarSource, Stat};
use cloudfeat_core::{NullProgress, Octree, Point3d, ScalarField};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{rngs::StdRng, Rng, SeedableRng};

const POINT_COUNT: usize = 20_000;
const SCALES: [f64; 3] = [0.25, 0.5, 1.0];

fn neighborhood_statistics(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let points: Vec<Point3d> = (0..POINT_COUNT)
        .map(|_| Point3d::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0), rng.gen_range(0.0..1.0)))
        .collect();
    let field = ScalarField::from_values("intensity", (0..POINT_COUNT).map(|_| rng.gen_range(0.0..255.0)).collect());
    let source = ScalarSource::Direct(&field);
    let octree = Octree::build(&points);

    let mut g = c.benchmark_group("neighborhood statistics");
    g.sample_size(10);

    for stat in [Stat::Mean, Stat::Mode, Stat::Range] {
        for scale in SCALES {
            let stats = NeighborhoodStatistics::new(&octree, &source, scale, stat).unwrap();
            g.bench_with_input(BenchmarkId::new(stat.as_str(), scale), &stats, |b, stats| {
                let mut out = vec![0.0; POINT_COUNT];
                b.iter(|| stats.compute_into(std::hint::black_box(&points), &mut out, &mut NullProgress));
            });
        }
    }

    g.finish();
}

criterion_group!(benches, neighborhood_statistics);
criterion_main!(benches);
