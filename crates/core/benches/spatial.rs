use criterion::{Criterion, criterion_group, criterion_main};
use outland::SpatialGrid;
use outland::Vector2;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::hint::black_box;

fn populated_grid(count: usize, extent: f32) -> SpatialGrid<u32> {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut grid = SpatialGrid::new(outland::spatial::DEFAULT_CELL_SIZE);
    for id in 0..count as u32 {
        let position = Vector2(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent));
        grid.insert(position, id);
    }
    grid
}

fn bench_insert(c: &mut Criterion) {
    let mut g = c.benchmark_group("insert");
    let mut rng = SmallRng::seed_from_u64(7);
    let positions: Vec<Vector2> = (0..1000)
        .map(|_| Vector2(rng.gen_range(-200.0..200.0), rng.gen_range(-200.0..200.0)))
        .collect();

    g.bench_function("insert_1000_players", |b| {
        b.iter(|| {
            let mut grid = SpatialGrid::new(outland::spatial::DEFAULT_CELL_SIZE);
            for (id, &position) in positions.iter().enumerate() {
                grid.insert(black_box(position), id as u32);
            }
            grid
        })
    });
    g.finish();
}

fn bench_nearby(c: &mut Criterion) {
    let mut g = c.benchmark_group("nearby");

    let sparse = populated_grid(200, 200.0);
    g.bench_function("nearby_melee_radius_sparse", |b| {
        b.iter(|| black_box(sparse.nearby(black_box(Vector2(0.0, 0.0)), 2.5)))
    });

    let dense = populated_grid(2000, 100.0);
    g.bench_function("nearby_detection_radius_dense", |b| {
        b.iter(|| black_box(dense.nearby(black_box(Vector2(0.0, 0.0)), 30.0)))
    });

    g.finish();
}

criterion_group!(benches, bench_insert, bench_nearby);
criterion_main!(benches);
