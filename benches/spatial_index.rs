use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use ordnance::combat::spatial::{Footprint, SpatialIndex, DEFAULT_CELL_SIZE};
use ordnance::combat::weapon::{RIFLE, SHOTGUN};
use ordnance::{CombatConfig, CombatSimulation, NoEffects, Target, TargetId, Vec3, WeaponTable};

fn scattered(count: usize, extent: f32, seed: u64) -> Vec<(Vec3, f32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let position = Vec3::flat(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent));
            (position, rng.gen_range(0.5..3.0))
        })
        .collect()
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_index");

    for &count in &[500usize, 2000, 8000] {
        let entries = scattered(count, 400.0, 0xBEEF);

        group.bench_function(format!("rebuild_{}", count), |b| {
            let mut index = SpatialIndex::new(DEFAULT_CELL_SIZE);
            b.iter(|| {
                index.clear();
                for (key, &(position, radius)) in entries.iter().enumerate() {
                    index.insert_at(key, position, Footprint::Radius(radius));
                }
                black_box(index.len())
            })
        });

        let mut index = SpatialIndex::new(DEFAULT_CELL_SIZE);
        for (key, &(position, radius)) in entries.iter().enumerate() {
            index.insert_at(key, position, Footprint::Radius(radius));
        }
        let probes = scattered(256, 400.0, 0xF00D);

        group.bench_function(format!("query_r8_{}", count), |b| {
            let mut out = Vec::new();
            b.iter(|| {
                let mut total = 0;
                for &(center, _) in &probes {
                    index.query_radius_into(center, 8.0, &mut out);
                    total += out.len();
                }
                black_box(total)
            })
        });
    }

    group.finish();
}

fn bench_bullets(c: &mut Criterion) {
    let mut group = c.benchmark_group("ballistics");
    let targets = scattered(1000, 150.0, 7);

    group.bench_function("volley_1000_targets", |b| {
        b.iter_batched(
            || {
                let sim = CombatSimulation::with_standard_impacts(CombatConfig::default(), WeaponTable::standard());
                let mut arena = sim.new_arena();
                for (i, &(position, _)) in targets.iter().enumerate() {
                    arena.add_target(Target::new(TargetId(i as u32), position, 1_000.0));
                }
                (sim, arena)
            },
            |(mut sim, mut arena)| {
                for angle in 0..32 {
                    let aim = Vec3::X.rotate_y(angle as f32 * 0.2);
                    sim.fire_bullet(Vec3::ZERO, aim, RIFLE, &mut NoEffects);
                    sim.fire_bullet(Vec3::ZERO, aim, SHOTGUN, &mut NoEffects);
                }
                for frame in 1..=30 {
                    sim.update(1.0 / 60.0, frame as f64 / 60.0, &mut arena, &mut NoEffects);
                }
                black_box(sim.compute_hash(&arena))
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_index, bench_bullets);
criterion_main!(benches);
