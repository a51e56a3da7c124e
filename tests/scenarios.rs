//! End-to-end combat scenarios through the public API.

use ordnance::combat::events::CombatEventData;
use ordnance::combat::target::Collider;
use ordnance::combat::weapon::{WeaponFamily, WeaponSpec, FRAG_GRENADE, INCENDIARY, SHOTGUN};
use ordnance::combat::{CombatEvent, DeathState, ImpactRegistry};
use ordnance::{
    Arena, CombatConfig, CombatSimulation, EventLog, NoEffects, Target, TargetId, Vec3, WeaponId,
    WeaponTable, DEFAULT_TICK_RATE,
};

const DT: f32 = 1.0 / DEFAULT_TICK_RATE as f32;

fn run_frames(sim: &mut CombatSimulation, arena: &mut Arena, fx: &mut EventLog, frames: u32) {
    for _ in 0..frames {
        let now = (sim.frame() + 1) as f64 * DT as f64;
        fx.set_frame(sim.frame() + 1);
        sim.update(DT, now, arena, fx);
    }
}

fn single_weapon(spec: WeaponSpec) -> WeaponTable {
    let mut table = WeaponTable::new();
    table.insert(spec).unwrap();
    table
}

#[test]
fn bullet_kills_weak_target_and_frees_slot() {
    let table = single_weapon(
        WeaponSpec::new(WeaponId(1), "Carbine", WeaponFamily::Ballistic, 50.0).with_ballistics(90.0, 1.0),
    );
    let mut sim = CombatSimulation::with_standard_impacts(CombatConfig::default(), table);
    let mut arena = sim.new_arena();
    arena.add_target(Target::new(TargetId(1), Vec3::flat(1.0, 0.0), 30.0));
    let mut fx = EventLog::new();

    assert_eq!(sim.fire_bullet(Vec3::ZERO, Vec3::X, WeaponId(1), &mut fx), 1);
    let report = sim.update(DT, DT as f64, &mut arena, &mut fx);

    assert!(arena.targets[0].health <= 0.0);
    assert_eq!(report.released, 1);
    assert_eq!(sim.pool().active_count(), 0);
    assert_eq!(sim.pool().capacity(), 1);
    // Overkill is not tracked
    assert_eq!(fx.damage_total, 30.0);
    // Bullets leave death handling to the caller
    assert_eq!(arena.targets[0].death_state, DeathState::Alive);
}

#[test]
fn full_charge_throw_lands_at_max_distance() {
    let table = single_weapon(
        WeaponSpec::new(WeaponId(10), "Dud", WeaponFamily::Explosive, 0.0).with_throw(5.0, 30.0, 4.0),
    );
    // No impact behaviors: only the flight is under test
    let mut sim = CombatSimulation::new(CombatConfig::default(), table, ImpactRegistry::empty());
    let mut arena = sim.new_arena();
    let mut fx = EventLog::new();

    let handle = sim.fire_throwable(Vec3::new(0.0, 1.5, 0.0), Vec3::X, WeaponId(10), 1.0, &mut fx).unwrap();
    let landing = sim.pool().get(handle).unwrap().landing_point.unwrap();
    assert_eq!(landing.distance_xz(Vec3::ZERO), 30.0);

    let marker_radius = fx.data().find_map(|d| match d {
        CombatEventData::MarkerShown { radius, .. } => Some(*radius),
        _ => None,
    });
    assert_eq!(marker_radius, Some(4.0));

    let mut last_position = Vec3::ZERO;
    for _ in 0..(2 * DEFAULT_TICK_RATE) {
        if let Some(p) = sim.pool().get(handle).filter(|p| p.active) {
            last_position = p.position;
        }
        run_frames(&mut sim, &mut arena, &mut fx, 1);
    }

    assert_eq!(sim.pool().active_count(), 0);
    assert!((last_position.x - 30.0).abs() < 1.0, "last airborne position {}", last_position);
    assert!(fx.opacity_updates > 0);
}

#[test]
fn large_obstacle_is_found_from_its_center() {
    let mut arena = Arena::new(15.0);
    let id = arena.add_obstacle(Vec3::new(100.0, 0.0, -70.0), Collider::Sphere { radius: 35.0 });

    let mut found = Vec::new();
    arena.query_obstacles(Vec3::new(100.0, 0.0, -70.0), 1.0, &mut found);
    assert_eq!(found, vec![id]);

    // Still found near its rim, several cells away from the center
    arena.query_obstacles(Vec3::new(130.0, 0.0, -70.0), 1.0, &mut found);
    assert_eq!(found, vec![id]);
}

#[test]
fn obstacle_shields_target_behind_it() {
    let mut sim = CombatSimulation::with_standard_impacts(CombatConfig::default(), WeaponTable::standard());
    let mut arena = sim.new_arena();
    arena.add_obstacle(Vec3::flat(10.0, 0.0), Collider::Box { half_extents: Vec3::new(2.0, 4.0, 2.0) });
    arena.add_target(Target::new(TargetId(1), Vec3::flat(20.0, 0.0), 100.0));
    let mut fx = EventLog::new();

    sim.fire_bullet(Vec3::ZERO, Vec3::X, WeaponId(2), &mut fx);
    run_frames(&mut sim, &mut arena, &mut fx, 30);

    assert_eq!(arena.targets[0].health, 100.0);
    assert_eq!(sim.pool().active_count(), 0);
    assert_eq!(fx.count(|d| matches!(d, CombatEventData::ProjectileDetached { .. })), 1);
}

#[test]
fn clear_all_releases_everything() {
    let mut sim = CombatSimulation::with_standard_impacts(CombatConfig::default(), WeaponTable::standard());
    let mut arena = sim.new_arena();
    let mut fx = EventLog::new();

    sim.fire_throwable(Vec3::new(0.0, 1.5, 0.0), Vec3::X, INCENDIARY, 0.0, &mut fx);
    run_frames(&mut sim, &mut arena, &mut fx, DEFAULT_TICK_RATE + 5);
    assert_eq!(sim.zones().len(), 1);

    sim.fire_bullet(Vec3::ZERO, Vec3::Z, SHOTGUN, &mut fx);
    sim.fire_throwable(Vec3::new(0.0, 1.5, 0.0), Vec3::Z, FRAG_GRENADE, 1.0, &mut fx);
    let capacity = sim.pool().capacity();

    sim.clear_all(&mut fx);
    assert_eq!(sim.pool().active_count(), 0);
    assert_eq!(sim.pool().capacity(), capacity);
    assert!(sim.zones().is_empty());

    // Nothing left to do
    let report = sim.update(DT, 10.0, &mut arena, &mut NoEffects);
    assert_eq!(report.bullets_stepped, 0);
    assert_eq!(report.zone_ticks, 0);
}

#[test]
fn bundled_weapon_file_matches_standard_arsenal() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/weapons.json");
    let loaded = WeaponTable::load(path).unwrap();
    let standard = WeaponTable::standard();

    assert_eq!(loaded.len(), standard.len());
    for spec in standard.iter() {
        assert_eq!(loaded.get(spec.id), Some(spec), "mismatch for {}", spec.name);
    }
}

#[test]
fn replay_produces_identical_events_and_hash() {
    let script = || {
        let mut sim = CombatSimulation::with_standard_impacts(CombatConfig::default(), WeaponTable::standard());
        let mut arena = sim.new_arena();
        for i in 0..10 {
            arena.add_target(Target::new(TargetId(i), Vec3::flat(12.0 + i as f32 * 2.0, (i % 3) as f32), 80.0));
        }
        let mut fx = EventLog::new();

        sim.fire_bullet(Vec3::ZERO, Vec3::X, SHOTGUN, &mut fx);
        sim.fire_throwable(Vec3::new(0.0, 1.5, 0.0), Vec3::X, FRAG_GRENADE, 0.3, &mut fx);
        run_frames(&mut sim, &mut arena, &mut fx, 90);

        (sim.compute_hash(&arena), fx.take_events())
    };

    let (hash_a, events_a): (_, Vec<CombatEvent>) = script();
    let (hash_b, events_b) = script();
    assert_eq!(hash_a, hash_b);
    assert_eq!(events_a, events_b);
    assert!(!events_a.is_empty());
}
