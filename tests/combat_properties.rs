//! Property tests for the combat core.

use proptest::prelude::*;

use ordnance::combat::arena::QueryScratch;
use ordnance::combat::continuous::fire_chain;
use ordnance::combat::impact::{explosive_impact, ImpactContext};
use ordnance::combat::spatial::{Footprint, SpatialIndex};
use ordnance::combat::weapon::{WeaponFamily, WeaponSpec, ARC_PROJECTOR, FRAG_GRENADE};
use ordnance::combat::zone::ZoneField;
use ordnance::{
    Arena, CombatConfig, CombatSimulation, NoEffects, Target, TargetId, Vec3, WeaponId, WeaponTable,
};

fn coord() -> impl Strategy<Value = f32> {
    -200.0f32..200.0
}

proptest! {
    /// Every entry whose footprint overlaps the query circle is returned, and
    /// no key is returned twice.
    #[test]
    fn index_query_is_complete_and_unique(
        entries in prop::collection::vec((coord(), coord(), 0.0f32..40.0), 1..60),
        center in (coord(), coord()),
        radius in 0.0f32..60.0,
        cell_size in 1.0f32..30.0,
    ) {
        let mut index = SpatialIndex::new(cell_size);
        for (key, &(x, z, r)) in entries.iter().enumerate() {
            index.insert_at(key, Vec3::flat(x, z), Footprint::Radius(r));
        }

        let center = Vec3::flat(center.0, center.1);
        let found = index.query_radius(center, radius);

        let mut sorted = found.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), found.len(), "duplicate keys returned");

        // Anything whose footprint truly overlaps the query circle must be found
        for (key, &(x, z, r)) in entries.iter().enumerate() {
            let reach = radius + r;
            if Vec3::flat(x, z).distance_squared_xz(center) < reach * reach * 0.99 {
                prop_assert!(found.contains(&key), "missed key {}", key);
            }
        }
    }

    /// Explosive damage lands iff the target's body overlaps the blast.
    #[test]
    fn explosive_inclusion_matches_body_radius(
        offsets in prop::collection::vec((coord(), coord(), 0.5f32..2.5), 1..20),
        radius in 1.0f32..15.0,
    ) {
        let mut arena = Arena::new(15.0);
        for (i, &(x, z, scale)) in offsets.iter().enumerate() {
            let position = Vec3::flat(x * 0.1, z * 0.1);
            arena.add_target(Target::new(TargetId(i as u32), position, 1000.0).with_scale(scale, 1.0));
        }
        arena.reindex_targets();

        let table = WeaponTable::standard();
        let frag = table.get(FRAG_GRENADE).unwrap();
        let config = CombatConfig::default();
        let mut zones = ZoneField::new();
        let mut scratch = QueryScratch::default();
        let mut fx = NoEffects;
        let mut ctx = ImpactContext {
            arena: &mut arena,
            zones: &mut zones,
            config: &config,
            weapon: frag,
            fx: &mut fx,
            scratch: &mut scratch,
        };
        explosive_impact(&mut ctx, Vec3::ZERO, radius, 10.0);

        for target in &arena.targets {
            let inside = target.position.distance_xz(Vec3::ZERO) < radius + target.body_radius();
            let damaged = target.health < 1000.0;
            prop_assert_eq!(inside, damaged, "target at {} scale {}", target.position, target.width_scale);
        }
    }

    /// Chain damage sums to the weapon damage and never exceeds the cap.
    #[test]
    fn chain_conserves_damage(
        positions in prop::collection::vec((0.0f32..40.0, -10.0f32..10.0), 1..15),
    ) {
        let mut arena = Arena::new(15.0);
        for (i, &(x, z)) in positions.iter().enumerate() {
            arena.add_target(Target::new(TargetId(i as u32), Vec3::flat(x, z), 10_000.0));
        }
        arena.reindex_targets();

        let table = WeaponTable::standard();
        let arc = table.get(ARC_PROJECTOR).unwrap();
        let config = CombatConfig::default();

        let n = fire_chain(arc, Vec3::ZERO, Vec3::X, &mut arena, &config, &mut QueryScratch::default(), &mut NoEffects);
        prop_assert!(n <= config.max_chain);

        let dealt: f32 = arena.targets.iter().map(|t| 10_000.0 - t.health).sum();
        if n == 0 {
            prop_assert_eq!(dealt, 0.0);
        } else {
            prop_assert!((dealt - arc.damage).abs() < 1e-2, "dealt {} over {} links", dealt, n);
            let damaged = arena.targets.iter().filter(|t| t.health < 10_000.0).count();
            prop_assert_eq!(damaged, n);
        }
    }

    /// A piercing bullet deals D, D·f, D·f², … and stops on the hit that
    /// drops its damage below the floor.
    #[test]
    fn piercing_damage_decays_geometrically(
        damage in 20.0f32..200.0,
        decay in 0.3f32..0.95,
    ) {
        let mut table = WeaponTable::new();
        let spec = WeaponSpec::new(WeaponId(7), "Piercer", WeaponFamily::Ballistic, damage)
            .with_ballistics(600.0, 2.0)
            .with_pierce(decay);
        table.insert(spec).unwrap();

        let config = CombatConfig::default();
        let floor = config.pierce_damage_floor;
        let mut sim = CombatSimulation::with_standard_impacts(config, table);
        let mut arena = sim.new_arena();
        for i in 0..12 {
            arena.add_target(Target::new(TargetId(i), Vec3::flat(5.0 + i as f32 * 4.0, 0.0), 10_000.0));
        }

        sim.fire_bullet(Vec3::ZERO, Vec3::X, WeaponId(7), &mut NoEffects);
        for frame in 1..=30 {
            sim.update(1.0 / 60.0, frame as f64 / 60.0, &mut arena, &mut NoEffects);
        }

        let mut expected = damage;
        let mut hits = 0;
        let mut spent = false;
        for target in &arena.targets {
            let dealt = 10_000.0 - target.health;
            if dealt == 0.0 {
                break;
            }
            prop_assert!((dealt - expected).abs() < 1e-2, "hit {} dealt {} expected {}", hits, dealt, expected);
            hits += 1;
            expected *= decay;
            if expected < floor {
                spent = true;
                break;
            }
        }

        // Every later target is untouched
        for target in &arena.targets[hits..] {
            prop_assert_eq!(target.health, 10_000.0);
        }
        if spent {
            prop_assert_eq!(sim.pool().active_count(), 0);
        } else {
            prop_assert_eq!(hits, arena.targets.len());
        }
    }
}
