//! Continuous Weapons
//!
//! Weapons that act every tick while the trigger is held instead of firing
//! pooled projectiles.

use crate::core::rng::DeterministicRng;
use crate::core::vec3::Vec3;
use crate::combat::arena::{Arena, QueryScratch};
use crate::combat::effects::{ParticleKind, SoundCue, StatKind, TextColor, WorldEffects};
use crate::combat::simulation::CombatConfig;
use crate::combat::target::StatusTimers;
use crate::combat::weapon::WeaponSpec;

const ARC_PARTICLES: u32 = 3;

/// Horizontal aim, or `None` for a zero vector.
#[inline]
fn aim_of(direction: Vec3) -> Option<Vec3> {
    let aim = direction.horizontal().normalize();
    (aim != Vec3::ZERO).then_some(aim)
}

/// Is `position` inside the cone of half-angle `acos(cone_cos)` around `aim`?
/// A target standing on the muzzle counts as inside.
#[inline]
fn in_cone(origin: Vec3, aim: Vec3, position: Vec3, cone_cos: f32) -> bool {
    let to_target = (position - origin).horizontal().normalize();
    to_target == Vec3::ZERO || aim.dot(to_target) >= cone_cos
}

// =============================================================================
// FLAME
// =============================================================================

/// One tick of a cone-flame weapon.
///
/// Every alive target in range and inside the cone is set burning. Each of
/// them takes the weapon damage with probability `dt / fire_rate`.
///
/// Returns the number of targets inside the cone.
#[allow(clippy::too_many_arguments)]
pub fn fire_flame(
    weapon: &WeaponSpec,
    origin: Vec3,
    direction: Vec3,
    dt: f32,
    arena: &mut Arena,
    config: &CombatConfig,
    rng: &mut DeterministicRng,
    scratch: &mut QueryScratch,
    fx: &mut dyn WorldEffects,
) -> usize {
    let Some(aim) = aim_of(direction) else {
        return 0;
    };

    fx.spawn_particles(origin + aim * (weapon.range * 0.5), ParticleKind::Flame, config.flame_particles);

    let chance = (dt / weapon.fire_rate).clamp(0.0, 1.0);
    arena.query_targets(origin, weapon.range, &mut scratch.targets);
    let range_sq = weapon.range * weapon.range;

    let mut affected = 0;
    let mut damaged = false;
    for &slot in &scratch.targets {
        let Some(target) = arena.targets.get_mut(slot) else {
            continue;
        };
        if !target.is_alive()
            || target.position.distance_squared_xz(origin) > range_sq
            || !in_cone(origin, aim, target.position, config.flame_cone_cos)
        {
            continue;
        }
        affected += 1;

        StatusTimers::refresh(&mut target.status.burning, config.burn_duration);
        if rng.chance(chance) {
            let tracked = target.apply_damage(weapon.damage);
            fx.track_statistic(StatKind::Damage, tracked, target.is_boss);
            fx.track_statistic(StatKind::Hit, 1.0, target.is_boss);
            fx.spawn_damage_text(target.position, weapon.damage, TextColor::Fire);
            damaged = true;
        }
    }

    if damaged {
        fx.play_sound(SoundCue::Flame);
    }
    affected
}

// =============================================================================
// CHAIN
// =============================================================================

/// One discharge of a chain-electrical weapon.
///
/// Picks the nearest alive target inside the aim cone, then hops from the
/// chain tail to the nearest unchained target within `chain_radius` until
/// `max_chain` members. Damage and stun are split evenly across the chain.
///
/// Returns the chain length. With no first target a beam is drawn to full
/// range and nothing is damaged.
pub fn fire_chain(
    weapon: &WeaponSpec,
    origin: Vec3,
    direction: Vec3,
    arena: &mut Arena,
    config: &CombatConfig,
    scratch: &mut QueryScratch,
    fx: &mut dyn WorldEffects,
) -> usize {
    let Some(aim) = aim_of(direction) else {
        return 0;
    };

    scratch.chain.clear();

    // First link: nearest in range and inside the cone
    arena.query_targets(origin, weapon.range, &mut scratch.targets);
    let range_sq = weapon.range * weapon.range;
    let first = nearest(arena, &scratch.targets, &scratch.chain, origin, range_sq, |p| {
        in_cone(origin, aim, p, config.chain_cone_cos)
    });

    let Some(first) = first else {
        fx.draw_beam(origin, origin + aim * weapon.range);
        return 0;
    };
    scratch.chain.push(first);

    // Greedy hops from the tail
    let hop_sq = config.chain_radius * config.chain_radius;
    while scratch.chain.len() < config.max_chain {
        let Some(&tail) = scratch.chain.last() else {
            break;
        };
        let from = arena.targets[tail].position;
        arena.query_targets(from, config.chain_radius, &mut scratch.targets);
        match nearest(arena, &scratch.targets, &scratch.chain, from, hop_sq, |_| true) {
            Some(next) => scratch.chain.push(next),
            None => break,
        }
    }

    let n = scratch.chain.len().max(1);
    let share = weapon.damage / n as f32;
    let stun = config.chain_base_stun / n as f32;

    let mut from = origin;
    for &slot in &scratch.chain {
        let target = &mut arena.targets[slot];
        fx.draw_beam(from, target.position);
        from = target.position;

        let tracked = target.apply_damage(share);
        StatusTimers::refresh(&mut target.status.stunned, stun);
        fx.track_statistic(StatKind::Damage, tracked, target.is_boss);
        fx.track_statistic(StatKind::Hit, 1.0, target.is_boss);
        fx.spawn_damage_text(target.position, share, TextColor::Electric);
        fx.spawn_particles(target.position, ParticleKind::Electric, ARC_PARTICLES);
    }
    fx.play_sound(SoundCue::Zap);

    scratch.chain.len()
}

/// Nearest alive candidate within `max_dist_sq` of `from` that is not already
/// in `exclude` and passes `accept`. Ties go to the lower slot.
fn nearest<F>(
    arena: &Arena,
    candidates: &[usize],
    exclude: &[usize],
    from: Vec3,
    max_dist_sq: f32,
    accept: F,
) -> Option<usize>
where
    F: Fn(Vec3) -> bool,
{
    let mut best: Option<(f32, usize)> = None;
    for &slot in candidates {
        let Some(target) = arena.targets.get(slot) else {
            continue;
        };
        if !target.is_alive() || exclude.contains(&slot) {
            continue;
        }
        let dist_sq = target.position.distance_squared_xz(from);
        if dist_sq > max_dist_sq || !accept(target.position) {
            continue;
        }
        let better = match best {
            None => true,
            Some((d, s)) => dist_sq < d || (dist_sq == d && slot < s),
        };
        if better {
            best = Some((dist_sq, slot));
        }
    }
    best.map(|(_, slot)| slot)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::effects::NoEffects;
    use crate::combat::events::{CombatEventData, EventLog};
    use crate::combat::target::{Target, TargetId};
    use crate::combat::weapon::{WeaponTable, ARC_PROJECTOR, FLAMETHROWER};

    fn arena(positions: &[Vec3], health: f32) -> Arena {
        let mut arena = Arena::new(15.0);
        for (i, &p) in positions.iter().enumerate() {
            arena.add_target(Target::new(TargetId(i as u32), p, health));
        }
        arena.reindex_targets();
        arena
    }

    #[test]
    fn test_flame_cone_and_certain_damage() {
        let table = WeaponTable::standard();
        let flame = table.get(FLAMETHROWER).unwrap();
        let config = CombatConfig::default();
        let mut arena = arena(
            &[
                Vec3::new(5.0, 0.0, 0.0),  // dead ahead
                Vec3::new(5.0, 0.0, 5.0),  // 45 degrees off
                Vec3::new(-5.0, 0.0, 0.0), // behind
                Vec3::new(30.0, 0.0, 0.0), // out of range
            ],
            100.0,
        );
        let mut rng = DeterministicRng::new(1);
        let mut fx = EventLog::new();

        // dt >= fire_rate: damage is certain
        let affected = fire_flame(
            flame,
            Vec3::ZERO,
            Vec3::X,
            flame.fire_rate,
            &mut arena,
            &config,
            &mut rng,
            &mut QueryScratch::default(),
            &mut fx,
        );

        assert_eq!(affected, 1);
        assert_eq!(fx.hit_count, 1);
        assert_eq!(fx.damage_total, flame.damage);
        assert_eq!(arena.targets[0].health, 100.0 - flame.damage);
        assert!(arena.targets[0].status.is_burning());
        for target in &arena.targets[1..] {
            assert_eq!(target.health, 100.0);
            assert!(!target.status.is_burning());
        }
    }

    #[test]
    fn test_flame_zero_aim_does_nothing() {
        let table = WeaponTable::standard();
        let flame = table.get(FLAMETHROWER).unwrap();
        let mut arena = arena(&[Vec3::new(2.0, 0.0, 0.0)], 100.0);
        let mut fx = EventLog::new();

        let affected = fire_flame(
            flame,
            Vec3::ZERO,
            Vec3::ZERO,
            0.1,
            &mut arena,
            &CombatConfig::default(),
            &mut DeterministicRng::new(1),
            &mut QueryScratch::default(),
            &mut fx,
        );
        assert_eq!(affected, 0);
        assert!(fx.events.is_empty());
    }

    #[test]
    fn test_chain_splits_damage_evenly() {
        let table = WeaponTable::standard();
        let arc = table.get(ARC_PROJECTOR).unwrap();
        let config = CombatConfig::default();
        let mut arena = arena(
            &[
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(15.0, 0.0, 0.0),
                Vec3::new(20.0, 0.0, 3.0),
                Vec3::new(60.0, 0.0, 0.0), // too far to hop to
            ],
            1000.0,
        );
        let mut fx = EventLog::new();

        let n = fire_chain(arc, Vec3::ZERO, Vec3::X, &mut arena, &config, &mut QueryScratch::default(), &mut fx);
        assert_eq!(n, 3);

        let dealt: f32 = arena.targets.iter().map(|t| 1000.0 - t.health).sum();
        assert!((dealt - arc.damage).abs() < 1e-3);
        assert_eq!(arena.targets[3].health, 1000.0);
        assert_eq!(arena.targets[0].status.stunned, config.chain_base_stun / 3.0);
        assert_eq!(fx.count(|d| matches!(d, CombatEventData::Beam { .. })), 3);
    }

    #[test]
    fn test_chain_caps_at_max_length() {
        let table = WeaponTable::standard();
        let arc = table.get(ARC_PROJECTOR).unwrap();
        let config = CombatConfig::default();
        let positions: Vec<Vec3> = (1..=8).map(|i| Vec3::new(i as f32 * 3.0, 0.0, 0.0)).collect();
        let mut arena = arena(&positions, 1000.0);

        let n = fire_chain(arc, Vec3::ZERO, Vec3::X, &mut arena, &config, &mut QueryScratch::default(), &mut NoEffects);
        assert_eq!(n, config.max_chain);
        assert_eq!(arena.targets[config.max_chain].health, 1000.0);
    }

    #[test]
    fn test_chain_misses_draws_full_beam() {
        let table = WeaponTable::standard();
        let arc = table.get(ARC_PROJECTOR).unwrap();
        // Target is behind the muzzle
        let mut arena = arena(&[Vec3::new(-5.0, 0.0, 0.0)], 100.0);
        let mut fx = EventLog::new();

        let n = fire_chain(
            arc,
            Vec3::ZERO,
            Vec3::X,
            &mut arena,
            &CombatConfig::default(),
            &mut QueryScratch::default(),
            &mut fx,
        );
        assert_eq!(n, 0);
        assert_eq!(arena.targets[0].health, 100.0);
        assert_eq!(
            fx.count(|d| *d == CombatEventData::Beam { from: Vec3::ZERO, to: Vec3::new(arc.range, 0.0, 0.0) }),
            1
        );
    }
}
