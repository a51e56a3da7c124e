//! Fire Zones
//!
//! Timed area-effect volumes left behind by incendiary impacts. A zone ticks
//! at most once per update and at most once per interval. The tick clock
//! advances by exactly one interval per tick, so at any frame rate faster than
//! the interval the tick count over a span does not depend on how the span was
//! cut into frames. After a clock jump of two intervals or more the clock
//! re-anchors at `now` instead of replaying the missed ticks.

use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::core::vec3::Vec3;
use crate::combat::arena::Arena;
use crate::combat::effects::{DecalKind, ParticleKind, StatKind, TextColor, WorldEffects};
use crate::combat::simulation::CombatConfig;
use crate::combat::target::StatusTimers;

/// Identifier of a fire zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

/// A positioned, time-limited damage zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaEffectVolume {
    /// Identifier
    pub id: ZoneId,
    /// Center
    pub position: Vec3,
    /// Horizontal radius
    pub radius: f32,
    /// Seconds left
    pub remaining_life: f32,
    /// Time of the last damage tick. `None` until the first update.
    pub last_tick_time: Option<f64>,
    /// Damage applied per tick to each occupant
    pub tick_damage: f32,
}

/// All live fire zones.
#[derive(Debug, Default)]
pub struct ZoneField {
    zones: Vec<AreaEffectVolume>,
    next_id: u32,
    scratch: Vec<usize>,
}

impl ZoneField {
    /// No zones.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zone and show its visual.
    pub fn ignite(
        &mut self,
        position: Vec3,
        radius: f32,
        life: f32,
        tick_damage: f32,
        fx: &mut dyn WorldEffects,
    ) -> ZoneId {
        let id = ZoneId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        self.zones.push(AreaEffectVolume {
            id,
            position,
            radius,
            remaining_life: life,
            last_tick_time: None,
            tick_damage,
        });

        fx.show_zone_visual(id, position, radius);
        fx.spawn_ground_decal(position, radius, DecalKind::Char);
        id
    }

    /// Advance every zone by `dt`. `now` is the caller's clock in seconds.
    ///
    /// Returns the number of damage ticks applied.
    pub fn update(
        &mut self,
        dt: f32,
        now: f64,
        arena: &mut Arena,
        config: &CombatConfig,
        fx: &mut dyn WorldEffects,
    ) -> u32 {
        let interval = config.fire_tick_interval;
        let mut ticks = 0;

        for i in (0..self.zones.len()).rev() {
            self.zones[i].remaining_life -= dt;
            if self.zones[i].remaining_life <= 0.0 {
                let zone = self.zones.remove(i);
                fx.hide_zone_visual(zone.id);
                trace!("Fire zone {:?} expired", zone.id);
                continue;
            }

            let zone = &mut self.zones[i];
            fx.spawn_particles(zone.position, ParticleKind::Fire, config.fire_zone_particles);

            match zone.last_tick_time {
                None => {
                    zone.last_tick_time = Some(now);
                    burn_occupants(zone, arena, config, &mut self.scratch, fx);
                    ticks += 1;
                }
                Some(last) if now - last >= interval => {
                    let next = if now - last >= 2.0 * interval { now } else { last + interval };
                    zone.last_tick_time = Some(next);
                    burn_occupants(zone, arena, config, &mut self.scratch, fx);
                    ticks += 1;
                }
                Some(_) => {}
            }
        }

        ticks
    }

    /// Remove every zone and hide its visual.
    pub fn clear(&mut self, fx: &mut dyn WorldEffects) {
        for zone in self.zones.drain(..).rev() {
            fx.hide_zone_visual(zone.id);
        }
    }

    /// Number of live zones.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// True when no zone is live.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Iterate live zones.
    pub fn iter(&self) -> impl Iterator<Item = &AreaEffectVolume> {
        self.zones.iter()
    }
}

/// One damage tick against every alive target inside the zone.
fn burn_occupants(
    zone: &AreaEffectVolume,
    arena: &mut Arena,
    config: &CombatConfig,
    scratch: &mut Vec<usize>,
    fx: &mut dyn WorldEffects,
) {
    arena.query_targets(zone.position, zone.radius, scratch);
    let radius_sq = zone.radius * zone.radius;

    for &slot in scratch.iter() {
        let Some(target) = arena.targets.get_mut(slot) else {
            continue;
        };
        if !target.is_alive() || target.position.distance_squared_xz(zone.position) > radius_sq {
            continue;
        }

        let tracked = target.apply_damage(zone.tick_damage);
        StatusTimers::refresh(&mut target.status.burning, config.burn_duration);
        fx.track_statistic(StatKind::Damage, tracked, target.is_boss);
        fx.track_statistic(StatKind::Hit, 1.0, target.is_boss);
        fx.spawn_damage_text(target.position, zone.tick_damage, TextColor::Fire);
    }
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

    fn arena_with_target(health: f32) -> Arena {
        let mut arena = Arena::new(15.0);
        arena.add_target(Target::new(TargetId(1), Vec3::new(1.0, 0.0, 0.0), health));
        arena.reindex_targets();
        arena
    }

    /// Run a zone for `steps` frames at `rate` Hz and return target health.
    fn run_at(rate: u32, steps: u32) -> (f32, u32) {
        let config = CombatConfig::default();
        let mut arena = arena_with_target(1000.0);
        let mut zones = ZoneField::new();
        zones.ignite(Vec3::ZERO, 5.0, 6.0, 6.0, &mut NoEffects);

        let dt = 1.0 / rate as f32;
        let mut now = 0.0f64;
        let mut ticks = 0;
        for _ in 0..steps {
            now += 1.0 / rate as f64;
            ticks += zones.update(dt, now, &mut arena, &config, &mut NoEffects);
        }
        (arena.targets[0].health, ticks)
    }

    #[test]
    fn test_cadence_independent_of_frame_rate() {
        // 19/6 seconds at both rates
        let (health_30, ticks_30) = run_at(30, 95);
        let (health_144, ticks_144) = run_at(144, 456);

        assert_eq!(ticks_30, 7);
        assert_eq!(ticks_144, 7);
        assert_eq!(health_30, health_144);
        assert_eq!(health_30, 1000.0 - 7.0 * 6.0);
    }

    #[test]
    fn test_long_frame_ticks_once() {
        let config = CombatConfig::default();
        let mut arena = arena_with_target(1000.0);
        let mut zones = ZoneField::new();
        zones.ignite(Vec3::ZERO, 5.0, 6.0, 6.0, &mut NoEffects);

        assert_eq!(zones.update(0.1, 0.0, &mut arena, &config, &mut NoEffects), 1);
        // Three whole intervals elapsed, still a single tick
        assert_eq!(zones.update(1.6, 1.6, &mut arena, &config, &mut NoEffects), 1);
        assert_eq!(zones.iter().next().unwrap().last_tick_time, Some(1.6));
        assert_eq!(arena.targets[0].health, 1000.0 - 2.0 * 6.0);
        assert!(arena.targets[0].status.is_burning());
    }

    #[test]
    fn test_clock_jump_does_not_burst() {
        let config = CombatConfig::default();
        let mut arena = arena_with_target(1000.0);
        let mut zones = ZoneField::new();
        zones.ignite(Vec3::ZERO, 5.0, 6.0, 6.0, &mut NoEffects);
        let dt = 1.0 / 60.0;

        assert_eq!(zones.update(dt, 100.0, &mut arena, &config, &mut NoEffects), 1);
        // Caller clock jumps 30 s in one frame
        assert_eq!(zones.update(dt, 130.0, &mut arena, &config, &mut NoEffects), 1);
        assert_eq!(arena.targets[0].health, 1000.0 - 2.0 * 6.0);

        // Cadence resumes from the jump
        assert_eq!(zones.update(dt, 130.4, &mut arena, &config, &mut NoEffects), 0);
        assert_eq!(zones.update(dt, 130.5, &mut arena, &config, &mut NoEffects), 1);
    }

    #[test]
    fn test_interval_boundary_keeps_anchor() {
        let config = CombatConfig::default();
        let mut arena = arena_with_target(1000.0);
        let mut zones = ZoneField::new();
        zones.ignite(Vec3::ZERO, 5.0, 6.0, 6.0, &mut NoEffects);

        zones.update(0.1, 0.0, &mut arena, &config, &mut NoEffects);
        // Late by 0.25 s: tick, and the clock stays on the 0.5 s grid
        assert_eq!(zones.update(0.75, 0.75, &mut arena, &config, &mut NoEffects), 1);
        assert_eq!(zones.iter().next().unwrap().last_tick_time, Some(0.5));
        assert_eq!(zones.update(0.25, 1.0, &mut arena, &config, &mut NoEffects), 1);
    }

    #[test]
    fn test_tick_reports_hit_and_damage() {
        let config = CombatConfig::default();
        let mut arena = arena_with_target(1000.0);
        let mut zones = ZoneField::new();
        let mut fx = EventLog::new();
        zones.ignite(Vec3::ZERO, 5.0, 6.0, 6.0, &mut fx);

        zones.update(0.1, 0.0, &mut arena, &config, &mut fx);
        assert_eq!(fx.damage_total, 6.0);
        assert_eq!(fx.hit_count, 1);
    }

    #[test]
    fn test_zone_expires_and_hides_visual() {
        let config = CombatConfig::default();
        let mut arena = arena_with_target(1000.0);
        let mut zones = ZoneField::new();
        let mut fx = EventLog::new();
        let id = zones.ignite(Vec3::ZERO, 5.0, 1.0, 6.0, &mut fx);

        zones.update(0.6, 0.6, &mut arena, &config, &mut fx);
        assert_eq!(zones.len(), 1);
        zones.update(0.6, 1.2, &mut arena, &config, &mut fx);
        assert!(zones.is_empty());
        assert_eq!(fx.count(|d| *d == CombatEventData::ZoneHidden { zone: id }), 1);
    }

    #[test]
    fn test_targets_outside_radius_untouched() {
        let config = CombatConfig::default();
        let mut arena = Arena::new(15.0);
        arena.add_target(Target::new(TargetId(1), Vec3::new(9.0, 0.0, 0.0), 100.0));
        arena.reindex_targets();

        let mut zones = ZoneField::new();
        zones.ignite(Vec3::ZERO, 5.0, 6.0, 6.0, &mut NoEffects);
        zones.update(0.1, 0.1, &mut arena, &config, &mut NoEffects);

        assert_eq!(arena.targets[0].health, 100.0);
        assert!(!arena.targets[0].status.is_burning());
    }

    #[test]
    fn test_clear_hides_everything() {
        let mut zones = ZoneField::new();
        let mut fx = EventLog::new();
        zones.ignite(Vec3::ZERO, 5.0, 6.0, 6.0, &mut fx);
        zones.ignite(Vec3::X, 5.0, 6.0, 6.0, &mut fx);

        zones.clear(&mut fx);
        assert!(zones.is_empty());
        assert_eq!(fx.count(|d| matches!(d, CombatEventData::ZoneHidden { .. })), 2);
    }
}
