//! Ballistics
//!
//! Per-tick flight of pooled projectiles.
//!
//! Bullets fly straight and are swept: the segment travelled this tick is
//! tested against each candidate's circular footprint, so fast bullets cannot
//! tunnel through targets at low frame rates. Throwables follow exact
//! constant-gravity kinematics and report the point where they touch down.
//!
//! All collision math runs on the horizontal (x, z) plane.

use tracing::trace;

use crate::core::vec3::Vec3;
use crate::combat::arena::{Arena, QueryScratch};
use crate::combat::effects::{ParticleKind, SoundCue, StatKind, TextColor, WorldEffects};
use crate::combat::projectile::Projectile;
use crate::combat::simulation::CombatConfig;
use crate::combat::target::ObstacleId;
use crate::combat::weapon::WeaponSpec;

/// Particles spawned when a bullet strikes a target.
const BLOOD_PARTICLES: u32 = 6;

/// Particles spawned when a bullet strikes an obstacle.
const SPARK_PARTICLES: u32 = 4;

// =============================================================================
// SEGMENT MATH
// =============================================================================

/// Closest point to `point` on the horizontal segment `start..end`.
///
/// Returns the point (at `start.y`) and its clamped parameter `t` in [0, 1].
/// A degenerate segment returns `start` with `t = 0`.
#[inline]
pub fn closest_point_on_segment_xz(start: Vec3, end: Vec3, point: Vec3) -> (Vec3, f32) {
    let seg = (end - start).horizontal();
    let len_sq = seg.length_squared();
    if len_sq <= f32::EPSILON {
        return (start, 0.0);
    }

    let t = ((point - start).horizontal().dot(seg) / len_sq).clamp(0.0, 1.0);
    (start + seg * t, t)
}

// =============================================================================
// BULLETS
// =============================================================================

/// Result of one bullet tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulletOutcome {
    /// Still in flight
    Flying,
    /// Stopped by an obstacle
    Blocked(ObstacleId),
    /// Used up by target hits
    Spent,
    /// Lifetime ran out
    Expired,
}

impl BulletOutcome {
    /// Should the slot be released?
    #[inline]
    pub fn is_finished(self) -> bool {
        self != BulletOutcome::Flying
    }
}

/// Advance a bullet by `dt` and resolve its collisions.
///
/// The caller releases the slot when the outcome is finished.
pub fn step_bullet(
    bullet: &mut Projectile,
    weapon: &WeaponSpec,
    dt: f32,
    arena: &mut Arena,
    config: &CombatConfig,
    scratch: &mut QueryScratch,
    fx: &mut dyn WorldEffects,
) -> BulletOutcome {
    let start = bullet.position;
    bullet.position += bullet.velocity * dt;
    bullet.remaining_life -= dt;
    let end = bullet.position;

    // Obstacles
    arena.query_obstacles(end, config.obstacle_probe_radius, &mut scratch.obstacles);
    for &id in &scratch.obstacles {
        let Some(obstacle) = arena.obstacle(id) else {
            continue;
        };
        let reach = obstacle.collider.effective_radius();
        if end.distance_squared_xz(obstacle.position) < reach * reach {
            fx.spawn_particles(end, ParticleKind::Spark, SPARK_PARTICLES);
            fx.play_sound(SoundCue::Ricochet);
            return BulletOutcome::Blocked(id);
        }
    }

    // Targets, nearest to the segment start first
    let travelled = start.distance_xz(end);
    let midpoint = start.lerp(end, 0.5);
    arena.query_targets(midpoint, config.target_query_margin + travelled, &mut scratch.targets);

    scratch.ordered.clear();
    for &slot in &scratch.targets {
        if let Some(target) = arena.targets.get(slot) {
            scratch.ordered.push((start.distance_squared_xz(target.position), slot));
        }
    }
    scratch.ordered.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let direction = bullet.velocity.horizontal().normalize();

    for &(_, slot) in &scratch.ordered {
        let target = &mut arena.targets[slot];
        if !target.is_alive() || bullet.has_hit(target.id) {
            continue;
        }

        let (closest, _) = closest_point_on_segment_xz(start, end, target.position);
        let hit_radius = config.bullet_hit_radius * target.mass();
        if closest.distance_squared_xz(target.position) >= hit_radius * hit_radius {
            continue;
        }

        bullet.hit_set.push(target.id);

        let damage = bullet.damage;
        let tracked = target.apply_damage(damage);
        let push = damage / target.mass().max(config.min_knockback_mass);
        target.knockback += direction * (push * config.bullet_knockback_scale);

        fx.track_statistic(StatKind::Damage, tracked, target.is_boss);
        fx.track_statistic(StatKind::Hit, 1.0, target.is_boss);
        let color = if target.is_boss { TextColor::Boss } else { TextColor::Normal };
        fx.spawn_damage_text(target.position, damage, color);
        fx.play_sound(SoundCue::Hit);
        fx.spawn_particles(target.position, ParticleKind::Blood, BLOOD_PARTICLES);

        #[cfg(feature = "debug-tracing")]
        trace!("Bullet hit {:?} for {} (health now {})", target.id, damage, target.health);

        match weapon.pierce_decay {
            Some(decay) => {
                bullet.damage *= decay;
                if bullet.damage < config.pierce_damage_floor {
                    return BulletOutcome::Spent;
                }
            }
            None => return BulletOutcome::Spent,
        }
    }

    if bullet.remaining_life <= 0.0 {
        trace!("Bullet expired at {}", bullet.position);
        return BulletOutcome::Expired;
    }

    BulletOutcome::Flying
}

// =============================================================================
// THROWABLES
// =============================================================================

/// Launch parameters for a throw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThrowSolution {
    /// Initial velocity
    pub velocity: Vec3,
    /// Predicted landing point on the ground (y = 0)
    pub landing_point: Vec3,
}

/// Solve for the velocity that lands `distance` away along `direction` after
/// `flight_time` seconds under `gravity`. Ground height is zero.
///
/// Returns `None` for a zero horizontal direction or a non-positive flight time.
pub fn solve_throw(
    origin: Vec3,
    direction: Vec3,
    distance: f32,
    flight_time: f32,
    gravity: f32,
) -> Option<ThrowSolution> {
    let aim = direction.horizontal().normalize();
    if aim == Vec3::ZERO || !(flight_time > 0.0) {
        return None;
    }

    let horizontal_speed = distance / flight_time;
    let vertical_speed = (0.0 - origin.y + 0.5 * gravity * flight_time * flight_time) / flight_time;

    let velocity = Vec3::new(aim.x * horizontal_speed, vertical_speed, aim.z * horizontal_speed);
    let landing = origin.horizontal() + aim * distance;

    Some(ThrowSolution {
        velocity,
        landing_point: landing,
    })
}

/// Result of one throwable tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThrowableOutcome {
    /// Still airborne
    Flying,
    /// Touched down (or timed out) at this point, y clamped to >= 0
    Landed(Vec3),
}

/// Advance a throwable by `dt`.
///
/// On landing the ground marker is hidden and cleared. The caller dispatches
/// the impact and releases the slot.
pub fn step_throwable(
    throwable: &mut Projectile,
    dt: f32,
    config: &CombatConfig,
    fx: &mut dyn WorldEffects,
) -> ThrowableOutcome {
    let g = config.gravity;

    throwable.position.x += throwable.velocity.x * dt;
    throwable.position.z += throwable.velocity.z * dt;
    throwable.position.y += throwable.velocity.y * dt - 0.5 * g * dt * dt;
    throwable.velocity.y -= g * dt;

    throwable.spin += config.throwable_spin_rate * dt;
    throwable.age += dt;
    throwable.remaining_life -= dt;

    if let Some(marker) = throwable.ground_marker {
        let opacity = 0.55 + 0.35 * (throwable.age * config.marker_pulse_rate).sin();
        fx.set_marker_opacity(marker, opacity);
    }

    if throwable.position.y <= config.ground_epsilon || throwable.remaining_life <= 0.0 {
        if let Some(marker) = throwable.ground_marker.take() {
            fx.hide_ground_marker(marker);
        }
        let mut impact = throwable.position;
        impact.y = impact.y.max(0.0);
        return ThrowableOutcome::Landed(impact);
    }

    ThrowableOutcome::Flying
}

// =============================================================================
// TESTS
// =============================================================================
