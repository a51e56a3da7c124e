//! Impact Behaviors
//!
//! What happens when a throwable lands, keyed by [`WeaponFamily`]. The
//! registry is an explicit map handed to the simulation at construction, so
//! callers can swap or extend behaviors without touching the flight code.
//!
//! ```text
//! Explosive  -> damage + knockback or death force, noise, scorch decal
//! Incendiary -> fire zone + burning
//! Disabling  -> blind + stun
//! ```

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use crate::core::vec3::Vec3;
use crate::combat::arena::{Arena, QueryScratch};
use crate::combat::effects::{
    DecalKind, NoiseTag, ParticleKind, SoundCue, StatKind, TextColor, WorldEffects,
};
use crate::combat::simulation::CombatConfig;
use crate::combat::target::{DeathState, StatusTimers};
use crate::combat::weapon::{WeaponFamily, WeaponSpec};
use crate::combat::zone::ZoneField;

const EXPLOSION_PARTICLES: u32 = 30;
const SMOKE_PARTICLES: u32 = 15;
const FLASH_PARTICLES: u32 = 20;
const STUN_PARTICLES: u32 = 5;

/// Everything an impact behavior may touch.
pub struct ImpactContext<'a> {
    /// Targets and obstacles
    pub arena: &'a mut Arena,
    /// Live fire zones
    pub zones: &'a mut ZoneField,
    /// Tunables
    pub config: &'a CombatConfig,
    /// Weapon that produced the impact
    pub weapon: &'a WeaponSpec,
    /// Side-effect sink
    pub fx: &'a mut dyn WorldEffects,
    /// Reusable query buffers
    pub scratch: &'a mut QueryScratch,
}

/// Impact behavior: `(context, position, radius, damage) -> affected targets`.
pub type ImpactFn = fn(&mut ImpactContext<'_>, Vec3, f32, f32) -> usize;

/// Map of weapon family to impact behavior.
#[derive(Clone, Default)]
pub struct ImpactRegistry {
    behaviors: BTreeMap<WeaponFamily, ImpactFn>,
}

impl fmt::Debug for ImpactRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.behaviors.keys()).finish()
    }
}

impl ImpactRegistry {
    /// Registry with no behaviors. Every throwable lands silently.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the explosive, incendiary and disabling behaviors.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(WeaponFamily::Explosive, explosive_impact);
        registry.register(WeaponFamily::Incendiary, incendiary_impact);
        registry.register(WeaponFamily::Disabling, disabling_impact);
        registry
    }

    /// Set (or replace) the behavior for a family.
    pub fn register(&mut self, family: WeaponFamily, behavior: ImpactFn) -> Option<ImpactFn> {
        self.behaviors.insert(family, behavior)
    }

    /// Behavior for a family, if any.
    pub fn get(&self, family: WeaponFamily) -> Option<ImpactFn> {
        self.behaviors.get(&family).copied()
    }

    /// Run the behavior registered for the weapon's family.
    ///
    /// Returns `None` when the family has no behavior.
    pub fn dispatch(
        &self,
        ctx: &mut ImpactContext<'_>,
        position: Vec3,
        radius: f32,
        damage: f32,
    ) -> Option<usize> {
        let family = ctx.weapon.family;
        match self.get(family) {
            Some(behavior) => Some(behavior(ctx, position, radius, damage)),
            None => {
                debug!("No impact behavior for {:?}, landing silently", family);
                None
            }
        }
    }
}

// =============================================================================
// EXPLOSIVE
// =============================================================================

/// Damage every alive target whose body overlaps the blast.
///
/// Targets killed by the blast enter `Dying` and are handed to physics with
/// an outward, upward force. Survivors get radial knockback.
pub fn explosive_impact(ctx: &mut ImpactContext<'_>, position: Vec3, radius: f32, damage: f32) -> usize {
    let config = ctx.config;
    ctx.arena
        .query_targets(position, radius + config.explosion_query_margin, &mut ctx.scratch.targets);

    let mut affected = 0;
    for &slot in &ctx.scratch.targets {
        let Some(target) = ctx.arena.targets.get_mut(slot) else {
            continue;
        };
        if !target.is_alive() {
            continue;
        }

        let reach = radius + target.body_radius();
        let distance = target.position.distance_xz(position);
        if distance >= reach {
            continue;
        }
        affected += 1;

        let tracked = target.apply_damage(damage);
        ctx.fx.track_statistic(StatKind::Damage, tracked, target.is_boss);
        ctx.fx.track_statistic(StatKind::Hit, 1.0, target.is_boss);
        let color = if target.is_boss { TextColor::Boss } else { TextColor::Normal };
        ctx.fx.spawn_damage_text(target.position, damage, color);

        let proximity = (1.0 - distance / reach).clamp(0.0, 1.0);
        let outward = (target.position - position).horizontal().normalize();

        if target.health <= 0.0 {
            target.death_state = DeathState::Dying;
            let lift = (outward + Vec3::UP * config.explosion_upward_bias).normalize();
            let force = lift * (config.explosion_force * (0.5 + 0.5 * proximity));
            ctx.fx.explode_target(target.id, force);
            trace!("Explosion killed {:?}", target.id);
        } else {
            let push = config.explosion_knockback * proximity / target.mass().max(config.min_knockback_mass);
            target.knockback += outward * push;
        }
    }

    ctx.fx.emit_noise(position, config.explosion_noise_radius, NoiseTag::Explosion);
    ctx.fx.spawn_particles(position, ParticleKind::Explosion, EXPLOSION_PARTICLES);
    ctx.fx.spawn_particles(position, ParticleKind::Smoke, SMOKE_PARTICLES);
    ctx.fx.spawn_ground_decal(position, radius, DecalKind::Scorch);
    ctx.fx.play_sound(SoundCue::Explosion);

    affected
}

// =============================================================================
// INCENDIARY
// =============================================================================

/// Leave a fire zone and set everything inside it burning.
pub fn incendiary_impact(ctx: &mut ImpactContext<'_>, position: Vec3, radius: f32, _damage: f32) -> usize {
    let config = ctx.config;
    ctx.zones
        .ignite(position, radius, config.fire_zone_life, config.fire_tick_damage, &mut *ctx.fx);
    ctx.fx.play_sound(SoundCue::Ignite);

    ctx.arena.query_targets(position, radius, &mut ctx.scratch.targets);
    let radius_sq = radius * radius;

    let mut affected = 0;
    for &slot in &ctx.scratch.targets {
        let Some(target) = ctx.arena.targets.get_mut(slot) else {
            continue;
        };
        if target.is_alive() && target.position.distance_squared_xz(position) <= radius_sq {
            StatusTimers::refresh(&mut target.status.burning, config.burn_duration);
            affected += 1;
        }
    }
    affected
}

// =============================================================================
// DISABLING
// =============================================================================

/// Blind and stun everything inside the radius.
pub fn disabling_impact(ctx: &mut ImpactContext<'_>, position: Vec3, radius: f32, _damage: f32) -> usize {
    let weapon = ctx.weapon;
    ctx.fx.spawn_particles(position, ParticleKind::Flash, FLASH_PARTICLES);

    ctx.arena.query_targets(position, radius, &mut ctx.scratch.targets);
    let radius_sq = radius * radius;

    let mut affected = 0;
    for &slot in &ctx.scratch.targets {
        let Some(target) = ctx.arena.targets.get_mut(slot) else {
            continue;
        };
        if !target.is_alive() || target.position.distance_squared_xz(position) > radius_sq {
            continue;
        }

        StatusTimers::refresh(&mut target.status.blinded, weapon.blind_duration);
        StatusTimers::refresh(&mut target.status.stunned, weapon.stun_duration);
        ctx.fx.spawn_particles(target.position, ParticleKind::Stun, STUN_PARTICLES);
        ctx.fx.play_sound(SoundCue::Stunned);
        affected += 1;
    }
    affected
}

// =============================================================================
// TESTS
// =============================================================================
