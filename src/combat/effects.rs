//! World Effects Boundary
//!
//! Everything the combat core asks of the outside world (visuals, audio, AI
//! awareness, statistics) goes through [`WorldEffects`], passed by `&mut` to
//! each call. Every method has a no-op default so collaborators implement
//! only what they render.

use serde::{Serialize, Deserialize};

use crate::core::vec3::Vec3;
use crate::combat::projectile::{ProjectileHandle, ProjectileKind};
use crate::combat::target::TargetId;
use crate::combat::weapon::WeaponId;
use crate::combat::zone::ZoneId;

/// Handle to a ground landing-preview marker owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarkerHandle(pub u32);

/// Particle effect requested from the visual layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Muzzle flash
    Muzzle,
    /// Bullet hitting a target
    Blood,
    /// Bullet hitting an obstacle
    Spark,
    /// Explosion fireball
    Explosion,
    /// Explosion smoke
    Smoke,
    /// Fire zone embers
    Fire,
    /// Flame-weapon jet
    Flame,
    /// Chain-electrical arc
    Electric,
    /// Disabling flash
    Flash,
    /// Stun indicator over a target
    Stun,
}

/// Ground decal requested from the visual layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecalKind {
    /// Explosion crater
    Scorch,
    /// Burnt ground under a fire zone
    Char,
}

/// Color class of floating damage text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextColor {
    /// Regular hit
    Normal,
    /// Hit on a boss
    Boss,
    /// Fire damage
    Fire,
    /// Electrical damage
    Electric,
}

/// Statistic counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Tracked damage (overkill excluded)
    Damage,
    /// Number of hits
    Hit,
}

/// Source tag of an AI-awareness noise event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoiseTag {
    /// A bullet weapon was fired
    Gunfire,
    /// An explosive detonated
    Explosion,
}

/// Sound cue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Bullet weapon fired
    Gunshot,
    /// Throwable released
    Throw,
    /// Bullet hit a target
    Hit,
    /// Bullet hit an obstacle
    Ricochet,
    /// Explosive detonation
    Explosion,
    /// Incendiary ignition
    Ignite,
    /// A target was disabled by a flash
    Stunned,
    /// Chain-electrical discharge
    Zap,
    /// Flame weapon burst
    Flame,
}

/// Side effects requested by the combat core.
pub trait WorldEffects {
    /// Fire-and-forget particle burst.
    fn spawn_particles(&mut self, _position: Vec3, _kind: ParticleKind, _count: u32) {}

    /// Floating damage number.
    fn spawn_damage_text(&mut self, _position: Vec3, _amount: f32, _color: TextColor) {}

    /// Ground decal.
    fn spawn_ground_decal(&mut self, _position: Vec3, _scale: f32, _kind: DecalKind) {}

    /// Hand a dying target to the physics layer with the given force.
    fn explode_target(&mut self, _target: TargetId, _force: Vec3) {}

    /// Statistics counter.
    fn track_statistic(&mut self, _kind: StatKind, _amount: f32, _is_boss: bool) {}

    /// AI-awareness noise.
    fn emit_noise(&mut self, _position: Vec3, _radius: f32, _tag: NoiseTag) {}

    /// Sound playback.
    fn play_sound(&mut self, _cue: SoundCue) {}

    /// Visual beam segment (chain-electrical).
    fn draw_beam(&mut self, _from: Vec3, _to: Vec3) {}

    /// A pooled projectile became active.
    fn attach_projectile_visual(&mut self, _handle: ProjectileHandle, _kind: ProjectileKind, _weapon: WeaponId) {}

    /// A pooled projectile moved.
    fn sync_projectile_visual(&mut self, _handle: ProjectileHandle, _position: Vec3, _spin: f32) {}

    /// A pooled projectile was released.
    fn detach_projectile_visual(&mut self, _handle: ProjectileHandle) {}

    /// Show a landing-preview marker. Returns `None` if the renderer has no
    /// marker to show.
    fn show_ground_marker(&mut self, _position: Vec3, _radius: f32) -> Option<MarkerHandle> {
        None
    }

    /// Update marker opacity (pulse animation).
    fn set_marker_opacity(&mut self, _marker: MarkerHandle, _opacity: f32) {}

    /// Hide a landing-preview marker.
    fn hide_ground_marker(&mut self, _marker: MarkerHandle) {}

    /// A fire zone appeared.
    fn show_zone_visual(&mut self, _zone: ZoneId, _position: Vec3, _radius: f32) {}

    /// A fire zone expired.
    fn hide_zone_visual(&mut self, _zone: ZoneId) {}
}

/// Collaborator that ignores every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEffects;

impl WorldEffects for NoEffects {}
