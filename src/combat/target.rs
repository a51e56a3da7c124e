//! Targets and Obstacles
//!
//! Records owned by the surrounding game and mutated by the combat core.
//! The core changes health, status timers, death state and knockback; it
//! never creates or destroys targets.

use serde::{Serialize, Deserialize};

use crate::core::vec3::Vec3;
use crate::combat::spatial::{Footprint, Spatial};

/// Body radius of a target at unit scale. Scaled by `width_scale * overall_scale`.
pub const TARGET_BODY_RADIUS: f32 = 1.0;

// =============================================================================
// IDS
// =============================================================================

/// Stable identifier of a target, used for hit-set membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TargetId(pub u32);

/// Identifier of a static obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

// =============================================================================
// TARGET
// =============================================================================

/// Life cycle of a target as seen by the combat core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeathState {
    /// Can be damaged
    #[default]
    Alive = 0,
    /// Death animation / ragdoll in progress
    Dying = 1,
    /// Gone
    Dead = 2,
}

/// Remaining seconds of each status effect. Zero means inactive.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusTimers {
    /// Burning (fire zones, incendiaries, flame cones)
    pub burning: f32,
    /// Blinded (disabling flash)
    pub blinded: f32,
    /// Stunned (disabling flash, chain-electrical)
    pub stunned: f32,
    /// Slowed
    pub slowed: f32,
}

impl StatusTimers {
    /// Is the target currently burning?
    #[inline]
    pub fn is_burning(&self) -> bool {
        self.burning > 0.0
    }

    /// Extend a timer to at least `duration` seconds.
    #[inline]
    pub fn refresh(timer: &mut f32, duration: f32) {
        if duration > *timer {
            *timer = duration;
        }
    }
}

/// A mobile, damageable target.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Target {
    /// Stable identifier
    pub id: TargetId,

    /// World position
    pub position: Vec3,

    /// Horizontal body scale
    pub width_scale: f32,

    /// Uniform body scale
    pub overall_scale: f32,

    /// Current health (may go negative)
    pub health: f32,

    /// Health at spawn
    pub max_health: f32,

    /// Life cycle state
    pub death_state: DeathState,

    /// Status effect timers
    pub status: StatusTimers,

    /// Accumulated knockback velocity, consumed by the movement layer
    pub knockback: Vec3,

    /// Boss targets are reported separately in statistics
    pub is_boss: bool,
}

impl Target {
    /// Create a unit-scale target.
    pub fn new(id: TargetId, position: Vec3, health: f32) -> Self {
        Self {
            id,
            position,
            width_scale: 1.0,
            overall_scale: 1.0,
            health,
            max_health: health,
            death_state: DeathState::Alive,
            status: StatusTimers::default(),
            knockback: Vec3::ZERO,
            is_boss: false,
        }
    }

    /// Builder: set scale factors.
    pub fn with_scale(mut self, width_scale: f32, overall_scale: f32) -> Self {
        self.width_scale = width_scale;
        self.overall_scale = overall_scale;
        self
    }

    /// Builder: mark as boss.
    pub fn boss(mut self) -> Self {
        self.is_boss = true;
        self
    }

    /// Combined scale used as mass for knockback.
    #[inline]
    pub fn mass(&self) -> f32 {
        self.width_scale * self.overall_scale
    }

    /// Radius of the body footprint.
    #[inline]
    pub fn body_radius(&self) -> f32 {
        TARGET_BODY_RADIUS * self.mass()
    }

    /// Can this target still be damaged?
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.death_state == DeathState::Alive
    }

    /// Subtract `amount` from health.
    ///
    /// Returns the tracked damage, `min(remaining health, amount)`, so
    /// overkill is not counted in statistics. Health itself may go negative.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let tracked = self.health.max(0.0).min(amount.max(0.0));
        self.health -= amount;
        tracked
    }
}

impl Spatial for Target {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn footprint(&self) -> Footprint {
        Footprint::Radius(self.body_radius())
    }
}

// =============================================================================
// OBSTACLE
// =============================================================================

/// Simple collider used for line-of-flight blocking.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    /// Sphere of the given radius
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Box with the given half-extents
    Box {
        /// Half-extents along each axis
        half_extents: Vec3,
    },
}

impl Collider {
    /// Radius used for bullet blocking. Boxes use the larger horizontal
    /// half-extent.
    #[inline]
    pub fn effective_radius(&self) -> f32 {
        match *self {
            Collider::Sphere { radius } => radius,
            Collider::Box { half_extents } => half_extents.x.max(half_extents.z),
        }
    }
}

/// A static obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Identifier
    pub id: ObstacleId,
    /// Collider center
    pub position: Vec3,
    /// Collider shape
    pub collider: Collider,
}

impl Spatial for Obstacle {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn footprint(&self) -> Footprint {
        match self.collider {
            Collider::Sphere { radius } => Footprint::Radius(radius),
            Collider::Box { half_extents } => Footprint::Box {
                half_x: half_extents.x,
                half_z: half_extents.z,
            },
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
