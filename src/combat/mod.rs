//! Combat systems.
//!
//! - `spatial`: uniform-grid broad-phase
//! - `target`: targets, obstacles and colliders
//! - `arena`: target/obstacle storage with their indices
//! - `weapon`: weapon specs and the weapon table
//! - `projectile`: pooled projectile records
//! - `ballistics`: bullet sweeps and throwable flight
//! - `impact`: per-family impact behaviors
//! - `continuous`: flame and chain-electrical weapons
//! - `zone`: timed fire zones
//! - `effects`: the side-effect boundary
//! - `events`: recording side-effect collaborator
//! - `simulation`: caller-facing façade

pub mod spatial;
pub mod target;
pub mod arena;
pub mod weapon;
pub mod projectile;
pub mod ballistics;
pub mod impact;
pub mod continuous;
pub mod zone;
pub mod effects;
pub mod events;
pub mod simulation;

// Re-export combat types
pub use arena::Arena;
pub use effects::{NoEffects, WorldEffects};
pub use events::{CombatEvent, CombatEventData, EventLog};
pub use impact::{ImpactContext, ImpactFn, ImpactRegistry};
pub use projectile::{ProjectileHandle, ProjectileKind, ProjectilePool};
pub use simulation::{CombatConfig, CombatSimulation, ConfigError, FrameReport};
pub use spatial::{Footprint, SpatialIndex};
pub use target::{Collider, DeathState, Obstacle, ObstacleId, Target, TargetId};
pub use weapon::{WeaponError, WeaponFamily, WeaponId, WeaponSpec, WeaponTable};
pub use zone::{AreaEffectVolume, ZoneField, ZoneId};
