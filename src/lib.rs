//! # Ordnance
//!
//! Projectile and area-effect combat simulation core.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         ORDNANCE                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Shared primitives                        │
//! │  ├── vec3.rs      - 3D vector, horizontal-plane helpers      │
//! │  ├── rng.rs       - Deterministic Xorshift128+ PRNG          │
//! │  └── hash.rs      - State hashing for replay verification    │
//! │                                                              │
//! │  combat/          - Combat simulation                        │
//! │  ├── spatial.rs   - Uniform-grid broad-phase                 │
//! │  ├── target.rs    - Targets, obstacles, colliders            │
//! │  ├── arena.rs     - Target/obstacle storage + indices        │
//! │  ├── weapon.rs    - Weapon specs and table                   │
//! │  ├── projectile.rs- Growth-on-demand projectile pool         │
//! │  ├── ballistics.rs- Bullet sweeps, throwable flight          │
//! │  ├── impact.rs    - Explosive / incendiary / disabling       │
//! │  ├── continuous.rs- Flame cone, chain-electrical             │
//! │  ├── zone.rs      - Timed fire zones                         │
//! │  ├── effects.rs   - Side-effect boundary (WorldEffects)      │
//! │  ├── events.rs    - Recording collaborator                   │
//! │  └── simulation.rs- Caller-facing façade                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Given the same weapon table, config, arena and call sequence, a run
//! produces the same state hash:
//! - No HashMap (BTreeMap for registries and cooldowns)
//! - No system time; the caller passes `dt` and `now`
//! - All randomness from the seeded Xorshift128+ in the simulation
//! - Projectile slots and zones are always visited in the same order

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod combat;

// Re-export commonly used types
pub use core::vec3::Vec3;
pub use core::rng::DeterministicRng;
pub use combat::{
    Arena, CombatConfig, CombatSimulation, EventLog, NoEffects, Target, TargetId, WeaponId,
    WeaponTable, WorldEffects,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const DEFAULT_TICK_RATE: u32 = 60;
