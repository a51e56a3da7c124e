//! Core primitives.
//!
//! Vector math, deterministic randomness and state hashing shared by every
//! combat system.

pub mod vec3;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec3::Vec3;
pub use rng::{DeterministicRng, RngSnapshot};
pub use hash::{compute_state_hash, Digestible, StateHash, StateHasher};
