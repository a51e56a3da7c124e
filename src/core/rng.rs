//! Seeded Randomness
//!
//! Xorshift128+ seeded through SplitMix64. The combat core draws from one
//! generator owned by the simulation (pellet spread, flame damage rolls), so a
//! run is reproducible from its seed and call sequence alone.

use serde::{Serialize, Deserialize};

/// Saved generator position, for checkpoints and state hashing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngSnapshot {
    /// First state word
    pub s0: u64,
    /// Second state word
    pub s1: u64,
}

/// Xorshift128+ generator.
///
/// ```
/// use ordnance::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(0x5EED);
/// let mut b = DeterministicRng::new(0x5EED);
/// assert_eq!(a.spread(0.1), b.spread(0.1));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    s0: u64,
    s1: u64,
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Seed a generator. Any seed is valid, including zero.
    pub fn new(seed: u64) -> Self {
        let mut mix = SplitMix64(seed);
        let (s0, s1) = (mix.next(), mix.next());
        if s0 | s1 == 0 {
            // All-zero state would emit zeros forever
            return Self { s0: 1, s1: 1 };
        }
        Self { s0, s1 }
    }

    /// Raw 64-bit draw.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let (s0, s1) = (self.s0, self.s1);
        let out = s0.wrapping_add(s1);

        let x = s1 ^ s0;
        self.s0 = s0.rotate_left(24) ^ x ^ (x << 16);
        self.s1 = x.rotate_left(37);
        out
    }

    /// Uniform in [0, 1) with 24 bits of precision.
    #[inline]
    pub fn unit(&mut self) -> f32 {
        const SCALE: f32 = 1.0 / (1u32 << 24) as f32;
        (self.next_u64() >> 40) as f32 * SCALE
    }

    /// Uniform in [min, max). An empty or inverted range yields `min`.
    #[inline]
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if min < max {
            min + self.unit() * (max - min)
        } else {
            min
        }
    }

    /// Symmetric angle in [-half_angle, half_angle). Zero spread draws nothing.
    #[inline]
    pub fn spread(&mut self, half_angle: f32) -> f32 {
        if half_angle > 0.0 {
            self.range(-half_angle, half_angle)
        } else {
            0.0
        }
    }

    /// True with probability `p`. Saturates outside [0, 1]; NaN is false.
    /// Certain outcomes do not consume a draw.
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        if p >= 1.0 {
            true
        } else if p > 0.0 {
            self.unit() < p
        } else {
            false
        }
    }

    /// Current position.
    pub fn snapshot(&self) -> RngSnapshot {
        RngSnapshot { s0: self.s0, s1: self.s1 }
    }

    /// Jump back to a saved position.
    pub fn restore(&mut self, snapshot: RngSnapshot) {
        self.s0 = snapshot.s0;
        self.s1 = snapshot.s1;
    }
}

/// Seed expander.
struct SplitMix64(u64);

impl SplitMix64 {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

// =============================================================================
// TESTS
// =============================================================================
