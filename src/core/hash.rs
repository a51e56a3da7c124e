//! State Digests
//!
//! SHA-256 over a fixed-order encoding of the simulation. Two runs fed the
//! same inputs must digest identically; the demo binary relies on this to
//! check its own replay.
//!
//! Values are written through [`Digestible`] so callers chain fields without
//! caring about their width:
//!
//! ```
//! use ordnance::core::hash::StateHasher;
//! use ordnance::Vec3;
//!
//! let mut h = StateHasher::combat();
//! h.put(7u32).put(Vec3::new(1.0, 0.0, 2.0)).put(true);
//! let digest = h.finish();
//! assert_eq!(digest.len(), 32);
//! ```

use sha2::{Digest, Sha256};

use super::vec3::Vec3;

/// 256-bit digest.
pub type StateHash = [u8; 32];

/// Domain tag mixed in before any combat state.
const COMBAT_DOMAIN: &[u8] = b"ORDNANCE_COMBAT_STATE_V1";

/// A value with a canonical little-endian encoding.
pub trait Digestible {
    /// Feed the encoding into `sha`.
    fn feed(&self, sha: &mut Sha256);
}

macro_rules! digest_le {
    ($($ty:ty),*) => {
        $(impl Digestible for $ty {
            #[inline]
            fn feed(&self, sha: &mut Sha256) {
                sha.update(self.to_le_bytes());
            }
        })*
    };
}

digest_le!(u8, u32, u64);

impl Digestible for bool {
    #[inline]
    fn feed(&self, sha: &mut Sha256) {
        sha.update([*self as u8]);
    }
}

// Floats go in by bit pattern, so -0.0 and 0.0 differ
impl Digestible for f32 {
    #[inline]
    fn feed(&self, sha: &mut Sha256) {
        self.to_bits().feed(sha);
    }
}

impl Digestible for f64 {
    #[inline]
    fn feed(&self, sha: &mut Sha256) {
        self.to_bits().feed(sha);
    }
}

impl Digestible for Vec3 {
    #[inline]
    fn feed(&self, sha: &mut Sha256) {
        self.x.feed(sha);
        self.y.feed(sha);
        self.z.feed(sha);
    }
}

/// `None` is a zero tag byte; `Some` is a one byte followed by the value.
impl<T: Digestible> Digestible for Option<T> {
    fn feed(&self, sha: &mut Sha256) {
        match self {
            None => false.feed(sha),
            Some(value) => {
                true.feed(sha);
                value.feed(sha);
            }
        }
    }
}

/// Ordered accumulator over a domain-separated SHA-256.
pub struct StateHasher {
    sha: Sha256,
}

impl StateHasher {
    /// Start a digest under an arbitrary domain tag.
    pub fn with_domain(domain: &[u8]) -> Self {
        let mut sha = Sha256::new();
        sha.update((domain.len() as u32).to_le_bytes());
        sha.update(domain);
        Self { sha }
    }

    /// Start a combat-state digest.
    pub fn combat() -> Self {
        Self::with_domain(COMBAT_DOMAIN)
    }

    /// Append one value.
    #[inline]
    pub fn put<T: Digestible>(&mut self, value: T) -> &mut Self {
        value.feed(&mut self.sha);
        self
    }

    /// Append a length prefix followed by every item.
    pub fn put_all<T, I>(&mut self, items: I) -> &mut Self
    where
        T: Digestible,
        I: ExactSizeIterator<Item = T>,
    {
        self.put(items.len() as u32);
        for item in items {
            self.put(item);
        }
        self
    }

    /// Close the digest.
    pub fn finish(self) -> StateHash {
        self.sha.finalize().into()
    }
}

/// Digest of one simulation frame: frame number and seed first, then
/// whatever `body` appends.
pub fn compute_state_hash(frame: u64, seed: u64, body: impl FnOnce(&mut StateHasher)) -> StateHash {
    let mut hasher = StateHasher::combat();
    hasher.put(frame).put(seed);
    body(&mut hasher);
    hasher.finish()
}
