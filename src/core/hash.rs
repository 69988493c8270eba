//! Hashing
//!
//! SHA-256 in two roles: fingerprints of a running session, compared after
//! a replay, and content-addressed names for maps saved without a name.

use sha2::{Digest, Sha256};

use super::rect::Rect;
use super::vec2::Vec2;

/// 32-byte SHA-256 output.
pub type StateHash = [u8; 32];

/// Domain prefix for session fingerprints.
const SESSION_DOMAIN: &[u8] = b"NINJA_SESSION_V1";

/// Feeds simulation values into SHA-256 in a fixed binary layout.
///
/// Integers go in little-endian and floats by bit pattern, so two sessions
/// only agree when every position and velocity agreed to the last bit.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Hasher whose output is tied to `domain`.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Hasher for [`LevelSession`](crate::game::session::LevelSession) state.
    pub fn for_session_state() -> Self {
        Self::new(SESSION_DOMAIN)
    }

    /// Single byte.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Little-endian.
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Little-endian.
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Little-endian.
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Bit pattern.
    #[inline]
    pub fn update_f32(&mut self, value: f32) {
        self.update_u32(value.to_bits());
    }

    /// 0 or 1.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(u8::from(value));
    }

    /// Both components, x first.
    #[inline]
    pub fn update_vec2(&mut self, value: Vec2) {
        self.update_f32(value.x);
        self.update_f32(value.y);
    }

    /// x, y, w, h.
    #[inline]
    pub fn update_rect(&mut self, value: Rect) {
        for v in [value.x, value.y, value.w, value.h] {
            self.update_i32(v);
        }
    }

    /// Length-prefixed so adjacent strings cannot run together.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Finish and return the digest.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn hex_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Fingerprint a session: tick and seed first, then whatever `add_state`
/// feeds in.
pub fn compute_state_hash<F>(tick: u32, rng_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_session_state();
    hasher.update_u32(tick);
    hasher.update_u64(rng_seed);
    add_state(&mut hasher);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================
