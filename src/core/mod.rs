//! Core primitives.
//!
//! Math and bookkeeping types shared by the game runtime and the editor.

pub mod vec2;
pub mod rect;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rect::Rect;
pub use rng::DeterministicRng;
pub use hash::{StateHash, StateHasher, compute_state_hash};
