//! # Ninja Runtime
//!
//! Tile platformer runtime and level editor core. The crate decides what
//! happens each frame and what is drawn where; windowing, audio and pixel
//! blitting belong to a frontend.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       NINJA RUNTIME                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec2.rs     - 2D float vector                           │
//! │  ├── rect.rs     - Integer rectangles                        │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - Game logic                                │
//! │  ├── tilemap.rs  - Tile grid, autotile, map files            │
//! │  ├── physics.rs  - Per-axis collision resolution             │
//! │  ├── player.rs   - Jumps, wall slide, dash                   │
//! │  ├── enemy.rs    - Patrol, shooting                          │
//! │  ├── effects.rs  - Particles, sparks, projectiles            │
//! │  ├── session.rs  - Running level, camera                     │
//! │  └── tick.rs     - Per-frame simulation loop                 │
//! │                                                              │
//! │  editor/         - Level editor core                         │
//! │  ├── intent.rs   - Abstract editor input                     │
//! │  └── session.rs  - Placement, deletion, save/load            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The simulation advances one tick per frame:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from seeded Xorshift128+
//!
//! Given identical inputs and RNG seed, a build produces identical state
//! hashes run after run, which is what replay verification relies on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod editor;
pub mod game;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use core::vec2::Vec2;
pub use editor::{EditorConfig, EditorIntent, EditorSession};
pub use game::input::{InputFrame, InputRecording};
pub use game::session::{LevelSession, SessionConfig};
pub use game::tilemap::{TileGrid, TileKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
