//! Game Logic Module
//!
//! All game simulation code. Deterministic for a given seed and input
//! recording.
//!
//! ## Module Structure
//!
//! - `assets`: Asset catalog (image counts, sizes, animation timings)
//! - `animation`: Frame counters and per-action animators
//! - `render`: Draw commands handed to a frontend
//! - `tilemap`: Tile grid, autotiling, map files
//! - `physics`: Per-axis rectangle collision against the grid
//! - `effects`: Particles, sparks, projectiles
//! - `entity`: Shared entity context and behavior trait
//! - `player`: Player movement, jumps, wall slide, dash
//! - `enemy`: Patrol, shooting, melee death
//! - `level`: Level sources and spawn marker extraction
//! - `session`: Running level state and camera
//! - `tick`: The per-frame simulation loop
//! - `input`: Input frames and recordings
//! - `events`: Game events for audio and replay

pub mod assets;
pub mod animation;
pub mod render;
pub mod tilemap;
pub mod physics;
pub mod effects;
pub mod entity;
pub mod player;
pub mod enemy;
pub mod level;
pub mod session;
pub mod tick;
pub mod input;
pub mod events;

// Re-export key types
pub use assets::AssetCatalog;
pub use events::{GameEvent, GameEventData, SoundCue};
pub use input::{InputFrame, InputRecording};
pub use level::{DirectoryLevels, LevelSource, MemoryLevels, LEVELS_ORDER};
pub use render::{DrawCommand, RenderOffset, SpriteRef};
pub use session::{LevelSession, SessionConfig, SessionError};
pub use tick::{replay, tick, TickResult};
pub use tilemap::{TileGrid, TileKind, TilemapError};
