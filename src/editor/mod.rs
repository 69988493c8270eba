//! Level Editor Module
//!
//! Editing core for level maps: brush selection, on-grid and off-grid
//! placement, deletion, autotiling, camera panning and map save/load.
//! Windowing and drawing stay with the frontend.
//!
//! ## Module Structure
//!
//! - `intent`: Abstract editor input events
//! - `session`: Editor state, per-frame actions and persistence

pub mod intent;
pub mod session;

pub use intent::{EditorIntent, PanDirection};
pub use session::{EditorConfig, EditorError, EditorFrame, EditorSession};
