//! Editor Intents
//!
//! Abstract editor input. A frontend maps its device events onto these;
//! the editor never sees key codes or mouse button numbers.

use serde::{Deserialize, Serialize};

/// Camera pan direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanDirection {
    /// -x
    Left,
    /// +x
    Right,
    /// -y
    Up,
    /// +y
    Down,
}

impl PanDirection {
    pub(crate) fn index(self) -> usize {
        match self {
            PanDirection::Left => 0,
            PanDirection::Right => 1,
            PanDirection::Up => 2,
            PanDirection::Down => 3,
        }
    }
}

/// One editor input event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum EditorIntent {
    /// Pointer moved, in window pixels.
    Pointer {
        /// Horizontal window position
        x: f32,
        /// Vertical window position
        y: f32,
    },
    /// Place button pressed or released.
    Place {
        /// Button down
        held: bool,
    },
    /// Delete button pressed or released.
    Delete {
        /// Button down
        held: bool,
    },
    /// Wheel step: -1 up, +1 down. With `shift` it cycles the variant,
    /// otherwise the tile group.
    Wheel {
        /// Step direction
        step: i32,
        /// Variant modifier held
        shift: bool,
    },
    /// Pan key pressed or released.
    Pan {
        /// Which way
        direction: PanDirection,
        /// Key down
        held: bool,
    },
    /// Switch between on-grid and off-grid placement.
    ToggleGrid,
    /// Run the autotiler over the map.
    Autotile,
    /// Write the map to disk.
    Save,
}
