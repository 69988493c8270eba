//! Render Plan
//!
//! The runtime decides what is drawn and where; a frontend turns these
//! commands into pixels. Positions are screen-space (camera offset already
//! applied), in display pixels before any output scaling.

use crate::core::vec2::Vec2;

/// Reference to an image in the asset catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpriteRef {
    /// A single-image asset.
    Single {
        /// Asset name
        asset: &'static str,
    },
    /// Image `index` of an image-list asset (tile variants).
    Indexed {
        /// Asset name
        asset: &'static str,
        /// Variant index
        index: usize,
    },
    /// Frame `frame` of `action` in an animation set.
    Animated {
        /// Asset name
        asset: &'static str,
        /// Action name
        action: &'static str,
        /// Image index within the action
        frame: usize,
    },
}

/// One draw operation.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Blit an image with its top-left corner at `pos`.
    Sprite {
        /// What to draw
        sprite: SpriteRef,
        /// Top-left corner
        pos: Vec2,
        /// Mirror horizontally
        flip: bool,
    },
    /// Filled white polygon (sparks).
    Polygon {
        /// Corner points
        points: [Vec2; 4],
    },
}

impl DrawCommand {
    /// Unflipped sprite.
    pub fn sprite(sprite: SpriteRef, pos: Vec2) -> Self {
        DrawCommand::Sprite { sprite, pos, flip: false }
    }
}

/// Integer camera offset used for one frame of drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RenderOffset {
    /// Horizontal scroll
    pub x: i32,
    /// Vertical scroll
    pub y: i32,
}

impl RenderOffset {
    /// Create a new offset.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncate a float scroll.
    pub fn from_scroll(scroll: Vec2) -> Self {
        let (x, y) = scroll.to_ints();
        Self { x, y }
    }

    /// World position to screen position.
    #[inline]
    pub fn apply(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x - self.x as f32, world.y - self.y as f32)
    }
}
