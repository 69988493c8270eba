//! Axis-Aligned Integer Rectangles
//!
//! Hitboxes and tile boxes live on the integer pixel grid. Float positions
//! are truncated toward zero when a box is built from them.

use serde::{Serialize, Deserialize};

use super::vec2::Vec2;

/// Integer axis-aligned box. `x`/`y` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub w: i32,
    /// Height in pixels
    pub h: i32,
}

impl Rect {
    /// Create a new rect.
    #[inline]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Build a rect from a float top-left corner (truncated) and a size.
    #[inline]
    pub fn from_pos(pos: Vec2, size: (i32, i32)) -> Self {
        let (x, y) = pos.to_ints();
        Self::new(x, y, size.0, size.1)
    }

    /// Left edge.
    #[inline]
    pub fn left(&self) -> i32 {
        self.x
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Top edge.
    #[inline]
    pub fn top(&self) -> i32 {
        self.y
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Horizontal center (integer division, like the pixel grid).
    #[inline]
    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    /// Vertical center.
    #[inline]
    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }

    /// Center point as a vector.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::from_ints(self.center_x(), self.center_y())
    }

    /// Move so the right edge sits at `edge`.
    #[inline]
    pub fn set_right(&mut self, edge: i32) {
        self.x = edge - self.w;
    }

    /// Move so the left edge sits at `edge`.
    #[inline]
    pub fn set_left(&mut self, edge: i32) {
        self.x = edge;
    }

    /// Move so the bottom edge sits at `edge`.
    #[inline]
    pub fn set_bottom(&mut self, edge: i32) {
        self.y = edge - self.h;
    }

    /// Move so the top edge sits at `edge`.
    #[inline]
    pub fn set_top(&mut self, edge: i32) {
        self.y = edge;
    }

    /// Strict overlap test. Boxes that only share an edge do not collide.
    #[inline]
    pub fn collides(&self, other: &Rect) -> bool {
        self.w > 0
            && self.h > 0
            && other.w > 0
            && other.h > 0
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Point containment, half-open on the right and bottom edges.
    /// The point is truncated to the pixel grid first.
    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let (px, py) = point.to_ints();
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

// =============================================================================
// TESTS
// =============================================================================
