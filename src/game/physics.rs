//! Physics Body
//!
//! Generic AABB mover shared by every entity. Movement is resolved one
//! axis at a time against the solid tiles around the body.

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::tilemap::TileGrid;

#[cfg(feature = "debug-tracing")]
use tracing::trace;

/// Gravity added to vertical velocity every update.
pub const GRAVITY: f32 = 0.1;

/// Terminal fall speed.
pub const MAX_FALL_SPEED: f32 = 5.0;

/// Which sides touched a solid tile during the last update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionFlags {
    /// Head bumped a ceiling
    pub up: bool,
    /// Landed on ground
    pub down: bool,
    /// Pushed against a wall on the left
    pub left: bool,
    /// Pushed against a wall on the right
    pub right: bool,
}

impl CollisionFlags {
    /// Touching a wall on either side.
    #[inline]
    pub fn wall(&self) -> bool {
        self.left || self.right
    }
}

/// Position, size, velocity and contact state of an entity.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsBody {
    /// Top-left corner, world pixels
    pub pos: Vec2,
    /// Hitbox size
    pub size: (i32, i32),
    /// Carried velocity (gravity, knockback, dash)
    pub velocity: Vec2,
    /// Contacts from the last update
    pub collisions: CollisionFlags,
    /// Facing left
    pub flip: bool,
    /// Movement input of the last update
    pub last_movement: Vec2,
}

impl PhysicsBody {
    /// Body at rest.
    pub fn new(pos: Vec2, size: (i32, i32)) -> Self {
        Self {
            pos,
            size,
            velocity: Vec2::ZERO,
            collisions: CollisionFlags::default(),
            flip: false,
            last_movement: Vec2::ZERO,
        }
    }

    /// Current hitbox.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_pos(self.pos, self.size)
    }

    /// Move by `movement + velocity`, resolve collisions, apply gravity.
    ///
    /// Collision flags are rebuilt from scratch on every call. Overlaps
    /// are resolved in tile order; later tiles win.
    pub fn update(&mut self, grid: &TileGrid, movement: Vec2) {
        self.collisions = CollisionFlags::default();
        let frame_movement = movement + self.velocity;

        // X axis
        self.pos.x += frame_movement.x;
        let mut hitbox = self.rect();
        for tile in grid.physics_rects_around(self.pos) {
            if hitbox.collides(&tile) {
                if frame_movement.x > 0.0 {
                    hitbox.set_right(tile.left());
                    self.collisions.right = true;
                } else if frame_movement.x < 0.0 {
                    hitbox.set_left(tile.right());
                    self.collisions.left = true;
                }
                self.pos.x = hitbox.x as f32;

                #[cfg(feature = "debug-tracing")]
                trace!("X collision with {:?}, x -> {}", tile, hitbox.x);
            }
        }

        // Y axis
        self.pos.y += frame_movement.y;
        let mut hitbox = self.rect();
        for tile in grid.physics_rects_around(self.pos) {
            if hitbox.collides(&tile) {
                if frame_movement.y > 0.0 {
                    hitbox.set_bottom(tile.top());
                    self.collisions.down = true;
                }
                if frame_movement.y < 0.0 {
                    hitbox.set_top(tile.bottom());
                    self.collisions.up = true;
                }
                self.pos.y = hitbox.y as f32;

                #[cfg(feature = "debug-tracing")]
                trace!("Y collision with {:?}, y -> {}", tile, hitbox.y);
            }
        }

        if movement.x > 0.0 {
            self.flip = false;
        }
        if movement.x < 0.0 {
            self.flip = true;
        }

        self.last_movement = movement;

        self.velocity.y = (self.velocity.y + GRAVITY).min(MAX_FALL_SPEED);
        if self.collisions.down || self.collisions.up {
            self.velocity.y = 0.0;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
