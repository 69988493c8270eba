//! Entity Behaviors
//!
//! Player and enemies share a [`PhysicsBody`] and an [`Animator`]; what
//! differs is their per-frame behavior. Everything an entity may touch
//! during its update is handed in through a [`FrameContext`].

use crate::core::rect::Rect;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::animation::Animator;
use crate::game::assets::{AssetCatalog, AssetError};
use crate::game::effects::Effects;
use crate::game::events::{GameEvent, GameEventData, SoundCue};
use crate::game::physics::PhysicsBody;
use crate::game::render::{DrawCommand, RenderOffset, SpriteRef};
use crate::game::tilemap::TileGrid;

/// Sprite images are larger than hitboxes; this aligns them.
pub const ANIM_OFFSET: Vec2 = Vec2::new(-3.0, -3.0);

/// Screenshake frames raised on any death.
pub const DEATH_SCREENSHAKE: u32 = 16;

/// What enemies need to know about the player this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerView {
    /// Top-left corner
    pub pos: Vec2,
    /// Hitbox
    pub rect: Rect,
    /// Remaining active dash frames
    pub dash_active_frames: u32,
}

/// World state borrowed by an entity for one update.
pub struct FrameContext<'a> {
    /// Level geometry
    pub grid: &'a TileGrid,
    /// Transient pools
    pub effects: &'a mut Effects,
    /// Session RNG
    pub rng: &'a mut DeterministicRng,
    /// Frames of screenshake left
    pub screenshake: &'a mut u32,
    /// Events emitted this tick
    pub events: &'a mut Vec<GameEvent>,
    /// Current tick
    pub tick: u32,
    /// Player snapshot taken before the entity pass
    pub player: PlayerView,
}

impl<'a> FrameContext<'a> {
    /// Raise screenshake to at least `frames`.
    #[inline]
    pub fn shake(&mut self, frames: u32) {
        *self.screenshake = (*self.screenshake).max(frames);
    }

    /// Emit an event stamped with the current tick.
    pub fn emit(&mut self, data: GameEventData) {
        self.events.push(GameEvent::new(self.tick, data));
    }

    /// Emit a sound cue.
    pub fn sound(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::sound(self.tick, cue));
    }
}

/// Per-kind behavior run on top of the shared physics step.
pub trait EntityBehavior {
    /// Shared physics state.
    fn body(&self) -> &PhysicsBody;

    /// Shared physics state, mutably.
    fn body_mut(&mut self) -> &mut PhysicsBody;

    /// Animation state.
    fn animator(&self) -> &Animator;

    /// Advance one frame. Returns true when the owner should remove the
    /// entity.
    fn update(&mut self, ctx: &mut FrameContext<'_>, movement: Vec2) -> bool;

    /// Append this entity's draw commands.
    fn render(
        &self,
        offset: RenderOffset,
        assets: &AssetCatalog,
        out: &mut Vec<DrawCommand>,
    ) -> Result<(), AssetError>;
}

/// Current animation frame at the body's position, mirrored when facing left.
pub fn body_sprite(body: &PhysicsBody, animator: &Animator, offset: RenderOffset) -> DrawCommand {
    DrawCommand::Sprite {
        sprite: SpriteRef::Animated {
            asset: animator.asset(),
            action: animator.action().name(),
            frame: animator.animation().image_index(),
        },
        pos: offset.apply(body.pos) + ANIM_OFFSET,
        flip: body.flip,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Owned world for driving entities outside a session.

    use super::*;
    use crate::game::effects::ParticleTimings;

    pub struct TestWorld {
        pub grid: TileGrid,
        pub effects: Effects,
        pub rng: DeterministicRng,
        pub screenshake: u32,
        pub events: Vec<GameEvent>,
        pub tick: u32,
    }

    impl TestWorld {
        pub fn new(grid: TileGrid, seed: u64) -> Self {
            let timings = ParticleTimings::resolve(&AssetCatalog::standard()).unwrap();
            Self {
                grid,
                effects: Effects::new(timings),
                rng: DeterministicRng::new(seed),
                screenshake: 0,
                events: Vec::new(),
                tick: 0,
            }
        }

        pub fn ctx(&mut self, player: PlayerView) -> FrameContext<'_> {
            FrameContext {
                grid: &self.grid,
                effects: &mut self.effects,
                rng: &mut self.rng,
                screenshake: &mut self.screenshake,
                events: &mut self.events,
                tick: self.tick,
                player,
            }
        }

        pub fn sounds(&self) -> Vec<SoundCue> {
            self.events.iter().filter_map(GameEvent::sound_cue).collect()
        }
    }
}
