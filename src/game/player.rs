//! Player
//!
//! Run, jump, wall slide, wall kick and dash on top of the shared physics
//! body. The player never removes itself; death is reported through the
//! `dead` counter the session watches.

use tracing::{debug, info};

use crate::core::vec2::Vec2;
use crate::game::animation::{Action, Animator};
use crate::game::assets::{AssetCatalog, AssetError};
use crate::game::effects::ParticleKind;
use crate::game::entity::{body_sprite, EntityBehavior, FrameContext, PlayerView, DEATH_SCREENSHAKE};
use crate::game::events::{GameEventData, SoundCue};
use crate::game::physics::PhysicsBody;
use crate::game::render::{DrawCommand, RenderOffset};

/// Regular hitbox.
pub const PLAYER_SIZE: (i32, i32) = (8, 15);

/// Hitbox while dashing.
pub const DASH_SIZE: (i32, i32) = (8, 15);

/// Frames a dash pushes the player.
pub const DASH_ACTIVE_FRAMES: u32 = 10;

/// Frames after a dash before the next one is accepted.
pub const DASH_COOLDOWN_FRAMES: u32 = 50;

/// Air time after which the player is considered lost.
pub const MAX_AIR_TIME: u32 = 160;

/// Air time above which the player counts as airborne.
pub const AIRBORNE_GRACE: u32 = 4;

/// Dash speed from the air.
pub const AIR_DASH_RATIO: i32 = 5;

/// Dash speed from the ground.
pub const GROUND_DASH_RATIO: i32 = 6;

const JUMP_VELOCITY: f32 = -2.5;
const WALL_KICK: Vec2 = Vec2::new(2.0, -2.0);
const WALL_SLIDE_SPEED: f32 = 0.5;
const DRAG: f32 = 0.1;

/// Dash phase bookkeeping.
///
/// `direction != 0` marks a requested or running dash. Active frames are
/// armed on the update after the request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DashState {
    /// -1 left, 1 right, 0 none
    pub direction: i32,
    /// Speed multiplier
    pub ratio: i32,
    /// Active frames left
    pub active_frames: u32,
    /// Cooldown frames left
    pub cooldown_frames: u32,
}

/// The player entity.
#[derive(Clone, Debug)]
pub struct Player {
    body: PhysicsBody,
    animator: Animator,
    /// Frames since last standing on ground
    pub air_time: u32,
    /// Jump charges
    pub jumps: u32,
    /// Clinging to a wall this frame
    pub wall_sliding: bool,
    /// 0 alive; counts frames since death otherwise
    pub dead: u32,
    /// Dash state machine
    pub dash: DashState,
}

impl Player {
    /// Player standing at `pos`.
    pub fn new(pos: Vec2, assets: &AssetCatalog) -> Result<Self, AssetError> {
        let animator = Animator::resolve(
            assets,
            "player",
            &[Action::Idle, Action::Run, Action::Jump, Action::Slide, Action::WallSlide],
            Action::Idle,
        )?;

        Ok(Self {
            body: PhysicsBody::new(pos, PLAYER_SIZE),
            animator,
            air_time: 0,
            jumps: 1,
            wall_sliding: false,
            dead: 0,
            dash: DashState::default(),
        })
    }

    /// Still alive.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.dead == 0
    }

    /// Airborne past the grace window.
    #[inline]
    pub fn is_airborne(&self) -> bool {
        self.air_time > AIRBORNE_GRACE
    }

    /// Snapshot handed to enemies.
    pub fn view(&self) -> PlayerView {
        PlayerView {
            pos: self.body.pos,
            rect: self.body.rect(),
            dash_active_frames: self.dash.active_frames,
        }
    }

    /// Jump, or kick off a wall while wall sliding. Returns whether a jump
    /// happened.
    pub fn jump(&mut self) -> bool {
        if self.wall_sliding {
            let kick = if self.body.flip && self.body.last_movement.x < 0.0 {
                WALL_KICK
            } else if !self.body.flip && self.body.last_movement.x > 0.0 {
                Vec2::new(-WALL_KICK.x, WALL_KICK.y)
            } else {
                return false;
            };
            self.body.velocity = kick;
            self.air_time = AIRBORNE_GRACE + 1;
            self.jumps = self.jumps.saturating_sub(1);
            true
        } else if self.jumps > 0 {
            self.body.velocity.y = JUMP_VELOCITY;
            self.jumps -= 1;
            self.air_time = AIRBORNE_GRACE + 1;
            true
        } else {
            false
        }
    }

    /// Request a dash in the facing direction. Ignored while dead, dashing
    /// or cooling down. Returns whether a dash started.
    pub fn dash(&mut self, ctx: &mut FrameContext<'_>) -> bool {
        if !self.is_alive() || self.dash.direction != 0 || self.dash.cooldown_frames != 0 {
            return false;
        }

        self.dash.direction = if self.body.flip { -1 } else { 1 };
        match self.animator.action() {
            Action::Jump => self.dash.ratio = AIR_DASH_RATIO,
            Action::Idle | Action::Run => self.dash.ratio = GROUND_DASH_RATIO,
            _ => {}
        }
        self.body.size = DASH_SIZE;

        ctx.sound(SoundCue::Dash);
        ctx.effects.dash_burst(self.body.rect().center(), ctx.rng);
        debug!("Dash started: direction {}, ratio {}", self.dash.direction, self.dash.ratio);
        true
    }

    /// Kill the player: screenshake, spark and puff explosion.
    pub fn die(&mut self, ctx: &mut FrameContext<'_>) {
        if !self.is_alive() {
            return;
        }
        ctx.shake(DEATH_SCREENSHAKE);
        self.dead = 1;

        ctx.sound(SoundCue::Hurt);
        ctx.emit(GameEventData::PlayerDied { position: self.body.pos });
        ctx.effects.death_burst(self.body.rect().center(), ctx.rng);
        info!("Player died at {}", self.body.pos);
    }

    fn handle_dash_physics(&mut self, ctx: &mut FrameContext<'_>) {
        if self.dash.cooldown_frames > 0 {
            self.dash.cooldown_frames -= 1;
        } else if self.dash.active_frames > 0 {
            self.dash.active_frames -= 1;
            let direction = self.dash.direction as f32;
            self.body.velocity.x = direction * self.dash.ratio as f32;

            let trail = Vec2::new(direction * ctx.rng.next_f32() * 3.0, 0.0);
            let frame = ctx.rng.next_int_range(0, 7) as u32;
            ctx.effects
                .spawn_particle(ParticleKind::Dash, self.body.rect().center(), trail, frame);

            if self.dash.active_frames == 0 {
                ctx.effects.dash_burst(self.body.rect().center(), ctx.rng);
                self.body.velocity.x = 0.0;
                self.dash = DashState {
                    cooldown_frames: DASH_COOLDOWN_FRAMES,
                    ..DashState::default()
                };
                self.body.size = PLAYER_SIZE;
                debug!("Dash ended");
            }
        } else if self.dash.direction != 0 {
            self.dash.active_frames = DASH_ACTIVE_FRAMES;
        }
    }
}

impl EntityBehavior for Player {
    fn body(&self) -> &PhysicsBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut PhysicsBody {
        &mut self.body
    }

    fn animator(&self) -> &Animator {
        &self.animator
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>, movement: Vec2) -> bool {
        self.body.update(ctx.grid, movement);
        self.animator.update();

        self.handle_dash_physics(ctx);

        self.air_time += 1;
        if self.body.collisions.down {
            self.air_time = 0;
            self.jumps = 1;
        }

        if self.air_time > MAX_AIR_TIME {
            self.die(ctx);
        }

        self.wall_sliding = self.body.collisions.wall() && self.is_airborne();
        if self.wall_sliding {
            self.air_time = AIRBORNE_GRACE + 1;
            self.body.velocity.y = self.body.velocity.y.min(WALL_SLIDE_SPEED);
            self.animator.set_action(Action::WallSlide);
            self.body.flip = self.body.collisions.left;
        } else if self.is_airborne() {
            self.animator.set_action(Action::Jump);
        } else if movement.x != 0.0 {
            self.animator.set_action(Action::Run);
        } else {
            self.animator.set_action(Action::Idle);
        }

        let vx = self.body.velocity.x;
        self.body.velocity.x = if vx > 0.0 {
            (vx - DRAG).max(0.0)
        } else {
            (vx + DRAG).min(0.0)
        };

        false
    }

    fn render(
        &self,
        offset: RenderOffset,
        _assets: &AssetCatalog,
        out: &mut Vec<DrawCommand>,
    ) -> Result<(), AssetError> {
        if self.dash.direction == 0 {
            out.push(body_sprite(&self.body, &self.animator, offset));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
