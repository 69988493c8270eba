//! Enemy
//!
//! Patrolling gunner. Harmless enemies patrol but never shoot. Any enemy
//! touched by a dashing player dies.

use std::f32::consts::PI;

use crate::core::vec2::Vec2;
use crate::game::animation::{Action, Animator};
use crate::game::assets::{AssetCatalog, AssetError};
use crate::game::effects::PROJECTILE_SPEED;
use crate::game::entity::{body_sprite, EntityBehavior, FrameContext, DEATH_SCREENSHAKE};
use crate::game::events::SoundCue;
use crate::game::physics::PhysicsBody;
use crate::game::render::{DrawCommand, RenderOffset, SpriteRef};

/// Enemy hitbox.
pub const ENEMY_SIZE: (i32, i32) = (8, 15);

/// Patrol speed in px/frame.
pub const WALK_SPEED: f32 = 0.5;

/// Frames between shots.
pub const SHOT_COOLDOWN: u32 = 120;

/// Cooldown a fresh enemy starts with.
pub const INITIAL_SHOT_COOLDOWN: u32 = 30;

/// Muzzle distance from the body center.
const MUZZLE_OFFSET: i32 = 7;

/// Ledge check point: ahead of the center and below the top edge.
const LEDGE_CHECK: Vec2 = Vec2::new(7.0, 23.0);

/// Line-of-fire window.
const SIGHT_X: f32 = 100.0;
const SIGHT_Y: f32 = 16.0;

/// Dash frames the player must still have to kill on contact.
const LETHAL_DASH_FRAMES: u32 = 2;

/// The enemy entity.
#[derive(Clone, Debug)]
pub struct Enemy {
    body: PhysicsBody,
    animator: Animator,
    /// Patrol frames left
    pub walking: u32,
    /// Frames until the gun may fire
    pub shot_cooldown: u32,
    /// Never shoots
    pub harmless: bool,
}

impl Enemy {
    /// Enemy standing at `pos`.
    pub fn new(pos: Vec2, harmless: bool, assets: &AssetCatalog) -> Result<Self, AssetError> {
        let asset = if harmless { "harmless_enemy" } else { "enemy" };
        let animator = Animator::resolve(assets, asset, &[Action::Idle, Action::Run], Action::Idle)?;

        Ok(Self {
            body: PhysicsBody::new(pos, ENEMY_SIZE),
            animator,
            walking: 0,
            shot_cooldown: INITIAL_SHOT_COOLDOWN,
            harmless,
        })
    }

    /// Count the gun down and maybe fire at the player. Returns whether a
    /// projectile was spawned.
    ///
    /// A roll is only made while the gun is ready and the player is in the
    /// line-of-fire window.
    pub(crate) fn handle_shooting(&mut self, ctx: &mut FrameContext<'_>) -> bool {
        let distance = ctx.player.pos - self.body.pos;
        self.shot_cooldown = self.shot_cooldown.saturating_sub(1);

        if self.shot_cooldown != 0 {
            return false;
        }
        if distance.y.abs() >= SIGHT_Y || distance.x.abs() >= SIGHT_X {
            return false;
        }
        if ctx.rng.next_f32() * 1000.0 <= 985.0 || distance.x == 0.0 {
            return false;
        }

        let rect = self.body.rect();
        let (muzzle_x, velocity, spark_angle) = if self.body.flip && distance.x < 0.0 {
            (rect.center_x() - MUZZLE_OFFSET, -PROJECTILE_SPEED, PI)
        } else if !self.body.flip && distance.x > 0.0 {
            (rect.center_x() + MUZZLE_OFFSET, PROJECTILE_SPEED, 0.0)
        } else {
            return false;
        };

        let muzzle = Vec2::from_ints(muzzle_x, rect.center_y());
        ctx.effects.spawn_projectile(muzzle, velocity);
        self.shot_cooldown = SHOT_COOLDOWN;
        ctx.sound(SoundCue::Shoot);
        ctx.effects.spark_fan(muzzle, spark_angle, ctx.rng);
        true
    }

    /// Movement for this frame: walk forward while patrolling, turning at
    /// walls and ledges; otherwise maybe start a new patrol.
    fn patrol(&mut self, ctx: &mut FrameContext<'_>, movement: Vec2) -> Vec2 {
        if self.walking == 0 {
            if ctx.rng.next_f32() < 0.01 {
                self.walking = ctx.rng.next_int_range(30, 90) as u32;
            }
            return movement;
        }

        if self.body.collisions.wall() {
            self.body.flip = !self.body.flip;
        } else {
            let ahead = if self.body.flip { -LEDGE_CHECK.x } else { LEDGE_CHECK.x };
            let check = Vec2::new(
                self.body.rect().center_x() as f32 + ahead,
                self.body.pos.y + LEDGE_CHECK.y,
            );
            if !ctx.grid.is_solid_at(check) {
                self.body.flip = !self.body.flip;
            }
        }

        self.walking -= 1;
        let step = if self.body.flip { -WALK_SPEED } else { WALK_SPEED };
        Vec2::new(movement.x + step, movement.y)
    }
}

impl EntityBehavior for Enemy {
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
        if !self.harmless {
            self.handle_shooting(ctx);
        }

        let movement = self.patrol(ctx, movement);

        self.body.update(ctx.grid, movement);
        self.animator.update();

        if movement.x != 0.0 {
            self.animator.set_action(Action::Run);
        } else {
            self.animator.set_action(Action::Idle);
        }

        if ctx.player.dash_active_frames > LETHAL_DASH_FRAMES
            && self.body.rect().collides(&ctx.player.rect)
        {
            let center = self.body.rect().center();
            ctx.sound(SoundCue::Hit);
            ctx.effects.death_burst(center, ctx.rng);
            let speed = ctx.rng.next_f32() + 5.0;
            ctx.effects.spawn_spark(center, 0.0, speed);
            let speed = ctx.rng.next_f32() + 5.0;
            ctx.effects.spawn_spark(center, PI, speed);
            ctx.shake(DEATH_SCREENSHAKE);
            return true;
        }

        false
    }

    fn render(
        &self,
        offset: RenderOffset,
        assets: &AssetCatalog,
        out: &mut Vec<DrawCommand>,
    ) -> Result<(), AssetError> {
        out.push(body_sprite(&self.body, &self.animator, offset));

        if !self.harmless {
            let gun = assets.image("gun")?;
            let rect = self.body.rect();
            let gun_offset = if self.body.flip { -4 - gun.w as i32 } else { 4 };
            let world = Vec2::from_ints(rect.center_x() + gun_offset, rect.center_y());
            out.push(DrawCommand::Sprite {
                sprite: SpriteRef::Single { asset: "gun" },
                pos: offset.apply(world),
                flip: self.body.flip,
            });
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rect::Rect;
    use crate::game::entity::testing::TestWorld;
    use crate::game::entity::PlayerView;
    use crate::game::tilemap::{TileGrid, TileKind};

    fn enemy_at(x: f32, y: f32, harmless: bool) -> Enemy {
        Enemy::new(Vec2::new(x, y), harmless, &AssetCatalog::standard()).unwrap()
    }

    fn player_view(pos: Vec2) -> PlayerView {
        PlayerView {
            pos,
            rect: Rect::from_pos(pos, (8, 15)),
            dash_active_frames: 0,
        }
    }

    #[test]
    fn test_seeded_shooting_scenario() {
        let mut world = TestWorld::new(TileGrid::new(16), 0xC0FFEE);
        let mut oracle = world.rng.clone();

        let mut enemy = enemy_at(100.0, 50.0, false);
        enemy.shot_cooldown = 0;
        // Facing right, player 50 px ahead and 5 px lower
        let view = player_view(Vec2::new(150.0, 55.0));

        let mut fired_frames = Vec::new();
        let mut expected_frames = Vec::new();

        for frame in 0..1000u32 {
            let ready = enemy.shot_cooldown <= 1;
            if ready {
                let roll = oracle.next_f32();
                if roll * 1000.0 > 985.0 {
                    expected_frames.push(frame);
                    // Muzzle spark draws
                    for _ in 0..8 {
                        oracle.next_f32();
                    }
                }
            }

            let before = world.effects.projectiles.len();
            let mut ctx = world.ctx(view);
            let fired = enemy.handle_shooting(&mut ctx);
            assert_eq!(world.effects.projectiles.len(), before + fired as usize);

            if fired {
                fired_frames.push(frame);
                assert_eq!(enemy.shot_cooldown, SHOT_COOLDOWN);
            }
        }

        assert_eq!(fired_frames, expected_frames);
        assert!(!fired_frames.is_empty());
        assert_eq!(world.rng, oracle);

        let projectile = &world.effects.projectiles[0];
        assert_eq!(projectile.velocity, PROJECTILE_SPEED);
        assert_eq!(projectile.pos, Vec2::new(111.0, 57.0));
        assert_eq!(world.effects.sparks.len(), 4 * fired_frames.len());
    }

    #[test]
    fn test_no_shot_when_facing_away() {
        let mut world = TestWorld::new(TileGrid::new(16), 5);
        let mut enemy = enemy_at(100.0, 50.0, false);
        enemy.body_mut().flip = true;
        let view = player_view(Vec2::new(150.0, 50.0));

        for _ in 0..2000 {
            enemy.shot_cooldown = 0;
            let mut ctx = world.ctx(view);
            assert!(!enemy.handle_shooting(&mut ctx));
        }
        assert!(world.effects.projectiles.is_empty());
    }

    #[test]
    fn test_out_of_range_does_not_roll() {
        let mut world = TestWorld::new(TileGrid::new(16), 5);
        let untouched = world.rng.clone();
        let mut enemy = enemy_at(100.0, 50.0, false);
        enemy.shot_cooldown = 0;

        let mut ctx = world.ctx(player_view(Vec2::new(100.0, 80.0)));
        assert!(!enemy.handle_shooting(&mut ctx));
        assert_eq!(world.rng, untouched);
    }

    #[test]
    fn test_flipped_shot_goes_left() {
        let mut world = TestWorld::new(TileGrid::new(16), 0);
        let mut enemy = enemy_at(100.0, 50.0, false);
        enemy.body_mut().flip = true;
        let view = player_view(Vec2::new(60.0, 50.0));

        let mut fired = false;
        for _ in 0..5000 {
            enemy.shot_cooldown = 0;
            let mut ctx = world.ctx(view);
            if enemy.handle_shooting(&mut ctx) {
                fired = true;
                break;
            }
        }
        assert!(fired);
        let projectile = &world.effects.projectiles[0];
        assert_eq!(projectile.velocity, -PROJECTILE_SPEED);
        assert_eq!(projectile.pos, Vec2::new(97.0, 57.0));
        assert!(world.sounds().contains(&SoundCue::Shoot));
    }

    #[test]
    fn test_turns_at_ledge() {
        let mut grid = TileGrid::new(16);
        grid.place_on_grid((0, 2), TileKind::Stone, 0);
        grid.place_on_grid((1, 2), TileKind::Stone, 0);
        let mut world = TestWorld::new(grid, 9);

        // Near the right end of the ledge, facing right; the check point lands on x = 37
        let mut enemy = enemy_at(26.0, 17.0, true);
        enemy.walking = 10;

        let mut ctx = world.ctx(player_view(Vec2::new(500.0, 500.0)));
        enemy.update(&mut ctx, Vec2::ZERO);
        assert!(enemy.body().flip);
        assert_eq!(enemy.walking, 9);
        assert_eq!(enemy.body().pos.x, 25.5);
        assert_eq!(enemy.animator().action(), Action::Run);
    }

    #[test]
    fn test_turns_at_wall() {
        let mut grid = TileGrid::new(16);
        for x in 0..4 {
            grid.place_on_grid((x, 2), TileKind::Stone, 0);
        }
        let mut world = TestWorld::new(grid, 9);
        let mut enemy = enemy_at(20.0, 17.0, true);
        enemy.walking = 10;
        enemy.body_mut().collisions.right = true;

        let mut ctx = world.ctx(player_view(Vec2::new(500.0, 500.0)));
        enemy.update(&mut ctx, Vec2::ZERO);
        assert!(enemy.body().flip);
    }

    #[test]
    fn test_idle_enemy_may_start_patrol() {
        let mut world = TestWorld::new(TileGrid::new(16), 1234);
        let mut enemy = enemy_at(0.0, 0.0, true);
        let mut started = false;
        for _ in 0..2000 {
            let mut ctx = world.ctx(player_view(Vec2::new(500.0, 500.0)));
            enemy.update(&mut ctx, Vec2::ZERO);
            if enemy.walking > 0 {
                assert!((29..=90).contains(&enemy.walking));
                started = true;
                break;
            }
        }
        assert!(started);
    }

    #[test]
    fn test_dashing_player_kills_on_contact() {
        let mut world = TestWorld::new(TileGrid::new(16), 77);
        let mut enemy = enemy_at(0.0, 0.0, true);
        let mut view = player_view(Vec2::new(4.0, 0.0));

        view.dash_active_frames = 2;
        let mut ctx = world.ctx(view);
        assert!(!enemy.update(&mut ctx, Vec2::ZERO));

        // Contact test uses the rect after this frame's physics step
        let mut view = player_view(enemy.body().pos + Vec2::new(4.0, 0.0));
        view.dash_active_frames = 3;
        let mut ctx = world.ctx(view);
        assert!(enemy.update(&mut ctx, Vec2::ZERO));
        assert_eq!(world.screenshake, DEATH_SCREENSHAKE);
        assert_eq!(world.effects.sparks.len(), 32);
        assert_eq!(world.effects.particles.len(), 30);
        assert_eq!(world.sounds(), vec![SoundCue::Hit]);
    }

    #[test]
    fn test_gun_rendered_on_facing_side() {
        let assets = AssetCatalog::standard();
        let mut enemy = enemy_at(0.0, 0.0, false);
        let mut out = Vec::new();
        enemy.render(RenderOffset::default(), &assets, &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert!(matches!(
            out[1],
            DrawCommand::Sprite { pos, flip: false, .. } if pos == Vec2::new(8.0, 7.0)
        ));

        enemy.body_mut().flip = true;
        out.clear();
        enemy.render(RenderOffset::default(), &assets, &mut out).unwrap();
        // 4 + gun width to the left of the center
        assert!(matches!(
            out[1],
            DrawCommand::Sprite { pos, flip: true, .. } if pos == Vec2::new(-7.0, 7.0)
        ));

        let harmless = enemy_at(0.0, 0.0, true);
        out.clear();
        harmless.render(RenderOffset::default(), &assets, &mut out).unwrap();
        assert_eq!(out.len(), 1);
    }
}
