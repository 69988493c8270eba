//! Transient Objects
//!
//! Particles, sparks and projectiles. Each kind lives in its own pool owned
//! by the level session. A member's `update` reports expiry; the pool
//! removes expired members after the whole pass, so a pass never skips or
//! revisits an element while the pool is being edited.

use std::f32::consts::PI;

use crate::core::rect::Rect;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::animation::{Animation, AnimationTiming};
use crate::game::assets::{AssetCatalog, AssetError};
use crate::game::render::{DrawCommand, RenderOffset, SpriteRef};
use crate::game::tilemap::TileGrid;

/// Spark speed lost per frame.
pub const SPARK_DECAY: f32 = 0.1;

/// Frames a projectile lives without hitting anything.
pub const PROJECTILE_TTL: u32 = 180;

/// Projectile speed in px/frame.
pub const PROJECTILE_SPEED: f32 = 1.5;

/// Sparks per projectile impact or muzzle flash.
pub const IMPACT_SPARKS: usize = 4;

// =============================================================================
// PARTICLE
// =============================================================================

/// Animated particle kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    /// Falling leaf from a tree
    Leaf,
    /// Dash trail / burst puff
    Dash,
}

impl ParticleKind {
    /// Action name inside the `particles` animation set.
    pub fn name(self) -> &'static str {
        match self {
            ParticleKind::Leaf => "leaf",
            ParticleKind::Dash => "dash",
        }
    }
}

/// Particle animation timings, resolved once per session.
#[derive(Clone, Copy, Debug)]
pub struct ParticleTimings {
    leaf: AnimationTiming,
    dash: AnimationTiming,
}

impl ParticleTimings {
    /// Look up both particle animations.
    pub fn resolve(assets: &AssetCatalog) -> Result<Self, AssetError> {
        Ok(Self {
            leaf: AnimationTiming::from_spec(assets.animation("particles", "leaf")?),
            dash: AnimationTiming::from_spec(assets.animation("particles", "dash")?),
        })
    }

    fn get(&self, kind: ParticleKind) -> AnimationTiming {
        match kind {
            ParticleKind::Leaf => self.leaf,
            ParticleKind::Dash => self.dash,
        }
    }
}

/// Moving one-shot animation.
#[derive(Clone, Debug)]
pub struct Particle {
    /// Kind
    pub kind: ParticleKind,
    /// Center position
    pub pos: Vec2,
    /// Per-frame displacement
    pub velocity: Vec2,
    /// Frame counter
    pub animation: Animation,
}

impl Particle {
    /// Advance one frame. Returns true when the particle has expired: its
    /// animation had already finished before this update.
    pub fn update(&mut self) -> bool {
        let kill = self.animation.done();
        self.pos += self.velocity;
        self.animation.update();
        kill
    }

    /// Centered sprite.
    pub fn render(&self, offset: RenderOffset, assets: &AssetCatalog) -> Result<DrawCommand, AssetError> {
        let frame = self.animation.image_index();
        let size = assets.animation_frame("particles", self.kind.name(), frame)?;
        let screen = offset.apply(self.pos);
        let pos = Vec2::new(
            screen.x - (size.w / 2) as f32,
            screen.y - (size.h / 2) as f32,
        );
        Ok(DrawCommand::sprite(
            SpriteRef::Animated { asset: "particles", action: self.kind.name(), frame },
            pos,
        ))
    }
}

// =============================================================================
// SPARK
// =============================================================================

/// Streak that flies along an angle and slows down until it vanishes.
#[derive(Clone, Debug, PartialEq)]
pub struct Spark {
    /// Position
    pub pos: Vec2,
    /// Direction in radians
    pub angle: f32,
    /// Current speed
    pub speed: f32,
    /// Speed lost per frame
    pub decay: f32,
}

impl Spark {
    /// New spark with the standard decay.
    pub fn new(pos: Vec2, angle: f32, speed: f32) -> Self {
        Self {
            pos,
            angle,
            speed,
            decay: SPARK_DECAY,
        }
    }

    /// Advance one frame. Returns true once the spark has stopped.
    pub fn update(&mut self) -> bool {
        self.pos += Vec2::from_angle(self.angle).scale(self.speed);
        self.speed = (self.speed - self.decay).max(0.0);
        self.speed == 0.0
    }

    /// Diamond stretched along the flight direction.
    pub fn render(&self, offset: RenderOffset) -> DrawCommand {
        let center = offset.apply(self.pos);
        let point = |angle: f32, length: f32| center + Vec2::from_angle(angle).scale(length);
        DrawCommand::Polygon {
            points: [
                point(self.angle, self.speed * 3.0),
                point(self.angle + PI * 0.5, self.speed * 0.5),
                point(self.angle + PI, self.speed * 3.0),
                point(self.angle - PI * 0.5, self.speed * 0.5),
            ],
        }
    }
}

// =============================================================================
// PROJECTILE
// =============================================================================

/// Horizontal enemy bullet.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    /// Center position
    pub pos: Vec2,
    /// Horizontal speed (signed)
    pub velocity: f32,
    /// Frames left to live
    pub timer: u32,
}

impl Projectile {
    /// New projectile with the standard lifetime.
    pub fn new(pos: Vec2, velocity: f32) -> Self {
        Self {
            pos,
            velocity,
            timer: PROJECTILE_TTL,
        }
    }

    /// Move one frame and count down. Returns true once the timer ran out.
    pub fn update(&mut self) -> bool {
        self.pos.x += self.velocity;
        self.timer = self.timer.saturating_sub(1);
        self.timer == 0
    }

    /// Centered sprite.
    pub fn render(&self, offset: RenderOffset, assets: &AssetCatalog) -> Result<DrawCommand, AssetError> {
        let size = assets.image("projectile")?;
        let screen = offset.apply(self.pos);
        Ok(DrawCommand::sprite(
            SpriteRef::Single { asset: "projectile" },
            Vec2::new(screen.x - size.w as f32 / 2.0, screen.y - size.h as f32 / 2.0),
        ))
    }
}

/// What the projectile pass did this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProjectileReport {
    /// Projectiles that hit a solid tile
    pub wall_hits: usize,
    /// A projectile struck the player
    pub player_hit: bool,
}

// =============================================================================
// POOLS
// =============================================================================

/// Apply `step` to every element present at the start of the pass, then
/// drop the ones it flagged. Elements pushed by `step` are not visited.
fn sweep<T>(items: &mut Vec<T>, mut step: impl FnMut(&mut T) -> bool) {
    let len = items.len();
    let mut expired = Vec::new();
    for index in 0..len {
        if step(&mut items[index]) {
            expired.push(index);
        }
    }
    for index in expired.into_iter().rev() {
        items.remove(index);
    }
}

/// All transient objects of a level.
#[derive(Clone, Debug)]
pub struct Effects {
    /// Animated particles
    pub particles: Vec<Particle>,
    /// Sparks
    pub sparks: Vec<Spark>,
    /// Enemy projectiles
    pub projectiles: Vec<Projectile>,
    timings: ParticleTimings,
}

impl Effects {
    /// Empty pools.
    pub fn new(timings: ParticleTimings) -> Self {
        Self {
            particles: Vec::new(),
            sparks: Vec::new(),
            projectiles: Vec::new(),
            timings,
        }
    }

    /// Drop every transient object.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.sparks.clear();
        self.projectiles.clear();
    }

    // ===== SPAWNING =====

    /// Spawn a particle starting at animation tick `frame`.
    pub fn spawn_particle(&mut self, kind: ParticleKind, pos: Vec2, velocity: Vec2, frame: u32) {
        self.particles.push(Particle {
            kind,
            pos,
            velocity,
            animation: Animation::starting_at(self.timings.get(kind), frame),
        });
    }

    /// Spawn a spark.
    pub fn spawn_spark(&mut self, pos: Vec2, angle: f32, speed: f32) {
        self.sparks.push(Spark::new(pos, angle, speed));
    }

    /// Spawn a projectile.
    pub fn spawn_projectile(&mut self, pos: Vec2, velocity: f32) {
        self.projectiles.push(Projectile::new(pos, velocity));
    }

    /// 20 dash puffs flying out in random directions.
    pub fn dash_burst(&mut self, center: Vec2, rng: &mut DeterministicRng) {
        for _ in 0..20 {
            let angle = rng.next_angle();
            let speed = rng.next_f32() * 0.5 + 0.5;
            let frame = rng.next_int_range(0, 7) as u32;
            self.spawn_particle(ParticleKind::Dash, center, Vec2::from_angle(angle).scale(speed), frame);
        }
    }

    /// 30 sparks plus 30 puffs, used when anything dies.
    pub fn death_burst(&mut self, center: Vec2, rng: &mut DeterministicRng) {
        for _ in 0..30 {
            let angle = rng.next_angle();
            let speed = rng.next_f32() + 2.0;
            self.spawn_spark(center, angle, speed);

            let speed = rng.next_f32() * 5.0;
            let frame = rng.next_int_range(0, 7) as u32;
            self.spawn_particle(ParticleKind::Dash, center, Vec2::from_angle(angle).scale(speed), frame);
        }
    }

    /// Four sparks fanned around `base_angle`.
    pub fn spark_fan(&mut self, pos: Vec2, base_angle: f32, rng: &mut DeterministicRng) {
        for _ in 0..IMPACT_SPARKS {
            let angle = rng.next_f32() - 0.5 + base_angle;
            let speed = rng.next_f32() + 2.0;
            self.spawn_spark(pos, angle, speed);
        }
    }

    // ===== UPDATE =====

    /// Move projectiles and resolve their hits.
    ///
    /// A projectile ends on a solid tile (with a spark fan flying back
    /// toward the shooter), when its timer runs out, or on the player's
    /// hitbox. `player` is `None` while the player is dead or dashing.
    pub fn update_projectiles(
        &mut self,
        grid: &TileGrid,
        player: Option<Rect>,
        rng: &mut DeterministicRng,
        offset: RenderOffset,
        assets: &AssetCatalog,
        draw: &mut Vec<DrawCommand>,
    ) -> Result<ProjectileReport, AssetError> {
        let mut report = ProjectileReport::default();
        let mut impacts = Vec::new();
        let mut render_error = None;

        sweep(&mut self.projectiles, |projectile| {
            let expired = projectile.update();
            match projectile.render(offset, assets) {
                Ok(command) => draw.push(command),
                Err(e) => {
                    render_error.get_or_insert(e);
                }
            }

            if grid.is_solid_at(projectile.pos) {
                let back = if projectile.velocity > 0.0 { PI } else { 0.0 };
                impacts.push((projectile.pos, back));
                true
            } else if expired {
                true
            } else if let Some(hitbox) = player.filter(|_| !report.player_hit) {
                if hitbox.contains_point(projectile.pos) {
                    report.player_hit = true;
                    true
                } else {
                    false
                }
            } else {
                false
            }
        });

        if let Some(e) = render_error {
            return Err(e);
        }

        report.wall_hits = impacts.len();
        for (pos, angle) in impacts {
            self.spark_fan(pos, angle, rng);
        }

        Ok(report)
    }

    /// Advance sparks, drawing each one (expiring ones included).
    pub fn update_sparks(&mut self, offset: RenderOffset, draw: &mut Vec<DrawCommand>) {
        sweep(&mut self.sparks, |spark| {
            let expired = spark.update();
            draw.push(spark.render(offset));
            expired
        });
    }

    /// Advance particles, drawing each one. Leaves sway sideways.
    pub fn update_particles(
        &mut self,
        offset: RenderOffset,
        assets: &AssetCatalog,
        draw: &mut Vec<DrawCommand>,
    ) -> Result<(), AssetError> {
        let mut render_error = None;

        sweep(&mut self.particles, |particle| {
            let expired = particle.update();
            match particle.render(offset, assets) {
                Ok(command) => draw.push(command),
                Err(e) => {
                    render_error.get_or_insert(e);
                }
            }
            if particle.kind == ParticleKind::Leaf {
                particle.pos.x += (particle.animation.frame() as f32 * 0.035).sin() * 0.3;
            }
            expired
        });

        match render_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
