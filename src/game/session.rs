//! Level Session State
//!
//! Everything that lives for one run of the game: the loaded level, its
//! entities and transient pools, the camera and the level-flow counters.
//! A level (re)load discards the per-level parts wholesale.

use tracing::info;

use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::rect::Rect;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::assets::{AssetCatalog, AssetError};
use crate::game::effects::{Effects, ParticleTimings};
use crate::game::enemy::Enemy;
use crate::game::entity::EntityBehavior;
use crate::game::events::GameEvent;
use crate::game::level::{extract_layout, LevelSource, LEVELS_ORDER};
use crate::game::physics::PhysicsBody;
use crate::game::player::Player;
use crate::game::render::RenderOffset;
use crate::game::tilemap::{TileGrid, TilemapError};

/// Value `transition` is reset to on every level load.
pub const TRANSITION_START: i32 = -30;

/// Camera catches up 1/CAMERA_LAG of the distance per frame.
pub const CAMERA_LAG: f32 = 30.0;

// =============================================================================
// CONFIG / ERRORS
// =============================================================================

/// Session configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Logical display size in pixels
    pub display_size: (u32, u32),
    /// Level identifiers in play order
    pub levels: Vec<String>,
    /// Index of the first level
    pub start_level: usize,
    /// Seed for every random roll
    pub rng_seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_size: (320, 240),
            levels: LEVELS_ORDER.iter().map(|id| id.to_string()).collect(),
            start_level: 0,
            rng_seed: 0,
        }
    }
}

/// Session failures. None of them are recoverable mid-frame.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Level map could not be loaded.
    #[error("Level load failed: {0}")]
    Tilemap(#[from] TilemapError),

    /// Asset lookup failed.
    #[error("Asset lookup failed: {0}")]
    Asset(#[from] AssetError),

    /// Level order is empty.
    #[error("No levels configured")]
    NoLevels,

    /// Level index outside the level order.
    #[error("Level index {index} out of range ({count} levels)")]
    LevelOutOfRange {
        /// Requested index
        index: usize,
        /// Configured level count
        count: usize,
    },
}

// =============================================================================
// SESSION
// =============================================================================

/// Running game.
pub struct LevelSession<S: LevelSource> {
    /// Configuration
    pub config: SessionConfig,
    source: S,
    pub(crate) assets: AssetCatalog,

    /// Current tick
    pub tick: u32,
    /// Session RNG
    pub rng: DeterministicRng,

    /// Loaded level map (markers removed)
    pub grid: TileGrid,
    /// Index into the level order
    pub level: usize,
    /// Player
    pub player: Player,
    /// Live enemies
    pub enemies: Vec<Enemy>,
    /// Particles, sparks and projectiles
    pub effects: Effects,
    /// Leaf emitter areas
    pub leaf_spawners: Vec<Rect>,

    /// Camera top-left corner
    pub scroll: Vec2,
    /// Frames of screenshake left
    pub screenshake: u32,
    /// Level transition counter; 0 means fully visible
    pub transition: i32,

    pending_events: Vec<GameEvent>,
}

impl<S: LevelSource> LevelSession<S> {
    /// Start a session on `config.start_level`.
    pub fn new(config: SessionConfig, source: S, assets: AssetCatalog) -> Result<Self, SessionError> {
        if config.levels.is_empty() {
            return Err(SessionError::NoLevels);
        }
        let timings = ParticleTimings::resolve(&assets)?;
        let player = Player::new(Vec2::ZERO, &assets)?;

        let mut session = Self {
            rng: DeterministicRng::new(config.rng_seed),
            level: config.start_level,
            config,
            source,
            assets,
            tick: 0,
            grid: TileGrid::default(),
            player,
            enemies: Vec::new(),
            effects: Effects::new(timings),
            leaf_spawners: Vec::new(),
            scroll: Vec2::ZERO,
            screenshake: 0,
            transition: TRANSITION_START,
            pending_events: Vec::new(),
        };
        session.load_level(session.level)?;
        Ok(session)
    }

    /// Load (or reload) a level, replacing every per-level object.
    pub fn load_level(&mut self, index: usize) -> Result<(), SessionError> {
        let count = self.config.levels.len();
        let id = self
            .config
            .levels
            .get(index)
            .ok_or(SessionError::LevelOutOfRange { index, count })?
            .clone();

        let mut grid = self.source.load(&id)?;
        let layout = extract_layout(&mut grid);

        let player = Player::new(layout.player_spawn, &self.assets)?;
        let enemies = layout
            .enemies
            .iter()
            .map(|spawn| Enemy::new(spawn.pos, spawn.harmless, &self.assets))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Loaded level {} ({}): {} enemies, {} leaf spawners",
            index,
            id,
            enemies.len(),
            layout.leaf_spawners.len()
        );

        self.grid = grid;
        self.level = index;
        self.player = player;
        self.enemies = enemies;
        self.leaf_spawners = layout.leaf_spawners;
        self.effects.clear();
        self.scroll = self.camera_target();
        self.transition = TRANSITION_START;
        self.push_event(GameEvent::level_loaded(self.tick, index, id));
        Ok(())
    }

    /// Identifier of the current level.
    pub fn level_id(&self) -> &str {
        &self.config.levels[self.level]
    }

    /// Asset catalog in use.
    pub fn assets(&self) -> &AssetCatalog {
        &self.assets
    }

    // ===== CAMERA =====

    /// Scroll that centers the player on screen.
    pub fn camera_target(&self) -> Vec2 {
        let rect = self.player.body().rect();
        let (w, h) = self.config.display_size;
        Vec2::new(
            rect.center_x() as f32 - w as f32 / 2.0,
            rect.center_y() as f32 - h as f32 / 2.0,
        )
    }

    /// Move the camera part of the way toward the player.
    pub fn follow_camera(&mut self) {
        let target = self.camera_target();
        self.scroll.x += (target.x - self.scroll.x) / CAMERA_LAG;
        self.scroll.y += (target.y - self.scroll.y) / CAMERA_LAG;
    }

    /// Integer offset used to draw this frame.
    pub fn render_offset(&self) -> RenderOffset {
        RenderOffset::from_scroll(self.scroll)
    }

    /// Visible area in pixels.
    pub fn view_size(&self) -> (i32, i32) {
        let (w, h) = self.config.display_size;
        (w as i32, h as i32)
    }

    // ===== EVENTS =====

    /// Queue an event for the current tick's result.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Take and clear queued events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== VERIFICATION =====

    /// Hash of the simulation state (entities, pools, counters, RNG).
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.config.rng_seed, |h| {
            h.update_u32(self.level as u32);
            h.update_str(self.level_id());
            h.update_i32(self.transition);
            h.update_u32(self.screenshake);
            h.update_vec2(self.scroll);
            for word in self.rng.state() {
                h.update_u64(word);
            }

            hash_body(h, self.player.body());
            h.update_u32(self.player.air_time);
            h.update_u32(self.player.jumps);
            h.update_u32(self.player.dead);
            h.update_i32(self.player.dash.direction);
            h.update_i32(self.player.dash.ratio);
            h.update_u32(self.player.dash.active_frames);
            h.update_u32(self.player.dash.cooldown_frames);

            h.update_u32(self.enemies.len() as u32);
            for enemy in &self.enemies {
                hash_body(h, enemy.body());
                h.update_u32(enemy.walking);
                h.update_u32(enemy.shot_cooldown);
                h.update_bool(enemy.harmless);
            }

            h.update_u32(self.effects.projectiles.len() as u32);
            for projectile in &self.effects.projectiles {
                h.update_vec2(projectile.pos);
                h.update_f32(projectile.velocity);
                h.update_u32(projectile.timer);
            }
            h.update_u32(self.effects.sparks.len() as u32);
            for spark in &self.effects.sparks {
                h.update_vec2(spark.pos);
                h.update_f32(spark.speed);
            }
            h.update_u32(self.leaf_spawners.len() as u32);
            for area in &self.leaf_spawners {
                h.update_rect(*area);
            }
            h.update_u32(self.effects.particles.len() as u32);
            for particle in &self.effects.particles {
                h.update_vec2(particle.pos);
                h.update_u32(particle.animation.frame());
            }
        })
    }
}

fn hash_body(h: &mut StateHasher, body: &PhysicsBody) {
    h.update_vec2(body.pos);
    h.update_vec2(body.velocity);
    h.update_bool(body.flip);
    h.update_bool(body.collisions.up);
    h.update_bool(body.collisions.down);
    h.update_bool(body.collisions.left);
    h.update_bool(body.collisions.right);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEventData;
    use crate::game::level::{MemoryLevels, SPAWN_ENEMY, SPAWN_PLAYER};
    use crate::game::tilemap::TileKind;

    fn arena() -> TileGrid {
        let mut grid = TileGrid::new(16);
        for x in -5..20 {
            grid.place_on_grid((x, 5), TileKind::Grass, 1);
        }
        grid.place_on_grid((2, 4), TileKind::Spawners, SPAWN_PLAYER);
        grid.place_on_grid((12, 4), TileKind::Spawners, SPAWN_ENEMY);
        grid
    }

    fn session() -> LevelSession<MemoryLevels> {
        let levels = MemoryLevels::new().with(LEVELS_ORDER[0], &arena()).unwrap();
        let config = SessionConfig {
            levels: vec![LEVELS_ORDER[0].to_string()],
            rng_seed: 5,
            ..SessionConfig::default()
        };
        LevelSession::new(config, levels, AssetCatalog::standard()).unwrap()
    }

    #[test]
    fn test_new_session_spawns_level() {
        let mut s = session();
        assert_eq!(s.player.body().pos, Vec2::new(32.0, 64.0));
        assert_eq!(s.enemies.len(), 1);
        assert_eq!(s.transition, TRANSITION_START);
        // Markers are not part of the playable map
        assert!(s.grid.get((2, 4)).is_none());
        // Camera starts centered on the player
        assert_eq!(s.scroll, Vec2::new(36.0 - 160.0, 71.0 - 120.0));

        let events = s.take_events();
        assert!(matches!(events[0].data, GameEventData::LevelLoaded { index: 0, .. }));
        assert!(s.take_events().is_empty());
    }

    #[test]
    fn test_missing_level_is_fatal() {
        let config = SessionConfig { rng_seed: 1, ..SessionConfig::default() };
        let result = LevelSession::new(config, MemoryLevels::new(), AssetCatalog::standard());
        assert!(matches!(result, Err(SessionError::Tilemap(ref e)) if e.is_not_found()));
    }

    #[test]
    fn test_empty_level_order_rejected() {
        let config = SessionConfig { levels: Vec::new(), ..SessionConfig::default() };
        let result = LevelSession::new(config, MemoryLevels::new(), AssetCatalog::standard());
        assert!(matches!(result, Err(SessionError::NoLevels)));
    }

    #[test]
    fn test_load_level_out_of_range() {
        let mut s = session();
        assert!(matches!(
            s.load_level(3),
            Err(SessionError::LevelOutOfRange { index: 3, count: 1 })
        ));
    }

    #[test]
    fn test_camera_follow_converges() {
        let mut s = session();
        s.scroll = Vec2::ZERO;
        let target = s.camera_target();
        s.follow_camera();
        assert!((s.scroll.x - target.x / 30.0).abs() < 1e-4);
        for _ in 0..1000 {
            s.follow_camera();
        }
        assert!((s.scroll.x - target.x).abs() < 0.01);
    }

    #[test]
    fn test_hash_tracks_state() {
        let a = session();
        let mut b = session();
        assert_eq!(a.compute_hash(), b.compute_hash());

        b.player.body_mut().pos.x += 1.0;
        assert_ne!(a.compute_hash(), b.compute_hash());
    }
}
