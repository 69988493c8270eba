//! Levels
//!
//! Where level maps come from, and how spawn markers in a map become the
//! player, enemies and leaf emitters of a running level.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::tilemap::{TileGrid, TileKind, TilemapError};

/// Level identifiers in play order. Clearing the last one wraps around.
pub const LEVELS_ORDER: [&str; 6] = [
    "0_movement_intro",
    "1_the_great_climb",
    "2_enemy_intro",
    "3_fighting_through",
    "4_pacience",
    "5_showoff",
];

/// Default directory holding level maps.
pub const DEFAULT_MAP_DIR: &str = "./data/created_maps";

/// Supplies the map of a level by identifier.
pub trait LevelSource {
    /// Load a fresh copy of the level's map.
    fn load(&self, id: &str) -> Result<TileGrid, TilemapError>;
}

/// Levels stored as `<dir>/<id>.json`.
#[derive(Clone, Debug)]
pub struct DirectoryLevels {
    dir: PathBuf,
}

impl DirectoryLevels {
    /// Read levels from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of a level's map file.
    pub fn path_of(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl LevelSource for DirectoryLevels {
    fn load(&self, id: &str) -> Result<TileGrid, TilemapError> {
        TileGrid::load(&self.path_of(id))
    }
}

/// Levels kept in memory as serialized maps.
#[derive(Clone, Debug, Default)]
pub struct MemoryLevels {
    maps: BTreeMap<String, String>,
}

impl MemoryLevels {
    /// No levels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot of `grid` under `id`.
    pub fn insert(&mut self, id: impl Into<String>, grid: &TileGrid) -> Result<(), TilemapError> {
        self.maps.insert(id.into(), grid.to_json()?);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, id: impl Into<String>, grid: &TileGrid) -> Result<Self, TilemapError> {
        self.insert(id, grid)?;
        Ok(self)
    }

    /// Stored level count.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// No level stored.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl LevelSource for MemoryLevels {
    fn load(&self, id: &str) -> Result<TileGrid, TilemapError> {
        let json = self.maps.get(id).ok_or_else(|| {
            TilemapError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no level named {id}"),
            ))
        })?;
        TileGrid::from_json(json)
    }
}

// =============================================================================
// SPAWN EXTRACTION
// =============================================================================

/// Spawner variant marking the player start.
pub const SPAWN_PLAYER: u32 = 0;
/// Spawner variant marking an armed enemy.
pub const SPAWN_ENEMY: u32 = 1;
/// Spawner variant marking a harmless enemy.
pub const SPAWN_HARMLESS: u32 = 2;
/// Large decor variant that drops leaves.
pub const TREE_VARIANT: u32 = 2;

/// Enemy to create at level start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySpawn {
    /// Top-left corner
    pub pos: Vec2,
    /// Never shoots
    pub harmless: bool,
}

/// Everything a level spawns from its markers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LevelLayout {
    /// Player start, (0, 0) without a marker
    pub player_spawn: Vec2,
    /// Enemies in marker order
    pub enemies: Vec<EnemySpawn>,
    /// Leaf emitter areas below tree crowns
    pub leaf_spawners: Vec<Rect>,
}

/// Harvest markers from a freshly loaded grid.
///
/// Trees stay in the map. Spawn markers are removed so they are never
/// drawn. With several player markers the last one wins.
pub fn extract_layout(grid: &mut TileGrid) -> LevelLayout {
    let mut layout = LevelLayout::default();

    for tree in grid.extract(&[(TileKind::LargeDecor, TREE_VARIANT)], true) {
        let (x, y) = tree.pos.to_ints();
        layout.leaf_spawners.push(Rect::new(x + 4, y + 4, 23, 13));
    }

    let markers = [
        (TileKind::Spawners, SPAWN_PLAYER),
        (TileKind::Spawners, SPAWN_ENEMY),
        (TileKind::Spawners, SPAWN_HARMLESS),
    ];
    for spawner in grid.extract(&markers, false) {
        match spawner.variant {
            SPAWN_PLAYER => layout.player_spawn = spawner.pos,
            SPAWN_ENEMY => layout.enemies.push(EnemySpawn { pos: spawner.pos, harmless: false }),
            _ => layout.enemies.push(EnemySpawn { pos: spawner.pos, harmless: true }),
        }
    }

    layout
}
