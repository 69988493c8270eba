//! Tile Grid
//!
//! Sparse tile storage shared by the runtime and the editor.
//!
//! ## Coordinates
//!
//! - On-grid tiles are keyed by integer cell `(x, y)`; world position of a
//!   cell is `cell * tile_size`.
//! - Off-grid tiles are stored with a pixel position and no cell.
//! - World-to-cell conversion floors (`-1.0` is in cell `-1`).
//!
//! ## Persisted format
//!
//! ```text
//! {"tilemap": {"<x>;<y>": {"type": str, "variant": int, "pos": [x, y]}},
//!  "offgrid": [{"type": str, "variant": int, "pos": [x, y]}],
//!  "tile_size": int}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::assets::{AssetCatalog, AssetError};
use crate::game::render::{DrawCommand, RenderOffset, SpriteRef};

/// Integer grid cell.
pub type CellKey = (i32, i32);

/// The 3x3 neighborhood, bottom-left to top-right.
pub const NEIGHBOR_OFFSETS: [CellKey; 9] = [
    (-1, 1), (0, 1), (1, 1),
    (-1, 0), (0, 0), (1, 0),
    (-1, -1), (0, -1), (1, -1),
];

/// Orthogonal neighbors inspected by autotiling, in sorted order.
pub const AUTOTILE_SHIFTS: [CellKey; 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// Same-type neighbor configuration (sorted) to variant index.
///
/// Closed table: configurations not listed leave the variant unchanged.
pub const AUTOTILE_RULES: [(&[CellKey], u32); 9] = [
    (&[(0, 1), (1, 0)], 0),
    (&[(-1, 0), (0, 1), (1, 0)], 1),
    (&[(-1, 0), (0, 1)], 2),
    (&[(-1, 0), (0, -1), (0, 1)], 3),
    (&[(-1, 0), (0, -1)], 4),
    (&[(-1, 0), (0, -1), (1, 0)], 5),
    (&[(0, -1), (1, 0)], 6),
    (&[(0, -1), (0, 1), (1, 0)], 7),
    (&[(-1, 0), (0, -1), (0, 1), (1, 0)], 8),
];

// =============================================================================
// ERRORS
// =============================================================================

/// Map load/save errors.
#[derive(Debug, thiserror::Error)]
pub enum TilemapError {
    /// File could not be read or written.
    #[error("Map I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON, missing keys, or unknown tile type.
    #[error("Malformed map: {0}")]
    Json(#[from] serde_json::Error),

    /// Tile-map key is not `<int>;<int>`.
    #[error("Invalid cell key: {0:?}")]
    InvalidCellKey(String),

    /// Tile stored under one key claims a different cell.
    #[error("Tile under key {key:?} has position {pos:?}")]
    CellMismatch {
        /// Key in the file
        key: String,
        /// Position stored in the tile
        pos: CellKey,
    },

    /// Tile size must be positive.
    #[error("Invalid tile size: {0}")]
    InvalidTileSize(i32),
}

impl TilemapError {
    /// True when the map file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TilemapError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

// =============================================================================
// TILE TYPES
// =============================================================================

/// Tile groups. The set is closed; unknown names fail to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Solid, autotiled
    Grass,
    /// Solid, autotiled
    Stone,
    /// Small decoration
    Decor,
    /// Large decoration (trees spawn leaves)
    LargeDecor,
    /// Spawn markers (player, enemy, harmless enemy)
    Spawners,
}

impl TileKind {
    /// Every kind, in editor group order.
    pub const ALL: [TileKind; 5] = [
        TileKind::Grass,
        TileKind::Stone,
        TileKind::Decor,
        TileKind::LargeDecor,
        TileKind::Spawners,
    ];

    /// Asset / file name.
    pub fn name(self) -> &'static str {
        match self {
            TileKind::Grass => "grass",
            TileKind::Stone => "stone",
            TileKind::Decor => "decor",
            TileKind::LargeDecor => "large_decor",
            TileKind::Spawners => "spawners",
        }
    }

    /// Participates in AABB collision.
    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Grass | TileKind::Stone)
    }

    /// Participates in autotiling.
    #[inline]
    pub fn autotiles(self) -> bool {
        matches!(self, TileKind::Grass | TileKind::Stone)
    }
}

/// Tile placed in a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTile {
    /// Tile group
    #[serde(rename = "type")]
    pub kind: TileKind,
    /// Image index within the group
    pub variant: u32,
    /// Cell this tile occupies
    pub pos: CellKey,
}

/// Tile placed at a free pixel position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OffgridTile {
    /// Tile group
    #[serde(rename = "type")]
    pub kind: TileKind,
    /// Image index within the group
    pub variant: u32,
    /// Top-left corner in world pixels
    pub pos: Vec2,
}

/// A tile copy in world space, as returned by [`TileGrid::extract`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedTile {
    /// Tile group
    pub kind: TileKind,
    /// Image index within the group
    pub variant: u32,
    /// Top-left corner in world pixels
    pub pos: Vec2,
}

/// On-disk layout.
#[derive(Serialize, Deserialize)]
struct MapFile {
    tilemap: BTreeMap<String, GridTile>,
    offgrid: Vec<OffgridTile>,
    tile_size: i32,
}

/// `"x;y"` token for a cell.
pub fn cell_key_string(cell: CellKey) -> String {
    format!("{};{}", cell.0, cell.1)
}

/// Parse an `"x;y"` token.
pub fn parse_cell_key(key: &str) -> Result<CellKey, TilemapError> {
    let invalid = || TilemapError::InvalidCellKey(key.to_string());
    let (x, y) = key.split_once(';').ok_or_else(invalid)?;
    let x = x.parse::<i32>().map_err(|_| invalid())?;
    let y = y.parse::<i32>().map_err(|_| invalid())?;
    Ok((x, y))
}

// =============================================================================
// TILE GRID
// =============================================================================

/// Sparse tile grid.
///
/// Solid tiles never overlap each other (one tile per cell), which keeps
/// collision resolution order-independent in practice.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    tiles: BTreeMap<CellKey, GridTile>,
    offgrid: Vec<OffgridTile>,
    tile_size: i32,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new(16)
    }
}

impl TileGrid {
    /// Empty grid. Non-positive sizes fall back to 1.
    pub fn new(tile_size: i32) -> Self {
        Self {
            tiles: BTreeMap::new(),
            offgrid: Vec::new(),
            tile_size: tile_size.max(1),
        }
    }

    /// Side length of a cell in pixels.
    #[inline]
    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    /// Cell containing a world position (floor division).
    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> CellKey {
        let ts = self.tile_size as f32;
        ((pos.x / ts).floor() as i32, (pos.y / ts).floor() as i32)
    }

    /// World box of a cell.
    #[inline]
    pub fn cell_rect(&self, cell: CellKey) -> Rect {
        Rect::new(
            cell.0 * self.tile_size,
            cell.1 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }

    /// Tile at a cell.
    pub fn get(&self, cell: CellKey) -> Option<&GridTile> {
        self.tiles.get(&cell)
    }

    /// All on-grid tiles.
    pub fn tiles(&self) -> impl Iterator<Item = &GridTile> {
        self.tiles.values()
    }

    /// All off-grid tiles, in placement order.
    pub fn offgrid_tiles(&self) -> &[OffgridTile] {
        &self.offgrid
    }

    /// Number of on-grid tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// No tiles of either kind.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.offgrid.is_empty()
    }

    // ===== QUERIES =====

    /// Up to 9 tiles around the cell containing `pos`, in
    /// [`NEIGHBOR_OFFSETS`] order.
    pub fn tiles_around(&self, pos: Vec2) -> Vec<&GridTile> {
        let (cx, cy) = self.cell_of(pos);
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(|(dx, dy)| self.tiles.get(&(cx + dx, cy + dy)))
            .collect()
    }

    /// World boxes of the solid tiles around `pos`.
    pub fn physics_rects_around(&self, pos: Vec2) -> Vec<Rect> {
        self.tiles_around(pos)
            .into_iter()
            .filter(|tile| tile.kind.is_solid())
            .map(|tile| self.cell_rect(tile.pos))
            .collect()
    }

    /// A solid tile occupies the cell containing `pos`.
    pub fn is_solid_at(&self, pos: Vec2) -> bool {
        self.tiles
            .get(&self.cell_of(pos))
            .is_some_and(|tile| tile.kind.is_solid())
    }

    // ===== MUTATION =====

    /// Place (or replace) a tile in a cell.
    pub fn place_on_grid(&mut self, cell: CellKey, kind: TileKind, variant: u32) {
        self.tiles.insert(cell, GridTile { kind, variant, pos: cell });
    }

    /// Remove the tile in a cell.
    pub fn delete_on_grid(&mut self, cell: CellKey) -> Option<GridTile> {
        self.tiles.remove(&cell)
    }

    /// Append an off-grid tile.
    pub fn place_offgrid(&mut self, tile: OffgridTile) {
        self.offgrid.push(tile);
    }

    /// Remove the first off-grid tile whose image box contains `world_pos`.
    pub fn delete_offgrid_at(
        &mut self,
        world_pos: Vec2,
        assets: &AssetCatalog,
    ) -> Result<Option<OffgridTile>, AssetError> {
        for (index, tile) in self.offgrid.iter().enumerate() {
            let size = assets.variant(tile.kind.name(), tile.variant as usize)?;
            let hitbox = Rect::from_pos(tile.pos, (size.w as i32, size.h as i32));
            if hitbox.contains_point(world_pos) {
                return Ok(Some(self.offgrid.remove(index)));
            }
        }
        Ok(None)
    }

    /// Pick variants for autotiled kinds from their same-kind orthogonal
    /// neighbors. Returns how many tiles changed.
    pub fn autotile(&mut self) -> usize {
        let mut updates = Vec::new();

        for (cell, tile) in &self.tiles {
            if !tile.kind.autotiles() {
                continue;
            }

            let mut neighbors: Vec<CellKey> = AUTOTILE_SHIFTS
                .iter()
                .copied()
                .filter(|(dx, dy)| {
                    self.tiles
                        .get(&(cell.0 + dx, cell.1 + dy))
                        .is_some_and(|other| other.kind == tile.kind)
                })
                .collect();
            neighbors.sort_unstable();

            if let Some(variant) = autotile_variant(&neighbors) {
                if variant != tile.variant {
                    updates.push((*cell, variant));
                }
            }
        }

        for (cell, variant) in &updates {
            if let Some(tile) = self.tiles.get_mut(cell) {
                tile.variant = *variant;
            }
        }

        debug!("Autotile updated {} tiles", updates.len());
        updates.len()
    }

    /// Pull out every tile whose `(kind, variant)` is in `pairs`.
    ///
    /// Off-grid matches come first, then on-grid matches with their cell
    /// scaled to world pixels. With `keep == false` the matches are removed.
    pub fn extract(&mut self, pairs: &[(TileKind, u32)], keep: bool) -> Vec<PlacedTile> {
        let wanted = |kind: TileKind, variant: u32| pairs.contains(&(kind, variant));
        let mut matches = Vec::new();

        for tile in &self.offgrid {
            if wanted(tile.kind, tile.variant) {
                matches.push(PlacedTile {
                    kind: tile.kind,
                    variant: tile.variant,
                    pos: tile.pos,
                });
            }
        }

        let ts = self.tile_size;
        for tile in self.tiles.values() {
            if wanted(tile.kind, tile.variant) {
                matches.push(PlacedTile {
                    kind: tile.kind,
                    variant: tile.variant,
                    pos: Vec2::from_ints(tile.pos.0 * ts, tile.pos.1 * ts),
                });
            }
        }

        if !keep {
            self.offgrid.retain(|tile| !wanted(tile.kind, tile.variant));
            self.tiles.retain(|_, tile| !wanted(tile.kind, tile.variant));
        }

        matches
    }

    // ===== PERSISTENCE =====

    /// Serialize to the JSON map format.
    pub fn to_json(&self) -> Result<String, TilemapError> {
        let file = MapFile {
            tilemap: self
                .tiles
                .iter()
                .map(|(cell, tile)| (cell_key_string(*cell), *tile))
                .collect(),
            offgrid: self.offgrid.clone(),
            tile_size: self.tile_size,
        };
        Ok(serde_json::to_string(&file)?)
    }

    /// Parse the JSON map format.
    pub fn from_json(json: &str) -> Result<Self, TilemapError> {
        let file: MapFile = serde_json::from_str(json)?;

        if file.tile_size <= 0 {
            return Err(TilemapError::InvalidTileSize(file.tile_size));
        }

        let mut tiles = BTreeMap::new();
        for (key, tile) in file.tilemap {
            let cell = parse_cell_key(&key)?;
            if cell != tile.pos {
                return Err(TilemapError::CellMismatch { key, pos: tile.pos });
            }
            tiles.insert(cell, tile);
        }

        Ok(Self {
            tiles,
            offgrid: file.offgrid,
            tile_size: file.tile_size,
        })
    }

    /// Read a map file.
    pub fn load(path: &Path) -> Result<Self, TilemapError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Write a map file.
    pub fn save(&self, path: &Path) -> Result<(), TilemapError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    // ===== RENDER PLAN =====

    /// Draw commands for the tiles visible through a `view`-sized window at
    /// `offset`. Off-grid tiles are always emitted, first.
    pub fn render(
        &self,
        offset: RenderOffset,
        view: (i32, i32),
        assets: &AssetCatalog,
        out: &mut Vec<DrawCommand>,
    ) -> Result<(), AssetError> {
        for tile in &self.offgrid {
            out.push(tile_sprite(assets, tile.kind, tile.variant, offset.apply(tile.pos))?);
        }

        let ts = self.tile_size;
        let x_range = offset.x.div_euclid(ts)..=(offset.x + view.0).div_euclid(ts);
        for x in x_range {
            let y_range = offset.y.div_euclid(ts)..=(offset.y + view.1).div_euclid(ts);
            for y in y_range {
                if let Some(tile) = self.tiles.get(&(x, y)) {
                    let world = Vec2::from_ints(x * ts, y * ts);
                    out.push(tile_sprite(assets, tile.kind, tile.variant, offset.apply(world))?);
                }
            }
        }

        Ok(())
    }
}

/// Variant for a sorted same-kind neighbor set, if the table lists it.
pub fn autotile_variant(sorted_neighbors: &[CellKey]) -> Option<u32> {
    AUTOTILE_RULES
        .iter()
        .find(|(config, _)| *config == sorted_neighbors)
        .map(|(_, variant)| *variant)
}

fn tile_sprite(
    assets: &AssetCatalog,
    kind: TileKind,
    variant: u32,
    pos: Vec2,
) -> Result<DrawCommand, AssetError> {
    assets.variant(kind.name(), variant as usize)?;
    Ok(DrawCommand::sprite(
        SpriteRef::Indexed { asset: kind.name(), index: variant as usize },
        pos,
    ))
}

// =============================================================================
// TESTS
// =============================================================================
