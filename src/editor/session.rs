//! Editor Session
//!
//! Holds the map being edited, the brush (tile group + variant), the
//! camera and the pointer/button state. Intents mutate the state; `frame`
//! runs the held-button actions and returns what to draw.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::hash::hex_digest;
use crate::core::vec2::Vec2;
use crate::editor::intent::{EditorIntent, PanDirection};
use crate::game::assets::{AssetCatalog, AssetError};
use crate::game::render::{DrawCommand, RenderOffset, SpriteRef};
use crate::game::tilemap::{CellKey, OffgridTile, TileGrid, TileKind, TilemapError};

/// Where the brush preview is drawn on screen.
pub const BRUSH_PREVIEW_POS: Vec2 = Vec2::new(5.0, 5.0);

/// Editor errors.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Map could not be read or written
    #[error(transparent)]
    Tilemap(#[from] TilemapError),

    /// Brush or tile references an unknown image
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Editor configuration.
#[derive(Clone, Debug)]
pub struct EditorConfig {
    /// Directory maps are read from and saved to
    pub map_dir: PathBuf,
    /// Map file opened at start
    pub map_name: String,
    /// Tile size for a fresh map
    pub tile_size: i32,
    /// Window pixels per display pixel
    pub render_scale: f32,
    /// Camera pan per frame per held direction, in pixels
    pub scroll_speed: f32,
    /// Display size in pixels
    pub display_size: (i32, i32),
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            map_dir: PathBuf::from("./data/created_maps/"),
            map_name: "movement_intro_v2.json".to_string(),
            tile_size: 16,
            render_scale: 2.0,
            scroll_speed: 3.0,
            display_size: (320, 240),
        }
    }
}

/// Draw plan for one editor frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorFrame {
    /// Map tiles
    pub tiles: Vec<DrawCommand>,
    /// Translucent brush image under the pointer
    pub ghost: Option<DrawCommand>,
    /// Cell under the pointer while in on-grid mode
    pub cursor_cell: Option<CellKey>,
    /// Faint brush preview in the corner
    pub brush: Option<DrawCommand>,
}

/// A map being edited.
#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    assets: AssetCatalog,
    /// The map
    pub grid: TileGrid,
    /// File name saves go to; empty for a new map
    pub map_name: String,
    /// Camera position
    pub scroll: Vec2,
    /// Index into [`TileKind::ALL`]
    tile_group: usize,
    /// Image index within the group
    tile_variant: u32,
    /// Place snaps to cells
    pub on_grid: bool,
    /// Pointer in display pixels
    pub pointer: Vec2,
    placing: bool,
    deleting: bool,
    panning: [bool; 4],
}

impl EditorSession {
    /// Open the configured map. A missing file starts an empty map; any
    /// other load failure is returned.
    pub fn open(config: EditorConfig, assets: AssetCatalog) -> Result<Self, EditorError> {
        let path = config.map_dir.join(&config.map_name);
        let (grid, map_name) = match TileGrid::load(&path) {
            Ok(grid) => {
                info!("Editing {}", path.display());
                (grid, config.map_name.clone())
            }
            Err(e) if e.is_not_found() => {
                warn!("{} not found, starting an empty map", path.display());
                (TileGrid::new(config.tile_size), String::new())
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::with_grid(config, assets, grid, map_name))
    }

    /// Edit an in-memory map.
    pub fn with_grid(
        config: EditorConfig,
        assets: AssetCatalog,
        grid: TileGrid,
        map_name: impl Into<String>,
    ) -> Self {
        Self {
            config,
            assets,
            grid,
            map_name: map_name.into(),
            scroll: Vec2::ZERO,
            tile_group: 0,
            tile_variant: 0,
            on_grid: true,
            pointer: Vec2::ZERO,
            placing: false,
            deleting: false,
            panning: [false; 4],
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current brush kind.
    pub fn brush_kind(&self) -> TileKind {
        TileKind::ALL[self.tile_group]
    }

    /// Index of the brush kind in [`TileKind::ALL`].
    pub fn tile_group(&self) -> usize {
        self.tile_group
    }

    /// Image index of the brush within its group.
    pub fn tile_variant(&self) -> u32 {
        self.tile_variant
    }

    /// Apply one input event. Returns the saved path for `Save`.
    pub fn handle(&mut self, intent: EditorIntent) -> Result<Option<PathBuf>, EditorError> {
        match intent {
            EditorIntent::Pointer { x, y } => {
                let scale = self.config.render_scale;
                self.pointer = Vec2::new(x / scale, y / scale);
            }
            EditorIntent::Place { held } => {
                self.placing = held;
                if held {
                    self.place_offgrid();
                }
            }
            EditorIntent::Delete { held } => self.deleting = held,
            EditorIntent::Wheel { step, shift } => self.cycle(step, shift)?,
            EditorIntent::Pan { direction, held } => self.panning[direction.index()] = held,
            EditorIntent::ToggleGrid => self.on_grid = !self.on_grid,
            EditorIntent::Autotile => {
                let changed = self.grid.autotile();
                debug!("Autotile changed {} tiles", changed);
            }
            EditorIntent::Save => return Ok(Some(self.save()?)),
        }
        Ok(None)
    }

    fn cycle(&mut self, step: i32, shift: bool) -> Result<(), EditorError> {
        if shift {
            let asset = self.brush_kind().name();
            let count = self.assets.variant_count(asset)? as i64;
            if count == 0 {
                return Err(AssetError::UnknownVariant {
                    asset: asset.to_string(),
                    variant: 0,
                }
                .into());
            }
            self.tile_variant = (self.tile_variant as i64 + step as i64).rem_euclid(count) as u32;
        } else {
            let count = TileKind::ALL.len() as i64;
            self.tile_group = (self.tile_group as i64 + step as i64).rem_euclid(count) as usize;
            self.tile_variant = 0;
        }
        Ok(())
    }

    /// Pointer position in world pixels.
    pub fn pointer_world(&self) -> Vec2 {
        self.pointer + self.scroll
    }

    /// Cell under the pointer.
    pub fn pointer_cell(&self) -> CellKey {
        let ts = self.grid.tile_size() as f32;
        let world = self.pointer_world();
        ((world.x / ts).floor() as i32, (world.y / ts).floor() as i32)
    }

    fn place_offgrid(&mut self) {
        if self.on_grid {
            return;
        }
        self.grid.place_offgrid(OffgridTile {
            kind: self.brush_kind(),
            variant: self.tile_variant,
            pos: self.pointer_world(),
        });
    }

    /// Run one frame: pan the camera, draw the map and the brush ghost,
    /// then apply held place/delete buttons.
    pub fn frame(&mut self) -> Result<EditorFrame, EditorError> {
        let speed = self.config.scroll_speed;
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32 * speed;
        self.scroll.x += axis(self.panning[0], self.panning[1]);
        self.scroll.y += axis(self.panning[2], self.panning[3]);

        let offset = RenderOffset::from_scroll(self.scroll);
        let mut frame = EditorFrame::default();
        self.grid
            .render(offset, self.config.display_size, &self.assets, &mut frame.tiles)?;

        let kind = self.brush_kind();
        self.assets.variant(kind.name(), self.tile_variant as usize)?;
        let brush = SpriteRef::Indexed {
            asset: kind.name(),
            index: self.tile_variant as usize,
        };

        let ghost_pos = if self.on_grid {
            let cell = self.pointer_cell();
            frame.cursor_cell = Some(cell);
            let ts = self.grid.tile_size() as f32;
            Vec2::new(cell.0 as f32 * ts, cell.1 as f32 * ts) - self.scroll
        } else {
            self.pointer
        };
        frame.ghost = Some(DrawCommand::sprite(brush, ghost_pos));

        if self.placing && self.on_grid {
            self.grid
                .place_on_grid(self.pointer_cell(), kind, self.tile_variant);
        }
        if self.deleting {
            self.delete_under_pointer()?;
        }

        frame.brush = Some(DrawCommand::sprite(brush, BRUSH_PREVIEW_POS));
        Ok(frame)
    }

    /// Remove the on-grid tile under the pointer and every off-grid tile
    /// whose image covers it. Returns how many tiles went.
    pub fn delete_under_pointer(&mut self) -> Result<usize, EditorError> {
        let mut removed = usize::from(self.grid.delete_on_grid(self.pointer_cell()).is_some());
        let world = self.pointer_world();
        while self.grid.delete_offgrid_at(world, &self.assets)?.is_some() {
            removed += 1;
        }
        Ok(removed)
    }

    /// File name a save writes to: the opened map's name, or the SHA-256
    /// of the map's JSON.
    pub fn save_name(&self) -> Result<String, EditorError> {
        if !self.map_name.is_empty() {
            return Ok(self.map_name.clone());
        }
        let json = self.grid.to_json()?;
        Ok(format!("{}.json", hex_digest(json.as_bytes())))
    }

    /// Write the map into the map directory.
    pub fn save(&self) -> Result<PathBuf, EditorError> {
        self.save_to(&self.config.map_dir)
    }

    /// Write the map into `dir`.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, EditorError> {
        let path = dir.join(self.save_name()?);
        self.grid.save(&path)?;
        info!("Saved {} into {}", path.display(), dir.display());
        Ok(path)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::assets::AssetEntry;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> EditorConfig {
        EditorConfig {
            map_dir: dir.to_path_buf(),
            ..EditorConfig::default()
        }
    }

    fn blank() -> EditorSession {
        EditorSession::with_grid(
            EditorConfig::default(),
            AssetCatalog::standard(),
            TileGrid::new(16),
            "",
        )
    }

    fn point(session: &mut EditorSession, x: f32, y: f32) {
        session.handle(EditorIntent::Pointer { x, y }).unwrap();
    }

    #[test]
    fn test_missing_map_starts_empty() {
        let dir = TempDir::new().unwrap();
        let session = EditorSession::open(config_in(dir.path()), AssetCatalog::standard()).unwrap();
        assert!(session.grid.is_empty());
        assert!(session.map_name.is_empty());
        assert_eq!(session.grid.tile_size(), 16);
    }

    #[test]
    fn test_malformed_map_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("movement_intro_v2.json"), "{\"tilemap\": 3}").unwrap();
        let err = EditorSession::open(config_in(dir.path()), AssetCatalog::standard()).unwrap_err();
        assert!(matches!(err, EditorError::Tilemap(TilemapError::Json(_))));
    }

    #[test]
    fn test_open_and_save_keeps_name() {
        let dir = TempDir::new().unwrap();
        let mut grid = TileGrid::new(16);
        grid.place_on_grid((1, 1), TileKind::Stone, 2);
        grid.save(&dir.path().join("movement_intro_v2.json")).unwrap();

        let mut session = EditorSession::open(config_in(dir.path()), AssetCatalog::standard()).unwrap();
        assert_eq!(session.map_name, "movement_intro_v2.json");
        assert_eq!(session.grid, grid);

        session.grid.place_on_grid((2, 1), TileKind::Stone, 0);
        let path = session.handle(EditorIntent::Save).unwrap().unwrap();
        assert_eq!(path, dir.path().join("movement_intro_v2.json"));
        assert_eq!(TileGrid::load(&path).unwrap(), session.grid);
    }

    #[test]
    fn test_unnamed_map_saves_under_content_hash() {
        let dir = TempDir::new().unwrap();
        let mut session = blank();
        session.grid.place_on_grid((0, 0), TileKind::Grass, 1);

        let path = session.save_to(dir.path()).unwrap();
        let json = session.grid.to_json().unwrap();
        let expected = format!("{}.json", hex_digest(json.as_bytes()));
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), expected);
        assert_eq!(expected.len(), 64 + 5);
        assert_eq!(TileGrid::load(&path).unwrap(), session.grid);
    }

    #[test]
    fn test_wheel_cycles_group_and_variant() {
        let mut session = blank();
        session.handle(EditorIntent::Wheel { step: -1, shift: false }).unwrap();
        assert_eq!(session.brush_kind(), TileKind::Spawners);

        session.handle(EditorIntent::Wheel { step: 1, shift: true }).unwrap();
        session.handle(EditorIntent::Wheel { step: 1, shift: true }).unwrap();
        assert_eq!(session.tile_variant(), 2);
        session.handle(EditorIntent::Wheel { step: 1, shift: true }).unwrap();
        assert_eq!(session.tile_variant(), 0);
        session.handle(EditorIntent::Wheel { step: -1, shift: true }).unwrap();
        assert_eq!(session.tile_variant(), 2);

        // Switching group resets the variant
        session.handle(EditorIntent::Wheel { step: 1, shift: false }).unwrap();
        assert_eq!(session.brush_kind(), TileKind::Grass);
        assert_eq!(session.tile_group(), 0);
        assert_eq!(session.tile_variant(), 0);
    }

    #[test]
    fn test_empty_image_list_rejects_variant_cycle() {
        let mut assets = AssetCatalog::standard();
        assets.insert("decor", AssetEntry::Images { sizes: Vec::new() });
        let mut session =
            EditorSession::with_grid(EditorConfig::default(), assets, TileGrid::new(16), "");
        session.handle(EditorIntent::Wheel { step: 2, shift: false }).unwrap();
        assert_eq!(session.brush_kind(), TileKind::Decor);

        let err = session.handle(EditorIntent::Wheel { step: 1, shift: true }).unwrap_err();
        assert!(matches!(
            err,
            EditorError::Asset(AssetError::UnknownVariant { ref asset, variant: 0 }) if asset == "decor"
        ));
        assert_eq!(session.tile_variant(), 0);
        assert_eq!(session.tile_group(), 2);
    }

    #[test]
    fn test_held_place_paints_cells() {
        let mut session = blank();
        session.scroll = Vec2::new(16.0, 0.0);
        point(&mut session, 10.0, 40.0);
        assert_eq!(session.pointer, Vec2::new(5.0, 20.0));

        session.handle(EditorIntent::Place { held: true }).unwrap();
        // Press alone does not place on-grid
        assert!(session.grid.is_empty());

        session.frame().unwrap();
        point(&mut session, 50.0, 40.0);
        session.frame().unwrap();
        session.handle(EditorIntent::Place { held: false }).unwrap();
        point(&mut session, 90.0, 40.0);
        session.frame().unwrap();

        assert_eq!(session.grid.len(), 2);
        assert!(session.grid.get((1, 1)).is_some());
        assert!(session.grid.get((2, 1)).is_some());
        assert!(session.grid.offgrid_tiles().is_empty());
    }

    #[test]
    fn test_offgrid_places_once_per_click() {
        let mut session = blank();
        session.handle(EditorIntent::ToggleGrid).unwrap();
        session.scroll = Vec2::new(-3.0, 7.0);
        point(&mut session, 21.0, 9.0);

        session.handle(EditorIntent::Place { held: true }).unwrap();
        session.frame().unwrap();
        session.frame().unwrap();

        assert_eq!(
            session.grid.offgrid_tiles(),
            &[OffgridTile {
                kind: TileKind::Grass,
                variant: 0,
                pos: Vec2::new(7.5, 11.5),
            }]
        );
        assert!(session.grid.is_empty());
    }

    #[test]
    fn test_delete_removes_all_under_pointer() {
        let mut session = blank();
        session.grid.place_on_grid((0, 0), TileKind::Stone, 0);
        session.grid.place_on_grid((1, 0), TileKind::Stone, 0);
        for x in [0.0, 4.0] {
            session.grid.place_offgrid(OffgridTile {
                kind: TileKind::Decor,
                variant: 0,
                pos: Vec2::new(x, 0.0),
            });
        }
        session.grid.place_offgrid(OffgridTile {
            kind: TileKind::Decor,
            variant: 0,
            pos: Vec2::new(40.0, 0.0),
        });

        point(&mut session, 12.0, 12.0);
        session.handle(EditorIntent::Delete { held: true }).unwrap();
        session.frame().unwrap();

        assert!(session.grid.get((0, 0)).is_none());
        assert!(session.grid.get((1, 0)).is_some());
        assert_eq!(session.grid.offgrid_tiles().len(), 1);
    }

    #[test]
    fn test_pan_and_ghost() {
        let mut session = blank();
        session.handle(EditorIntent::Pan { direction: PanDirection::Right, held: true }).unwrap();
        session.handle(EditorIntent::Pan { direction: PanDirection::Up, held: true }).unwrap();
        session.frame().unwrap();
        session.frame().unwrap();
        assert_eq!(session.scroll, Vec2::new(6.0, -6.0));

        session.handle(EditorIntent::Pan { direction: PanDirection::Up, held: false }).unwrap();
        point(&mut session, 40.0, 40.0);
        let frame = session.frame().unwrap();
        assert_eq!(session.scroll, Vec2::new(9.0, -6.0));

        // World (29, 14) lies in cell (1, 0), drawn at its screen position
        assert_eq!(frame.cursor_cell, Some((1, 0)));
        assert_eq!(
            frame.ghost,
            Some(DrawCommand::sprite(
                SpriteRef::Indexed { asset: "grass", index: 0 },
                Vec2::new(7.0, 6.0),
            ))
        );
        assert_eq!(
            frame.brush,
            Some(DrawCommand::sprite(
                SpriteRef::Indexed { asset: "grass", index: 0 },
                BRUSH_PREVIEW_POS,
            ))
        );
    }

    #[test]
    fn test_autotile_intent() {
        let mut session = blank();
        for cell in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            session.grid.place_on_grid(cell, TileKind::Grass, 1);
        }
        session.handle(EditorIntent::Autotile).unwrap();
        // Top-left corner of a 2x2 block has neighbors right and below
        assert_eq!(session.grid.get((0, 0)).unwrap().variant, 0);
    }
}
