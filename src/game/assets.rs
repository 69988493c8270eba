//! Asset Catalog
//!
//! Describes the images and animation sets the runtime may reference.
//! The simulation never touches pixel data: it only needs to know how many
//! variants a tile group has, how big an image is (for centering and
//! editor hitboxes) and how an animation is timed.
//!
//! Every lookup is fallible. A tile or entity that references an asset the
//! catalog does not know is a configuration fault, surfaced as [`AssetError`].

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

/// Asset lookup errors.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// No entry under this name.
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    /// Image list does not have this index.
    #[error("Asset {asset} has no variant {variant}")]
    UnknownVariant {
        /// Asset name
        asset: String,
        /// Requested index
        variant: usize,
    },

    /// Animation set does not have this action.
    #[error("Asset {asset} has no action {action}")]
    UnknownAction {
        /// Asset name
        asset: String,
        /// Requested action
        action: String,
    },

    /// Entry exists but has a different shape than the lookup expects.
    #[error("Asset {asset} is not {expected}")]
    WrongShape {
        /// Asset name
        asset: String,
        /// Expected shape
        expected: &'static str,
    },

    /// Animation defined without frames.
    #[error("Animation {asset}/{action} has no frames")]
    EmptyAnimation {
        /// Asset name
        asset: String,
        /// Action name
        action: String,
    },

    /// Catalog JSON could not be parsed.
    #[error("Invalid catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pixel dimensions of one image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels
    pub w: u32,
    /// Height in pixels
    pub h: u32,
}

impl ImageSize {
    /// Create a new size.
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

/// Timed frame sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    /// Frame image sizes, in playback order
    pub frames: Vec<ImageSize>,
    /// Ticks each frame stays on screen
    pub img_duration: u32,
    /// Wrap around after the last frame
    pub looping: bool,
}

impl AnimationSpec {
    /// `count` frames of the same size.
    pub fn uniform(count: usize, size: ImageSize, img_duration: u32, looping: bool) -> Self {
        Self {
            frames: vec![size; count],
            img_duration,
            looping,
        }
    }
}

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetEntry {
    /// A single image (gun, projectile).
    Image {
        /// Image size
        size: ImageSize,
    },
    /// An indexed list of images (tile variants).
    Images {
        /// Sizes by variant index
        sizes: Vec<ImageSize>,
    },
    /// Named animations (entity actions, particle kinds).
    Animations {
        /// Animations by action name
        actions: BTreeMap<String, AnimationSpec>,
    },
}

/// Name-indexed asset descriptions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetCatalog {
    entries: BTreeMap<String, AssetEntry>,
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl AssetCatalog {
    /// Empty catalog.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The stock ninja asset set.
    pub fn standard() -> Self {
        let tile = ImageSize::new(16, 16);
        let actor = ImageSize::new(14, 18);
        let mut catalog = Self::empty();

        catalog.insert("grass", AssetEntry::Images { sizes: vec![tile; 9] });
        catalog.insert("stone", AssetEntry::Images { sizes: vec![tile; 9] });
        catalog.insert("decor", AssetEntry::Images {
            sizes: vec![
                ImageSize::new(16, 16),
                ImageSize::new(16, 16),
                ImageSize::new(16, 16),
                ImageSize::new(16, 9),
            ],
        });
        catalog.insert("large_decor", AssetEntry::Images {
            sizes: vec![
                ImageSize::new(40, 22),
                ImageSize::new(32, 32),
                ImageSize::new(31, 45),
            ],
        });
        catalog.insert("spawners", AssetEntry::Images { sizes: vec![tile; 3] });

        catalog.insert("player", AssetEntry::Animations {
            actions: BTreeMap::from([
                ("idle".to_string(), AnimationSpec::uniform(22, actor, 6, true)),
                ("run".to_string(), AnimationSpec::uniform(8, actor, 4, true)),
                ("jump".to_string(), AnimationSpec::uniform(1, actor, 5, true)),
                ("slide".to_string(), AnimationSpec::uniform(1, actor, 5, true)),
                ("wall_slide".to_string(), AnimationSpec::uniform(1, actor, 5, true)),
            ]),
        });
        for enemy in ["enemy", "harmless_enemy"] {
            catalog.insert(enemy, AssetEntry::Animations {
                actions: BTreeMap::from([
                    ("idle".to_string(), AnimationSpec::uniform(16, actor, 6, true)),
                    ("run".to_string(), AnimationSpec::uniform(8, actor, 4, true)),
                ]),
            });
        }
        catalog.insert("particles", AssetEntry::Animations {
            actions: BTreeMap::from([
                ("leaf".to_string(), AnimationSpec::uniform(18, ImageSize::new(7, 4), 20, false)),
                ("dash".to_string(), AnimationSpec::uniform(4, ImageSize::new(4, 4), 6, false)),
            ]),
        });

        catalog.insert("gun", AssetEntry::Image { size: ImageSize::new(7, 4) });
        catalog.insert("projectile", AssetEntry::Image { size: ImageSize::new(5, 2) });

        catalog
    }

    /// Parse a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the catalog to JSON.
    pub fn to_json(&self) -> Result<String, AssetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, entry: AssetEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Look up an entry.
    pub fn entry(&self, name: &str) -> Result<&AssetEntry, AssetError> {
        self.entries
            .get(name)
            .ok_or_else(|| AssetError::UnknownAsset(name.to_string()))
    }

    /// Size of a single-image asset.
    pub fn image(&self, name: &str) -> Result<ImageSize, AssetError> {
        match self.entry(name)? {
            AssetEntry::Image { size } => Ok(*size),
            _ => Err(AssetError::WrongShape {
                asset: name.to_string(),
                expected: "a single image",
            }),
        }
    }

    /// Size of variant `index` of an image-list asset.
    pub fn variant(&self, name: &str, index: usize) -> Result<ImageSize, AssetError> {
        match self.entry(name)? {
            AssetEntry::Images { sizes } => sizes.get(index).copied().ok_or_else(|| {
                AssetError::UnknownVariant {
                    asset: name.to_string(),
                    variant: index,
                }
            }),
            _ => Err(AssetError::WrongShape {
                asset: name.to_string(),
                expected: "an image list",
            }),
        }
    }

    /// Number of variants of an image-list asset.
    pub fn variant_count(&self, name: &str) -> Result<usize, AssetError> {
        match self.entry(name)? {
            AssetEntry::Images { sizes } => Ok(sizes.len()),
            _ => Err(AssetError::WrongShape {
                asset: name.to_string(),
                expected: "an image list",
            }),
        }
    }

    /// Animation `action` of an animation-set asset.
    pub fn animation(&self, name: &str, action: &str) -> Result<&AnimationSpec, AssetError> {
        let spec = match self.entry(name)? {
            AssetEntry::Animations { actions } => {
                actions.get(action).ok_or_else(|| AssetError::UnknownAction {
                    asset: name.to_string(),
                    action: action.to_string(),
                })?
            }
            _ => {
                return Err(AssetError::WrongShape {
                    asset: name.to_string(),
                    expected: "an animation set",
                })
            }
        };

        if spec.frames.is_empty() || spec.img_duration == 0 {
            return Err(AssetError::EmptyAnimation {
                asset: name.to_string(),
                action: action.to_string(),
            });
        }

        Ok(spec)
    }

    /// Size of frame `frame` of an animation.
    pub fn animation_frame(
        &self,
        name: &str,
        action: &str,
        frame: usize,
    ) -> Result<ImageSize, AssetError> {
        let spec = self.animation(name, action)?;
        spec.frames.get(frame).copied().ok_or_else(|| AssetError::UnknownVariant {
            asset: format!("{}/{}", name, action),
            variant: frame,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
