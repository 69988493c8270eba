//! Game Events
//!
//! Events generated during a tick for the audio collaborator, replay logs
//! and tests.

use serde::{Deserialize, Serialize};

use crate::core::vec2::Vec2;

/// Sounds the frontend should play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    /// Player jumped (ground or wall kick)
    Jump,
    /// Player started a dash
    Dash,
    /// Enemy fired a projectile
    Shoot,
    /// Something was killed
    Hit,
    /// Player was killed
    Hurt,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Play a sound
    Sound {
        /// Which sound
        cue: SoundCue,
    },

    /// Player died
    PlayerDied {
        /// Where
        position: Vec2,
    },

    /// Enemy destroyed by a dash
    EnemyKilled {
        /// Where
        position: Vec2,
        /// Enemies left in the level
        remaining: usize,
    },

    /// Level (re)loaded
    LevelLoaded {
        /// Index into the level order
        index: usize,
        /// Level identifier
        id: String,
    },

    /// Every enemy of the level is gone
    LevelCompleted {
        /// Index into the level order
        index: usize,
    },
}

/// A game event stamped with its tick.
///
/// A tick's events are listed in the order the frame phases produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, data: GameEventData) -> Self {
        Self { tick, data }
    }

    /// Create sound event.
    pub fn sound(tick: u32, cue: SoundCue) -> Self {
        Self::new(tick, GameEventData::Sound { cue })
    }

    /// Create enemy killed event.
    pub fn enemy_killed(tick: u32, position: Vec2, remaining: usize) -> Self {
        Self::new(tick, GameEventData::EnemyKilled { position, remaining })
    }

    /// Create level loaded event.
    pub fn level_loaded(tick: u32, index: usize, id: impl Into<String>) -> Self {
        Self::new(tick, GameEventData::LevelLoaded { index, id: id.into() })
    }

    /// Create level completed event.
    pub fn level_completed(tick: u32, index: usize) -> Self {
        Self::new(tick, GameEventData::LevelCompleted { index })
    }

    /// Sound cue carried by this event, if any.
    pub fn sound_cue(&self) -> Option<SoundCue> {
        match self.data {
            GameEventData::Sound { cue } => Some(cue),
            _ => None,
        }
    }
}
