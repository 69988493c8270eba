//! Input Intents and Recording
//!
//! The runtime consumes abstract intents, never device codes. One
//! `InputFrame` describes a single tick: which movement directions are
//! held and whether jump or dash was pressed on this tick.

use serde::{Deserialize, Serialize};

use crate::core::vec2::Vec2;

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Intent state for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Packed bits:
    /// - Bit 0: left held
    /// - Bit 1: right held
    /// - Bit 2: jump pressed this tick
    /// - Bit 3: dash pressed this tick
    pub flags: u8,
}

impl InputFrame {
    /// Left held
    pub const LEFT: u8 = 0x01;
    /// Right held
    pub const RIGHT: u8 = 0x02;
    /// Jump edge
    pub const JUMP: u8 = 0x04;
    /// Dash edge
    pub const DASH: u8 = 0x08;

    /// No intent at all.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Frame with the given bits set.
    pub const fn from_flags(flags: u8) -> Self {
        Self { flags }
    }

    /// Builder: set or clear a bit.
    #[inline]
    pub fn with(mut self, flag: u8, on: bool) -> Self {
        self.set(flag, on);
        self
    }

    /// Set or clear a bit.
    #[inline]
    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Left held.
    #[inline]
    pub fn left(&self) -> bool {
        self.flags & Self::LEFT != 0
    }

    /// Right held.
    #[inline]
    pub fn right(&self) -> bool {
        self.flags & Self::RIGHT != 0
    }

    /// Jump pressed this tick.
    #[inline]
    pub fn jump_pressed(&self) -> bool {
        self.flags & Self::JUMP != 0
    }

    /// Dash pressed this tick.
    #[inline]
    pub fn dash_pressed(&self) -> bool {
        self.flags & Self::DASH != 0
    }

    /// Horizontal axis: `right - left`, so both held cancel out.
    #[inline]
    pub fn movement_x(&self) -> f32 {
        self.right() as i32 as f32 - self.left() as i32 as f32
    }

    /// Movement vector handed to the player's physics update.
    #[inline]
    pub fn movement(&self) -> Vec2 {
        Vec2::new(self.movement_x(), 0.0)
    }
}

/// Delta-compressed entry: only stored when the input changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// Complete input recording of one session run.
///
/// Together with the seed and the starting level this is enough to replay
/// the run tick for tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputRecording {
    /// RNG seed of the recorded session
    pub rng_seed: u64,

    /// Level index the run started on
    pub start_level: usize,

    /// Number of recorded ticks (last tick + 1)
    pub tick_count: u32,

    /// Ticks where input CHANGED
    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputRecording {
    /// Empty recording.
    pub fn new(rng_seed: u64, start_level: usize) -> Self {
        Self {
            rng_seed,
            start_level,
            tick_count: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick. Only stored if it changed.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.tick_count = self.tick_count.max(tick + 1);
        if frame != self.last_frame {
            self.deltas.push(InputDelta { tick, frame });
            self.last_frame = frame;
        }
    }

    /// Input in effect at `tick`.
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// All stored deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Iterate `(tick, frame)` for every recorded tick.
    pub fn replay_iter(&self) -> impl Iterator<Item = (u32, InputFrame)> + '_ {
        (0..self.tick_count).map(|tick| (tick, self.get_input_at(tick)))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_axis() {
        assert_eq!(InputFrame::new().movement_x(), 0.0);
        assert_eq!(InputFrame::from_flags(InputFrame::LEFT).movement_x(), -1.0);
        assert_eq!(InputFrame::from_flags(InputFrame::RIGHT).movement_x(), 1.0);
        let both = InputFrame::from_flags(InputFrame::LEFT | InputFrame::RIGHT);
        assert_eq!(both.movement(), Vec2::ZERO);
    }

    #[test]
    fn test_flag_builders() {
        let frame = InputFrame::new()
            .with(InputFrame::JUMP, true)
            .with(InputFrame::DASH, true)
            .with(InputFrame::JUMP, false);
        assert!(!frame.jump_pressed());
        assert!(frame.dash_pressed());
        assert_eq!(frame, InputFrame::from_flags(InputFrame::DASH));
    }

    #[test]
    fn test_recording_delta_compression() {
        let mut rec = InputRecording::new(7, 0);
        let right = InputFrame::from_flags(InputFrame::RIGHT);
        for tick in 0..4 {
            rec.record(tick, right);
        }
        assert_eq!(rec.deltas().len(), 1);

        rec.record(4, InputFrame::new());
        assert_eq!(rec.deltas().len(), 2);
        assert_eq!(rec.get_input_at(2), right);
        assert_eq!(rec.get_input_at(10), InputFrame::new());
    }

    #[test]
    fn test_replay_iterator() {
        let mut rec = InputRecording::new(7, 0);
        rec.record(0, InputFrame::from_flags(InputFrame::LEFT));
        rec.record(3, InputFrame::from_flags(InputFrame::RIGHT));
        rec.record(5, InputFrame::from_flags(InputFrame::RIGHT));

        let frames: Vec<_> = rec.replay_iter().collect();
        assert_eq!(rec.tick_count, 6);
        assert_eq!(frames.len(), 6);
        assert!(frames[2].1.left());
        assert!(frames[3].1.right());
        assert!(frames[5].1.right());
    }

    #[test]
    fn test_idle_ticks_still_replay() {
        let mut rec = InputRecording::new(7, 0);
        rec.record(0, InputFrame::new());
        rec.record(1, InputFrame::new());
        assert!(rec.deltas().is_empty());
        assert_eq!(rec.replay_iter().count(), 2);
        assert_eq!(InputRecording::new(7, 0).replay_iter().count(), 0);
    }

    #[test]
    fn test_recording_json_roundtrip() {
        let mut rec = InputRecording::new(99, 2);
        rec.record(0, InputFrame::from_flags(InputFrame::JUMP));
        rec.record(1, InputFrame::new());

        let json = serde_json::to_string(&rec).unwrap();
        let back: InputRecording = serde_json::from_str(&json).unwrap();
        assert_eq!(back.deltas(), rec.deltas());
        assert_eq!(back.rng_seed, 99);
        assert_eq!(back.start_level, 2);
    }
}
