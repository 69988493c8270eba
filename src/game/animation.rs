//! Frame Animation
//!
//! Tick-driven frame counters plus the per-entity action switcher.

use std::collections::BTreeMap;

use crate::game::assets::{AssetCatalog, AssetError, AnimationSpec};

/// Timing of one animation, detached from its images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationTiming {
    /// Number of frame images
    pub frame_count: u32,
    /// Ticks per frame image
    pub img_duration: u32,
    /// Wrap after the last frame
    pub looping: bool,
}

impl AnimationTiming {
    /// Extract timing from a catalog spec. The spec must be non-empty.
    pub fn from_spec(spec: &AnimationSpec) -> Self {
        Self {
            frame_count: spec.frames.len().max(1) as u32,
            img_duration: spec.img_duration.max(1),
            looping: spec.looping,
        }
    }

    /// Total ticks in one pass.
    #[inline]
    pub fn total_ticks(&self) -> u32 {
        self.img_duration * self.frame_count
    }
}

/// Running animation state.
///
/// `frame` counts ticks, not images. The visible image is
/// `frame / img_duration`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Animation {
    timing: AnimationTiming,
    frame: u32,
    done: bool,
}

impl Animation {
    /// Start at tick 0.
    pub fn new(timing: AnimationTiming) -> Self {
        Self {
            timing,
            frame: 0,
            done: false,
        }
    }

    /// Start at an arbitrary tick (particles spawn mid-animation).
    pub fn starting_at(timing: AnimationTiming, frame: u32) -> Self {
        Self {
            timing,
            frame,
            done: false,
        }
    }

    /// Advance one tick.
    pub fn update(&mut self) {
        let total = self.timing.total_ticks();
        if self.timing.looping {
            self.frame = (self.frame + 1) % total;
        } else {
            self.frame = (self.frame + 1).min(total - 1);
            if self.frame >= total - 1 {
                self.done = true;
            }
        }
    }

    /// Tick counter.
    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Index of the image to draw.
    #[inline]
    pub fn image_index(&self) -> usize {
        ((self.frame / self.timing.img_duration) as usize)
            .min(self.timing.frame_count as usize - 1)
    }

    /// Non-looping animation reached its last tick.
    #[inline]
    pub fn done(&self) -> bool {
        self.done
    }

    /// Timing this animation runs with.
    #[inline]
    pub fn timing(&self) -> AnimationTiming {
        self.timing
    }
}

/// Named entity animation states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// Standing still
    Idle,
    /// Walking or running
    Run,
    /// Airborne
    Jump,
    /// Ground slide (defined by the asset set, unused by the runtime)
    Slide,
    /// Clinging to a wall while falling
    WallSlide,
}

impl Action {
    /// Catalog key of this action.
    pub fn name(self) -> &'static str {
        match self {
            Action::Idle => "idle",
            Action::Run => "run",
            Action::Jump => "jump",
            Action::Slide => "slide",
            Action::WallSlide => "wall_slide",
        }
    }
}

/// Resolved actions for one entity plus the currently playing one.
///
/// All actions are looked up when the entity is created, so switching
/// actions during a frame never fails.
#[derive(Clone, Debug)]
pub struct Animator {
    asset: &'static str,
    timings: BTreeMap<Action, AnimationTiming>,
    action: Action,
    animation: Animation,
}

impl Animator {
    /// Resolve `actions` of `asset` from the catalog and start in `initial`.
    pub fn resolve(
        catalog: &AssetCatalog,
        asset: &'static str,
        actions: &[Action],
        initial: Action,
    ) -> Result<Self, AssetError> {
        let mut timings = BTreeMap::new();
        for action in actions.iter().copied().chain(std::iter::once(initial)) {
            let spec = catalog.animation(asset, action.name())?;
            timings.insert(action, AnimationTiming::from_spec(spec));
        }

        let animation = Animation::new(timings[&initial]);
        Ok(Self {
            asset,
            timings,
            action: initial,
            animation,
        })
    }

    /// Switch action. Restarts the animation only when the action changes.
    ///
    /// Actions that were not resolved keep the current action playing.
    pub fn set_action(&mut self, action: Action) {
        if action == self.action {
            return;
        }
        if let Some(timing) = self.timings.get(&action) {
            self.action = action;
            self.animation = Animation::new(*timing);
        }
    }

    /// Advance the active animation.
    #[inline]
    pub fn update(&mut self) {
        self.animation.update();
    }

    /// Active action.
    #[inline]
    pub fn action(&self) -> Action {
        self.action
    }

    /// Active animation.
    #[inline]
    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    /// Catalog entry the actions belong to.
    #[inline]
    pub fn asset(&self) -> &'static str {
        self.asset
    }
}

// =============================================================================
// TESTS
// =============================================================================
