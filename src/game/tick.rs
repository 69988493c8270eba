//! Simulation Tick
//!
//! One call advances the session by exactly one frame and returns what to
//! draw and what happened. Phase order is fixed; every random roll comes
//! from the session RNG, so a seed plus an input recording reproduces a
//! run exactly.

use tracing::info;

use crate::core::hash::StateHash;
use crate::core::vec2::Vec2;
use crate::game::effects::ParticleKind;
use crate::game::entity::{EntityBehavior, FrameContext};
use crate::game::events::{GameEvent, SoundCue};
use crate::game::input::{InputFrame, InputRecording};
use crate::game::level::LevelSource;
use crate::game::render::DrawCommand;
use crate::game::session::{LevelSession, SessionError};

/// Frames after the last enemy dies before the next level loads.
pub const LEVEL_EXIT_FRAMES: i32 = 60;

/// Death counter value at which the fade-out starts.
pub const DEATH_FADE_FRAMES: u32 = 30;

/// Death counter value past which the level reloads.
pub const DEATH_RELOAD_FRAMES: u32 = 60;

/// Fade-out transition cap.
pub const TRANSITION_MAX: i32 = 30;

/// Leaf spawn roll: a leaf appears when `random * LEAF_SPAWN_ODDS < area`.
pub const LEAF_SPAWN_ODDS: f32 = 49999.0;

const LEAF_VELOCITY: Vec2 = Vec2::new(-0.1, 0.3);

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Tick that was simulated
    pub tick: u32,
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Draw commands in paint order
    pub draw: Vec<DrawCommand>,
    /// Level transition counter after the tick (0 = fully visible)
    pub transition: i32,
    /// Screenshake frames left after the tick
    pub screenshake: u32,
}

/// Run one simulation tick.
///
/// Edge-triggered intents (jump, dash) are applied first, then the frame
/// runs in phase order. Any error is fatal to the session.
pub fn tick<S: LevelSource>(
    session: &mut LevelSession<S>,
    input: InputFrame,
) -> Result<TickResult, SessionError> {
    let mut events = session.take_events();
    let mut draw = Vec::new();

    // 0. Apply intents
    apply_intents(session, input, &mut events);

    // 1. Screenshake decay and fade-in
    session.screenshake = session.screenshake.saturating_sub(1);
    if session.transition < 0 {
        session.transition += 1;
    }

    // 2. Level cleared: fade out, then advance
    if session.enemies.is_empty() {
        session.transition += 1;
        if session.transition > LEVEL_EXIT_FRAMES {
            let completed = session.level;
            let next = (completed + 1) % session.config.levels.len();
            info!("Level {} cleared, advancing to {}", completed, next);
            events.push(GameEvent::level_completed(session.tick, completed));
            session.load_level(next)?;
            events.append(&mut session.take_events());
        }
    }

    // 3. Player death: fade out, then reload
    if !session.player.is_alive() {
        session.player.dead += 1;
        if session.player.dead >= DEATH_FADE_FRAMES {
            session.transition = (session.transition + 1).min(TRANSITION_MAX);
        }
        if session.player.dead > DEATH_RELOAD_FRAMES {
            info!("Reloading level {}", session.level);
            session.load_level(session.level)?;
            events.append(&mut session.take_events());
        }
    }

    // 4. Camera
    session.follow_camera();
    let offset = session.render_offset();

    // 5. Tiles
    session
        .grid
        .render(offset, session.view_size(), &session.assets, &mut draw)?;

    // 6. Enemies
    let view = session.player.view();
    let mut killed = Vec::new();
    {
        let mut ctx = FrameContext {
            grid: &session.grid,
            effects: &mut session.effects,
            rng: &mut session.rng,
            screenshake: &mut session.screenshake,
            events: &mut events,
            tick: session.tick,
            player: view,
        };
        for (index, enemy) in session.enemies.iter_mut().enumerate() {
            let kill = enemy.update(&mut ctx, Vec2::ZERO);
            enemy.render(offset, &session.assets, &mut draw)?;
            if kill {
                killed.push(index);
            }
        }
    }
    for index in killed.into_iter().rev() {
        let enemy = session.enemies.remove(index);
        events.push(GameEvent::enemy_killed(
            session.tick,
            enemy.body().pos,
            session.enemies.len(),
        ));
    }

    // 7. Player
    if session.player.is_alive() {
        let view = session.player.view();
        let mut ctx = FrameContext {
            grid: &session.grid,
            effects: &mut session.effects,
            rng: &mut session.rng,
            screenshake: &mut session.screenshake,
            events: &mut events,
            tick: session.tick,
            player: view,
        };
        session.player.update(&mut ctx, input.movement());
        session.player.render(offset, &session.assets, &mut draw)?;
    }

    // 8. Projectiles (a dashing player is immune)
    let target = (session.player.is_alive() && session.player.dash.active_frames == 0)
        .then(|| session.player.body().rect());
    let report = session.effects.update_projectiles(
        &session.grid,
        target,
        &mut session.rng,
        offset,
        &session.assets,
        &mut draw,
    )?;
    if report.player_hit {
        let view = session.player.view();
        let mut ctx = FrameContext {
            grid: &session.grid,
            effects: &mut session.effects,
            rng: &mut session.rng,
            screenshake: &mut session.screenshake,
            events: &mut events,
            tick: session.tick,
            player: view,
        };
        session.player.die(&mut ctx);
    }

    // 9. Sparks
    session.effects.update_sparks(offset, &mut draw);

    // 10. Leaves
    spawn_leaves(session);

    // 11. Particles
    session
        .effects
        .update_particles(offset, &session.assets, &mut draw)?;

    let result = TickResult {
        tick: session.tick,
        events,
        draw,
        transition: session.transition,
        screenshake: session.screenshake,
    };
    session.tick += 1;
    Ok(result)
}

/// Jump and dash presses.
fn apply_intents<S: LevelSource>(
    session: &mut LevelSession<S>,
    input: InputFrame,
    events: &mut Vec<GameEvent>,
) {
    if !session.player.is_alive() {
        return;
    }

    if input.jump_pressed() && session.player.jump() {
        events.push(GameEvent::sound(session.tick, SoundCue::Jump));
    }

    if input.dash_pressed() {
        let view = session.player.view();
        let mut ctx = FrameContext {
            grid: &session.grid,
            effects: &mut session.effects,
            rng: &mut session.rng,
            screenshake: &mut session.screenshake,
            events,
            tick: session.tick,
            player: view,
        };
        session.player.dash(&mut ctx);
    }
}

/// Roll each tree for a falling leaf.
pub(crate) fn spawn_leaves<S: LevelSource>(session: &mut LevelSession<S>) {
    for area in &session.leaf_spawners {
        if session.rng.next_f32() * LEAF_SPAWN_ODDS < (area.w * area.h) as f32 {
            let x = area.x as f32 + session.rng.next_f32() * area.w as f32;
            let y = area.y as f32 + session.rng.next_f32() * area.h as f32;
            let frame = session.rng.next_int_range(0, 20) as u32;
            session
                .effects
                .spawn_particle(ParticleKind::Leaf, Vec2::new(x, y), LEAF_VELOCITY, frame);
        }
    }
}

/// Feed a whole recording through `tick` and return the final state hash.
///
/// The session must have been started with the recording's seed and level.
pub fn replay<S: LevelSource>(
    session: &mut LevelSession<S>,
    recording: &InputRecording,
) -> Result<StateHash, SessionError> {
    for (_, input) in recording.replay_iter() {
        tick(session, input)?;
    }
    Ok(session.compute_hash())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::assets::AssetCatalog;
    use crate::game::events::GameEventData;
    use crate::game::level::{MemoryLevels, SPAWN_ENEMY, SPAWN_HARMLESS, SPAWN_PLAYER, TREE_VARIANT};
    use crate::game::render::SpriteRef;
    use crate::game::session::{SessionConfig, TRANSITION_START};
    use crate::game::tilemap::{OffgridTile, TileGrid, TileKind};

    fn floor() -> TileGrid {
        let mut grid = TileGrid::new(16);
        for x in -5..30 {
            grid.place_on_grid((x, 5), TileKind::Grass, 1);
        }
        grid.place_on_grid((2, 4), TileKind::Spawners, SPAWN_PLAYER);
        grid
    }

    fn with_marker(mut grid: TileGrid, cell: (i32, i32), variant: u32) -> TileGrid {
        grid.place_on_grid(cell, TileKind::Spawners, variant);
        grid
    }

    fn start(levels: &[(&str, TileGrid)], seed: u64) -> LevelSession<MemoryLevels> {
        let mut source = MemoryLevels::new();
        for (id, grid) in levels {
            source.insert(*id, grid).unwrap();
        }
        let config = SessionConfig {
            levels: levels.iter().map(|(id, _)| id.to_string()).collect(),
            rng_seed: seed,
            ..SessionConfig::default()
        };
        LevelSession::new(config, source, AssetCatalog::standard()).unwrap()
    }

    #[test]
    fn test_cleared_level_advances_and_wraps() {
        let mut session = start(&[("a", floor()), ("b", floor())], 1);
        session.take_events();

        let mut loaded = Vec::new();
        for _ in 0..400 {
            let result = tick(&mut session, InputFrame::new()).unwrap();
            for event in &result.events {
                if let GameEventData::LevelLoaded { index, .. } = event.data {
                    loaded.push(index);
                    assert_eq!(result.transition, TRANSITION_START);
                    assert!(result
                        .events
                        .iter()
                        .any(|e| matches!(e.data, GameEventData::LevelCompleted { .. })));
                }
            }
        }
        assert_eq!(&loaded[..4], &[1, 0, 1, 0]);
    }

    #[test]
    fn test_clear_timing() {
        let mut session = start(&[("a", floor())], 1);
        session.take_events();

        // -30 climbs by 2 per frame to 0, then by 1 until it passes 60
        let mut frames = 0;
        loop {
            frames += 1;
            let result = tick(&mut session, InputFrame::new()).unwrap();
            if result
                .events
                .iter()
                .any(|e| matches!(e.data, GameEventData::LevelLoaded { .. }))
            {
                break;
            }
            assert!(frames < 200);
        }
        assert_eq!(frames, 15 + 61);
    }

    #[test]
    fn test_dead_player_reloads_level() {
        let level = with_marker(floor(), (25, 4), SPAWN_HARMLESS);
        let mut session = start(&[("a", level)], 2);
        for _ in 0..40 {
            tick(&mut session, InputFrame::new()).unwrap();
        }
        session.player.dead = 1;

        let mut reload_at = None;
        for frame in 1..=70 {
            let result = tick(&mut session, InputFrame::new()).unwrap();
            assert!(result.transition <= TRANSITION_MAX);
            let reloaded = result
                .events
                .iter()
                .any(|e| matches!(e.data, GameEventData::LevelLoaded { .. }));
            if reloaded {
                reload_at = Some(frame);
                break;
            }
            // Dead players are not drawn
            assert!(!result.draw.iter().any(|c| matches!(
                c,
                DrawCommand::Sprite { sprite: SpriteRef::Animated { asset: "player", .. }, .. }
            )));
        }
        assert_eq!(reload_at, Some(60));
        assert!(session.player.is_alive());
        assert_eq!(session.player.body().pos, Vec2::new(32.0, 64.0));
    }

    #[test]
    fn test_projectile_kills_player() {
        let level = with_marker(floor(), (25, 4), SPAWN_HARMLESS);
        let mut session = start(&[("a", level)], 3);
        let center = session.player.body().rect().center();
        session.effects.spawn_projectile(center - Vec2::new(1.5, 0.0), 1.5);

        let result = tick(&mut session, InputFrame::new()).unwrap();
        assert!(!session.player.is_alive());
        assert!(session.effects.projectiles.is_empty());
        assert!(result.screenshake >= 15);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::PlayerDied { .. })));
        assert!(result.events.iter().any(|e| e.sound_cue() == Some(SoundCue::Hurt)));
    }

    #[test]
    fn test_dashing_player_is_immune() {
        let level = with_marker(floor(), (25, 4), SPAWN_HARMLESS);
        let mut session = start(&[("a", level)], 3);
        session.player.dash.direction = 1;
        session.player.dash.ratio = 6;
        session.player.dash.active_frames = 5;
        let center = session.player.body().rect().center();
        session.effects.spawn_projectile(center - Vec2::new(1.5, 0.0), 1.5);

        tick(&mut session, InputFrame::new()).unwrap();
        assert!(session.player.is_alive());
        assert_eq!(session.effects.projectiles.len(), 1);
    }

    #[test]
    fn test_dash_kills_enemy_and_reports() {
        // Enemy one cell right of the player on the same floor
        let level = with_marker(with_marker(floor(), (3, 4), SPAWN_ENEMY), (25, 4), SPAWN_HARMLESS);
        let mut session = start(&[("a", level)], 4);

        let mut killed = false;
        let dash = InputFrame::from_flags(InputFrame::DASH);
        for frame in 0..60 {
            let input = if frame == 20 { dash } else { InputFrame::new() };
            let result = tick(&mut session, input).unwrap();
            if result
                .events
                .iter()
                .any(|e| matches!(e.data, GameEventData::EnemyKilled { remaining: 1, .. }))
            {
                killed = true;
                assert!(result.events.iter().any(|e| e.sound_cue() == Some(SoundCue::Hit)));
                break;
            }
        }
        assert!(killed);
        assert_eq!(session.enemies.len(), 1);
    }

    #[test]
    fn test_jump_intent_emits_sound() {
        let level = with_marker(floor(), (25, 4), SPAWN_HARMLESS);
        let mut session = start(&[("a", level)], 5);
        for _ in 0..20 {
            tick(&mut session, InputFrame::new()).unwrap();
        }
        let result = tick(&mut session, InputFrame::from_flags(InputFrame::JUMP)).unwrap();
        assert!(result.events.iter().any(|e| e.sound_cue() == Some(SoundCue::Jump)));
        assert_eq!(session.player.jumps, 0);
    }

    #[test]
    fn test_events_keep_emission_order() {
        let level = with_marker(floor(), (25, 4), SPAWN_HARMLESS);
        let mut session = start(&[("a", level)], 5);
        for _ in 0..20 {
            tick(&mut session, InputFrame::new()).unwrap();
        }
        let input = InputFrame::from_flags(InputFrame::JUMP | InputFrame::DASH);
        let result = tick(&mut session, input).unwrap();
        let cues: Vec<SoundCue> = result.events.iter().filter_map(|e| e.sound_cue()).collect();
        assert_eq!(cues, vec![SoundCue::Jump, SoundCue::Dash]);
        assert!(result.events.iter().all(|e| e.tick == 20));
    }

    #[test]
    fn test_tiles_drawn_before_entities() {
        let level = with_marker(floor(), (25, 4), SPAWN_HARMLESS);
        let mut session = start(&[("a", level)], 6);
        let result = tick(&mut session, InputFrame::new()).unwrap();

        let first_entity = result
            .draw
            .iter()
            .position(|c| matches!(c, DrawCommand::Sprite { sprite: SpriteRef::Animated { .. }, .. }))
            .unwrap();
        assert!(result.draw[..first_entity]
            .iter()
            .all(|c| matches!(c, DrawCommand::Sprite { sprite: SpriteRef::Indexed { .. }, .. })));
    }

    #[test]
    fn test_trees_drop_leaves() {
        let mut level = with_marker(floor(), (25, 4), SPAWN_HARMLESS);
        level.place_offgrid(OffgridTile {
            kind: TileKind::LargeDecor,
            variant: TREE_VARIANT,
            pos: Vec2::new(40.0, 30.0),
        });
        let mut session = start(&[("a", level)], 7);
        assert_eq!(session.leaf_spawners.len(), 1);

        for _ in 0..3000 {
            spawn_leaves(&mut session);
        }
        let leaves: Vec<_> = session
            .effects
            .particles
            .iter()
            .filter(|p| p.kind == ParticleKind::Leaf)
            .collect();
        assert!(!leaves.is_empty());
        for leaf in leaves {
            assert!(leaf.pos.x >= 44.0 && leaf.pos.x <= 67.0);
            assert!(leaf.pos.y >= 34.0 && leaf.pos.y <= 47.0);
            assert!(leaf.animation.frame() <= 20);
        }
    }

    #[test]
    fn test_replay_reproduces_hash() {
        let level = with_marker(with_marker(floor(), (12, 4), SPAWN_ENEMY), (25, 4), SPAWN_HARMLESS);
        let levels = [("a", level)];

        let mut live = start(&levels, 99);
        let mut recording = InputRecording::new(99, 0);
        for t in 0..300u32 {
            let mut input = InputFrame::new()
                .with(InputFrame::RIGHT, (20..120).contains(&t))
                .with(InputFrame::LEFT, (150..200).contains(&t));
            input.set(InputFrame::JUMP, t == 60 || t == 170);
            input.set(InputFrame::DASH, t == 90);
            recording.record(t, input);
            tick(&mut live, input).unwrap();
        }
        let expected = live.compute_hash();

        let mut replayed = start(&levels, 99);
        assert_eq!(replay(&mut replayed, &recording).unwrap(), expected);

        let mut other_seed = start(&levels, 100);
        assert_ne!(replay(&mut other_seed, &recording).unwrap(), expected);
    }
}
