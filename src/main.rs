//! Ninja Runtime
//!
//! Headless run of the platformer: plays a scripted input sequence,
//! then replays the recording and checks the state hash matches.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ninja_runtime::{
    TICK_RATE, VERSION,
    core::vec2::Vec2,
    game::{
        assets::AssetCatalog,
        events::GameEventData,
        input::{InputFrame, InputRecording},
        level::{
            DirectoryLevels, LevelSource, MemoryLevels, DEFAULT_MAP_DIR, LEVELS_ORDER,
            SPAWN_ENEMY, SPAWN_HARMLESS, SPAWN_PLAYER, TREE_VARIANT,
        },
        session::{LevelSession, SessionConfig},
        tick::{replay, tick},
        tilemap::{OffgridTile, TileGrid, TileKind},
    },
};

/// Ticks the demo runs for (20 seconds).
const DEMO_TICKS: u32 = 1200;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Ninja Runtime v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let dir = Path::new(DEFAULT_MAP_DIR);
    if dir.is_dir() {
        info!("Playing levels from {}", dir.display());
        let levels = LEVELS_ORDER.iter().map(|id| id.to_string()).collect();
        demo_run(DirectoryLevels::new(dir), levels)
    } else {
        info!("{} not found, playing the built-in demo level", dir.display());
        let source = MemoryLevels::new().with("demo", &demo_level())?;
        demo_run(source, vec!["demo".to_string()])
    }
}

/// Small arena: a floor with a wall at each end, one armed enemy, one
/// harmless enemy and a tree.
fn demo_level() -> TileGrid {
    let mut grid = TileGrid::new(16);
    for x in 0..40 {
        grid.place_on_grid((x, 10), TileKind::Grass, 1);
    }
    for y in 5..10 {
        grid.place_on_grid((0, y), TileKind::Stone, 1);
        grid.place_on_grid((39, y), TileKind::Stone, 1);
    }
    grid.autotile();

    grid.place_on_grid((3, 9), TileKind::Spawners, SPAWN_PLAYER);
    grid.place_on_grid((20, 9), TileKind::Spawners, SPAWN_ENEMY);
    grid.place_on_grid((32, 9), TileKind::Spawners, SPAWN_HARMLESS);
    grid.place_offgrid(OffgridTile {
        kind: TileKind::LargeDecor,
        variant: TREE_VARIANT,
        pos: Vec2::new(120.0, 115.0),
    });
    grid
}

/// Scripted input: run right, hop, dash, run back.
fn scripted_input(t: u32) -> InputFrame {
    let mut input = InputFrame::new()
        .with(InputFrame::RIGHT, (60..400).contains(&t) || (700..900).contains(&t))
        .with(InputFrame::LEFT, (450..650).contains(&t));
    input.set(InputFrame::JUMP, t % 150 == 100);
    input.set(InputFrame::DASH, t % 200 == 180);
    input
}

fn demo_run<S: LevelSource + Clone>(source: S, levels: Vec<String>) -> Result<()> {
    info!("=== Starting Demo Run ===");

    let rng_seed = 12345u64;
    let config = SessionConfig {
        levels,
        rng_seed,
        ..SessionConfig::default()
    };
    let assets = AssetCatalog::standard();
    let mut session = LevelSession::new(config.clone(), source.clone(), assets.clone())?;
    let mut recording = InputRecording::new(rng_seed, config.start_level);

    info!("RNG Seed: {}", rng_seed);
    info!("Running {} ticks...", DEMO_TICKS);

    let mut total_events = 0;
    let mut total_draws = 0;
    for t in 0..DEMO_TICKS {
        let input = scripted_input(t);
        recording.record(t, input);

        let result = tick(&mut session, input)?;
        total_events += result.events.len();
        total_draws += result.draw.len();

        // Log important events
        for event in &result.events {
            match &event.data {
                GameEventData::EnemyKilled { position, remaining } => {
                    info!("Tick {}: enemy killed at {} ({} left)", t, position, remaining);
                }
                GameEventData::LevelCompleted { index } => {
                    info!("Tick {}: level {} completed", t, index);
                }
                _ => {}
            }
        }

        // Report every 5 seconds
        if t % 300 == 0 {
            info!(
                "Tick {}: player at {}, {} enemies, {} particles",
                t,
                session.player.view().pos,
                session.enemies.len(),
                session.effects.particles.len()
            );
        }
    }

    let hash = session.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Total events: {}, draw commands: {}", total_events, total_draws);
    info!("Recording: {} ticks, {} input changes", recording.tick_count, recording.deltas().len());

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let mut replay_session = LevelSession::new(config, source, assets)?;
    let replay_hash = replay(&mut replay_session, &recording)?;
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    ensure!(hash == replay_hash, "DETERMINISM FAILURE: Hashes differ!");
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
