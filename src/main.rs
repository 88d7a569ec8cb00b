//! Bladewave Simulation
//!
//! Headless demo run: a scripted player fights waves until it dies or the
//! time limit runs out, then the recorded inputs are replayed and the final
//! state hashes compared.

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bladewave::{
    SimConfig, Vec2, World, InputFrame, InputRecording,
    TICK_DT, TICK_RATE, VERSION,
    game::{
        events::GameEventData,
        tick::{tick, replay_run},
    },
};

/// Default demo seed
const DEFAULT_SEED: u64 = 12345;

/// Demo length (3 minutes of game time)
const DEMO_TICKS: u32 = TICK_RATE * 180;

fn main() -> Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Bladewave Sim v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = SimConfig::from_env().context("failed to load simulation config")?;
    let seed = match std::env::var("BLADEWAVE_SEED") {
        Ok(raw) => raw.parse().with_context(|| format!("invalid BLADEWAVE_SEED {:?}", raw))?,
        Err(_) => DEFAULT_SEED,
    };

    demo_run(config, seed)
}

/// Run the scripted demo and verify it replays to the same hash.
fn demo_run(config: SimConfig, seed: u64) -> Result<()> {
    info!("=== Starting Demo Run ===");
    info!("RNG Seed: {}", seed);

    let mut world = World::new(config.clone(), seed)?;
    let mut recording = InputRecording::new(seed, TICK_DT);
    let mut total_events = world.take_events().len();
    let mut last_report_tick = 0;

    for t in 0..DEMO_TICKS {
        let input = scripted_input(&world, t);
        recording.record(t, input);

        let result = tick(&mut world, &input, TICK_DT);
        total_events += result.events.len();

        // Report every 10 seconds of game time
        if world.tick >= last_report_tick + TICK_RATE * 10 {
            info!(
                "Tick {}: hp {}/{}, wave {} ({}/{}), level {}, {} enemies, {} events so far",
                world.tick,
                world.player.hp(),
                world.player.max_hp(),
                result.snapshot.wave.index,
                result.snapshot.wave.kills,
                result.snapshot.wave.quota,
                result.snapshot.progression.level,
                world.agents.len(),
                total_events
            );
            last_report_tick = world.tick;
        }

        // Log important events
        for event in &result.events {
            match &event.data {
                GameEventData::WaveStarted { wave, quota } => {
                    info!("Wave {} started (quota {})", wave, quota);
                }
                GameEventData::WaveEnded { wave, skipped } => {
                    info!("Wave {} cleared{}", wave, if *skipped { " (skipped)" } else { "" });
                }
                GameEventData::LevelUp { level } => {
                    info!("Level up: {}", level);
                }
                GameEventData::UpgradeChosen { option } => {
                    info!("Upgrade chosen: {}", option);
                }
                GameEventData::BossDefeated { enemy_id } => {
                    info!("Boss {} defeated", enemy_id);
                }
                GameEventData::PlayerDied => {
                    info!("Player died at tick {}", event.tick);
                }
                _ => {}
            }
        }

        if result.game_over {
            break;
        }
    }

    // Print final results
    info!("=== Run Results ===");
    let hash = world.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Reached wave {}, level {}", world.waves.record().index, world.progression.level());
    info!("Total events: {}", total_events);
    info!("Recorded {} input changes over {} frames", recording.delta_count(), recording.end_tick + 1);
    debug!("final snapshot: {}", bladewave::game::FrameSnapshot::capture(&world).to_json()?);

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let (replayed, _) = replay_run(config, &recording)?;
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        warn!("DETERMINISM FAILURE: Hashes differ!");
        bail!("replay hash mismatch")
    }
}

/// Simple bot: face the nearest enemy, keep a little distance, swing when
/// close, use whatever skills are unlocked, guard against bosses, and take
/// the first upgrade offered.
fn scripted_input(world: &World, t: u32) -> InputFrame {
    let mut input = InputFrame::new();
    if world.progression.is_paused() {
        input.upgrade_choice = Some(0);
        return input;
    }

    let me = world.player.position;
    let nearest = world
        .agents
        .values()
        .filter(|a| a.is_hittable())
        .min_by(|a, b| {
            let da = a.position().distance_squared(me);
            let db = b.position().distance_squared(me);
            da.total_cmp(&db)
        });

    let Some(enemy) = nearest else {
        // Drift back toward the middle between waves
        let home = Vec2::ZERO - me;
        if home.length() > 0.5 {
            input.move_x = home.x;
            input.move_y = home.y;
        }
        return input;
    };

    let target = enemy.position();
    let offset = target - me;
    let distance = offset.length();
    input.aim = Some(target);

    if distance < 1.0 {
        input.move_x = -offset.x;
        input.move_y = -offset.y;
    } else if distance > 1.5 {
        input.move_x = offset.x;
        input.move_y = offset.y;
    }

    if enemy.telegraph().is_some() {
        input.set_flag(InputFrame::FLAG_GUARD, true);
        return input;
    }

    if distance < 2.0 {
        input.set_flag(InputFrame::FLAG_ATTACK, true);
    }
    match t % 90 {
        0 => input.set_flag(InputFrame::FLAG_SKILL_1, true),
        30 => input.set_flag(InputFrame::FLAG_SKILL_2, distance < 2.5),
        60 => input.set_flag(InputFrame::FLAG_SKILL_3, world.player.hp() > world.player.max_hp() / 2),
        _ => {}
    }
    input
}
