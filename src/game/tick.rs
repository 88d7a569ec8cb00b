//! Authoritative Simulation Tick
//!
//! One call advances the whole run by a scaled `dt`. Phase order is fixed
//! so the same inputs always produce the same events and state hash.

use tracing::{debug, info};

use crate::game::action::{ActionEvent, ActionOutput};
use crate::game::collision::{Strike, TargetView};
use crate::game::config::SimConfig;
use crate::game::enemy::{Contact, ContactKind, EnemyTier};
use crate::game::error::SimError;
use crate::game::events::{DespawnReason, EventPriority, GameEvent, GameEventData};
use crate::game::hit_registry::TargetId;
use crate::game::input::{InputFrame, InputRecording};
use crate::game::presentation::FrameSnapshot;
use crate::game::world::{RunPhase, World};

/// Result of a tick.
#[derive(Clone, Debug)]
pub struct TickResult {
    /// Events generated this tick, in processing order
    pub events: Vec<GameEvent>,
    /// World after the tick
    pub snapshot: FrameSnapshot,
    /// False when the clock was stopped (paused or game over)
    pub advanced: bool,
    /// Whether the run is over
    pub game_over: bool,
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `world` - The run (will be mutated)
/// * `input` - Player input for this tick
/// * `dt` - Scaled seconds to advance; negative or non-finite values count as zero
///
/// An upgrade choice in `input` is applied even while the clock is stopped,
/// since choosing is what restarts it.
pub fn tick(world: &mut World, input: &InputFrame, dt: f32) -> TickResult {
    if world.is_game_over() {
        return finish(world, false);
    }

    if let Some(choice) = input.upgrade_choice {
        if let Err(err) = world.choose_upgrade(choice as usize) {
            debug!("upgrade choice {} ignored: {}", choice, err);
        }
    }

    if world.is_paused() {
        return finish(world, false);
    }

    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

    // 0. Advance tick counter
    world.tick += 1;

    // 1. Apply player input
    apply_input(world, input, dt);

    // 2. Advance the action state machine and apply its strikes
    let targets = world.target_views();
    for strike in advance_controller(world, dt, &targets) {
        world.apply_strike(&strike);
    }

    // 3. Move projectiles, each against the enemies still standing
    advance_projectiles(world, dt);

    // 4. Drop spent projectiles
    world.projectiles.retain(|_, p| p.is_alive());

    // 5. Enemy AI against a frozen view of the player
    advance_enemies(world, dt);

    // 6. Wave pacing and spawns
    if !world.is_game_over() {
        advance_waves(world, dt);
    }

    // 7. Remove finished enemies
    despawn_finished(world);

    // 8. Advance clock
    world.time += dt as f64;

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(
        tick = world.tick,
        enemies = world.agents.len(),
        projectiles = world.projectiles.len(),
        "tick complete"
    );

    finish(world, true)
}

fn finish(world: &mut World, advanced: bool) -> TickResult {
    TickResult {
        events: world.take_events(),
        snapshot: FrameSnapshot::capture(world),
        advanced,
        game_over: world.is_game_over(),
    }
}

/// Movement, facing and action requests.
fn apply_input(world: &mut World, input: &InputFrame, dt: f32) {
    world.player.face_toward(input.aim);
    world.player.advance(dt, input.move_vector());

    world.controller.set_guard_held(input.guard_held());
    if input.attack_pressed() {
        world.controller.request_attack();
    }
    for slot in 1..=3 {
        if input.skill_pressed(slot) {
            world.controller.request_slot(slot);
        }
    }

    if input.skip_wave_pressed() && world.skip_wave() {
        info!("wave skipped at tick {}", world.tick);
    }
}

fn advance_controller(world: &mut World, dt: f32, targets: &[TargetView]) -> Vec<Strike> {
    let output = world
        .controller
        .tick(dt, world.player.position, world.player.facing, targets);
    route_action_output(world, output)
}

/// Turn controller output into events, projectiles and the health cost.
fn route_action_output(world: &mut World, output: ActionOutput) -> Vec<Strike> {
    for event in output.events {
        let data = match event {
            ActionEvent::Started(action) => GameEventData::ActionStarted { action },
            ActionEvent::Ended { action, reason } => GameEventData::ActionEnded { action, reason },
        };
        world.push_event(GameEvent::action(world.tick, data));
    }

    if output.sacrifice {
        let before = world.player.hp();
        world.player.sacrifice_to_one();
        let hp_lost = before - world.player.hp();
        world.push_event(GameEvent::new(
            world.tick,
            EventPriority::Damage,
            GameEventData::HealthSacrificed { hp_lost },
        ));
    }

    for spawn in &output.spawns {
        world.spawn_projectile(spawn);
    }

    output.strikes
}

/// Projectiles resolve one at a time in id order, so one never spends
/// itself on an enemy an earlier one killed this tick.
fn advance_projectiles(world: &mut World, dt: f32) {
    let ids: Vec<u32> = world.projectiles.keys().copied().collect();
    for id in ids {
        let targets = world.target_views();
        let strikes = match world.projectiles.get_mut(&id) {
            Some(projectile) => projectile.tick(dt, &targets),
            None => continue,
        };
        for strike in &strikes {
            world.apply_strike(strike);
        }
    }
}

fn advance_enemies(world: &mut World, dt: f32) {
    let view = world.player_view();

    // Collect first: contacts mutate the player and other enemies
    let contacts: Vec<Contact> = world
        .agents
        .values_mut()
        .filter_map(|agent| agent.tick(dt, &view))
        .collect();

    for contact in contacts {
        resolve_contact(world, &contact);
    }
}

fn resolve_contact(world: &mut World, contact: &Contact) {
    let tick = world.tick;
    match contact.kind {
        ContactKind::Guarded => {
            world.push_event(GameEvent::new(
                tick,
                EventPriority::Damage,
                GameEventData::ContactGuarded { enemy_id: contact.enemy },
            ));
        }
        ContactKind::Parried => {
            let counter = world
                .controller
                .on_parry_contact(contact.enemy, contact.enemy_position, world.player.position);
            if let Some(strike) = counter {
                world.push_event(GameEvent::new(
                    tick,
                    EventPriority::Damage,
                    GameEventData::ParryCounter {
                        enemy_id: contact.enemy,
                        damage: strike.damage,
                    },
                ));
                world.apply_strike(&strike);
            }
        }
        ContactKind::Hit => {
            if !world.player.is_alive() {
                return;
            }
            let outcome = world.player.take_damage(contact.damage);
            world.push_event(GameEvent::player_damaged(
                tick,
                contact.enemy,
                outcome.dealt,
                world.player.hp(),
            ));

            if let Some(push) = contact.player_push {
                let boss = &world.config.boss;
                let (speed, duration) = (boss.player_knockback_speed, boss.player_knockback_duration);
                world.player.apply_knockback(push, speed, duration);
            }

            if outcome.killed {
                end_run(world);
            }
        }
    }
}

fn end_run(world: &mut World) {
    world.phase = RunPhase::GameOver;
    world.controller.cancel();
    let output = world.controller.drain();
    route_action_output(world, output);
    world.push_event(GameEvent::player_died(world.tick));
    info!("player died at tick {} on wave {}", world.tick, world.waves.record().index);
}

fn advance_waves(world: &mut World, dt: f32) {
    let spawned = world.waves.tick(
        dt,
        world.player.position,
        &mut world.rng,
        &world.config.enemy,
        &world.config.boss,
    );

    for agent in spawned {
        world.push_event(GameEvent::new(
            world.tick,
            EventPriority::Other,
            GameEventData::EnemySpawned {
                enemy_id: agent.id(),
                tier: agent.tier(),
                position: agent.position(),
            },
        ));
        world.agents.insert(agent.id(), agent);
    }

    world.collect_wave_signals();
}

fn despawn_finished(world: &mut World) {
    let finished: Vec<(TargetId, EnemyTier, DespawnReason)> = world
        .agents
        .values()
        .filter(|agent| agent.is_finished())
        .map(|agent| {
            let reason = if agent.body().is_expired() {
                DespawnReason::Expended
            } else {
                DespawnReason::Killed
            };
            (agent.id(), agent.tier(), reason)
        })
        .collect();

    for (enemy_id, tier, reason) in finished {
        world.agents.remove(&enemy_id);
        world.push_event(GameEvent::enemy_despawned(world.tick, enemy_id, reason));
        if tier == EnemyTier::Boss {
            world.push_event(GameEvent::new(
                world.tick,
                EventPriority::EnemyRemoval,
                GameEventData::BossDefeated { enemy_id },
            ));
        }
    }
}

/// Replay a run from recorded inputs.
///
/// Returns the final world and every event, including those emitted at
/// construction.
pub fn replay_run(config: SimConfig, recording: &InputRecording) -> Result<(World, Vec<GameEvent>), SimError> {
    let mut world = World::new(config, recording.seed)?;
    let mut all_events = world.take_events();

    for (_, frame) in recording.replay_iter() {
        let result = tick(&mut world, &frame, recording.dt);
        all_events.extend(result.events);
        if result.game_over {
            break;
        }
    }

    Ok((world, all_events))
}
