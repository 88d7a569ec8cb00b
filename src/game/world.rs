//! World State
//!
//! Owns every actor of a run and applies the cross-actor outcomes they
//! return. Actors never hold references to each other; the world hands
//! them read-only views and routes strikes, contacts and kills.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::game::action::ActionController;
use crate::game::collision::{Strike, TargetView};
use crate::game::config::SimConfig;
use crate::game::enemy::{Agent, EnemyTier};
use crate::game::error::{SelectionError, SimError};
use crate::game::events::{DespawnReason, EventPriority, GameEvent, GameEventData};
use crate::game::hit_registry::TargetId;
use crate::game::player::{Player, PlayerView};
use crate::game::progression::{Progression, UpgradeOption};
use crate::game::projectile::{Projectile, ProjectileSpawn};
use crate::game::rig::{ActorRig, BindingReport};
use crate::game::wave::{WaveDirector, WaveSignal};

// =============================================================================
// RUN PHASE
// =============================================================================

/// Whether the run is still going.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Active gameplay
    #[default]
    Playing,
    /// Player died
    GameOver,
}

// =============================================================================
// WORLD
// =============================================================================

/// Complete state of a run.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Clone, Debug)]
pub struct World {
    /// Ticks advanced (paused ticks are not counted)
    pub tick: u32,

    /// Scaled seconds simulated
    pub time: f64,

    /// Run phase
    pub phase: RunPhase,

    /// RNG seed (for verification)
    pub seed: u64,

    /// Deterministic RNG state
    pub rng: DeterministicRng,

    /// Configuration the world was built with
    pub config: SimConfig,

    /// Player body
    pub player: Player,

    /// Player action state machine
    pub controller: ActionController,

    /// Enemies by id
    pub agents: BTreeMap<TargetId, Agent>,

    /// Projectiles by id
    pub projectiles: BTreeMap<u32, Projectile>,

    /// Next projectile ID (monotonic counter)
    pub next_projectile_id: u32,

    /// Wave pacing
    pub waves: WaveDirector,

    /// Experience and upgrades
    pub progression: Progression,

    /// What rig binding found
    pub binding: BindingReport,

    /// Explicit pause (menu), on top of the upgrade pause
    pub manual_pause: bool,

    /// Events generated since the last drain
    pending_events: Vec<GameEvent>,
}

impl World {
    /// Build a run. Fails on invalid config or a rig without a weapon.
    pub fn new(config: SimConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let (rig, binding) = ActorRig::bind(&config.rig)?;

        let mut world = Self {
            tick: 0,
            time: 0.0,
            phase: RunPhase::Playing,
            seed,
            rng: DeterministicRng::new(seed),
            player: Player::new(&config.player),
            controller: ActionController::new(config.action.clone(), rig),
            agents: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            next_projectile_id: 1,
            waves: WaveDirector::new(config.wave.clone()),
            progression: Progression::new(config.progression.clone()),
            binding,
            manual_pause: false,
            pending_events: Vec::new(),
            config,
        };
        world.collect_wave_signals();
        info!("world created: seed={} weapon={}", seed, world.binding.weapon);
        Ok(world)
    }

    /// Cancel everything in flight and restart from wave 1 with the same
    /// seed and config.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.tick = 0;
        self.time = 0.0;
        self.phase = RunPhase::Playing;
        self.rng = DeterministicRng::new(self.seed);
        self.player = Player::new(&self.config.player);
        self.agents.clear();
        self.projectiles.clear();
        self.next_projectile_id = 1;
        self.waves.reset();
        self.progression.reset();
        self.manual_pause = false;
        self.pending_events.clear();
        self.collect_wave_signals();
        info!("world reset");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Is the simulation clock stopped?
    pub fn is_paused(&self) -> bool {
        self.manual_pause || self.progression.is_paused()
    }

    /// Has the player died?
    pub fn is_game_over(&self) -> bool {
        self.phase == RunPhase::GameOver
    }

    /// Hit-test views of every strikable enemy, in id order.
    pub fn target_views(&self) -> Vec<TargetView> {
        self.agents
            .values()
            .filter(|a| a.is_hittable())
            .map(Agent::target_view)
            .collect()
    }

    /// Read-only player view for enemy AI.
    pub fn player_view(&self) -> PlayerView {
        self.player.view(self.controller.exposure())
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.seed, |hasher| {
            hasher.update_f64(self.time);
            hasher.update_u8(self.phase as u8);
            hasher.update_u64(self.rng.state()[0]);
            hasher.update_u64(self.rng.state()[1]);

            self.player.hash_into(hasher);
            self.controller.hash_into(hasher);

            // BTreeMap guarantees id order
            hasher.update_u32(self.agents.len() as u32);
            for agent in self.agents.values() {
                agent.hash_into(hasher);
            }
            hasher.update_u32(self.projectiles.len() as u32);
            for projectile in self.projectiles.values() {
                projectile.hash_into(hasher);
            }

            self.waves.hash_into(hasher);
            self.progression.hash_into(hasher);
        })
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Toggle the explicit pause.
    pub fn set_paused(&mut self, paused: bool) {
        if self.manual_pause != paused {
            debug!("manual pause: {}", paused);
        }
        self.manual_pause = paused;
    }

    /// Apply option `index` of the upgrade on offer and present the next
    /// queued one, if any.
    pub fn choose_upgrade(&mut self, index: usize) -> Result<UpgradeOption, SelectionError> {
        let option = self.progression.choose(index)?;
        self.apply_upgrade(option);
        self.push_event(GameEvent::new(
            self.tick,
            EventPriority::Progression,
            GameEventData::UpgradeChosen { option },
        ));
        self.present_next_offer();
        Ok(option)
    }

    /// End the current wave and remove every enemy without kill credit.
    pub fn skip_wave(&mut self) -> bool {
        if !self.waves.skip_wave() {
            return false;
        }
        let removed: Vec<TargetId> = self.agents.keys().copied().collect();
        self.agents.clear();
        for enemy_id in removed {
            self.push_event(GameEvent::enemy_despawned(self.tick, enemy_id, DespawnReason::Skipped));
        }
        self.collect_wave_signals();
        true
    }

    /// Launch a projectile and return its id.
    pub fn spawn_projectile(&mut self, spawn: &ProjectileSpawn) -> u32 {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        let projectile = Projectile::new(id, spawn, &self.config.projectile);
        self.push_event(GameEvent::action(
            self.tick,
            GameEventData::ProjectileSpawned {
                projectile_id: id,
                kind: spawn.kind,
                position: spawn.origin,
            },
        ));
        self.projectiles.insert(id, projectile);
        id
    }

    // =========================================================================
    // Outcome routing
    // =========================================================================

    /// Apply one strike: damage, knockback, and kill bookkeeping.
    pub fn apply_strike(&mut self, strike: &Strike) {
        let tick = self.tick;
        let Some(agent) = self.agents.get_mut(&strike.target) else {
            return;
        };
        let outcome = agent.take_damage(strike.damage);
        if outcome.dealt == 0 {
            return;
        }
        if let Some(direction) = strike.knockback {
            if !outcome.killed {
                agent.apply_knockback(direction);
            }
        }
        let tier = agent.tier();
        let remaining = agent.body().hp();

        self.push_event(GameEvent::damage_dealt(tick, strike.target, outcome.dealt, strike.source, remaining));
        if outcome.killed {
            self.on_enemy_killed(strike.target, tier);
        }
    }

    fn on_enemy_killed(&mut self, enemy_id: TargetId, tier: EnemyTier) {
        let exp = self.progression.config().exp_for(tier);
        self.push_event(GameEvent::enemy_killed(self.tick, enemy_id, tier, exp));
        debug!("enemy {} killed ({:?}, {} exp)", enemy_id, tier, exp);

        self.waves.on_enemy_killed();
        self.collect_wave_signals();

        for level_up in self.progression.add_exp(exp) {
            self.player.increase_max_hp(level_up.max_hp_gain);
            self.controller.increase_damage(level_up.damage_gain);
            self.push_event(GameEvent::level_up(self.tick, level_up.level));
        }
        self.present_next_offer();
    }

    fn apply_upgrade(&mut self, option: UpgradeOption) {
        match option {
            UpgradeOption::Unlock(skill) => self.controller.unlock(skill),
            UpgradeOption::Heal(amount) => {
                self.player.heal(amount);
            }
            UpgradeOption::Damage(amount) => self.controller.increase_damage(amount),
            UpgradeOption::MaxHp(amount) => self.player.increase_max_hp(amount),
        }
    }

    fn present_next_offer(&mut self) {
        let controller = &self.controller;
        let owned = |skill| controller.is_unlocked(skill) || !controller.rig().supports(skill);
        let Some(options) = self.progression.present_next(owned, &mut self.rng) else {
            return;
        };
        let options = options.to_vec();
        if options.is_empty() {
            warn!("upgrade offer is empty");
        }
        self.pending_events.push(GameEvent::new(
            self.tick,
            EventPriority::Progression,
            GameEventData::UpgradeOffered { options },
        ));
    }

    /// Move wave director signals into the event queue.
    pub(crate) fn collect_wave_signals(&mut self) {
        for signal in self.waves.take_signals() {
            let data = match signal {
                WaveSignal::Announced { wave } => GameEventData::WaveAnnounced { wave },
                WaveSignal::Started { wave, quota } => GameEventData::WaveStarted { wave, quota },
                WaveSignal::Ended { wave, skipped } => GameEventData::WaveEnded { wave, skipped },
            };
            self.push_event(GameEvent::wave(self.tick, data));
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Queue an event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Drain queued events in processing order.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        events.sort();
        events
    }
}
