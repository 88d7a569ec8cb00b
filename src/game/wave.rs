//! Wave Director
//!
//! Spawn scheduler and wave-progression tracker. Waves grow in quota and
//! batch size while the spawn interval shrinks geometrically:
//!
//! ```text
//! quota(n)    = base_quota + quota_step * (n - 1)
//! interval(n) = max(floor, base_interval / decay^(n - 1))
//! batch(n)    = n
//! ```
//!
//! Each wave is announced, waits out an intermission, then spawns on a
//! timer until the kill quota is met.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::boss::{BossAgent, BossConfig};
use crate::game::enemy::{Agent, EnemyAgent, EnemyConfig, EnemyStats, EnemyTier};
use crate::game::hit_registry::TargetId;

// =============================================================================
// CONFIG
// =============================================================================

/// Playable rectangle centered on the origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapBounds {
    /// Full width
    pub width: f32,
    /// Full height
    pub height: f32,
    /// Inset kept clear of spawns
    pub margin: f32,
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 14.0,
            margin: 1.0,
        }
    }
}

impl MapBounds {
    /// Half extents shrunk by the margin, never negative.
    pub fn spawn_half_extents(&self) -> (f32, f32) {
        (
            (self.width / 2.0 - self.margin).max(0.0),
            (self.height / 2.0 - self.margin).max(0.0),
        )
    }
}

/// Wave pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Kills required on wave 1
    pub base_quota: u32,
    /// Extra kills required per wave
    pub quota_step: u32,
    /// Spawn interval on wave 1 (seconds)
    pub base_spawn_interval: f32,
    /// Interval divides by this each wave
    pub spawn_interval_decay: f32,
    /// Interval never drops below this
    pub spawn_interval_floor: f32,
    /// Delay between announcement and first spawn tick
    pub intermission: f32,
    /// Spawns are rejected closer than this to the player
    pub min_spawn_distance: f32,
    /// Rejection-sampling attempts before the corner fallback
    pub spawn_attempts: u32,
    /// Elite roll probability
    pub elite_chance: f32,
    /// First wave on which elites can appear
    pub elite_from_wave: u32,
    /// A boss spawns at the start of every wave divisible by this
    pub boss_every: u32,
    /// Map rectangle
    pub map: MapBounds,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            base_quota: 10,
            quota_step: 10,
            base_spawn_interval: 3.0,
            spawn_interval_decay: 1.5,
            spawn_interval_floor: 0.2,
            intermission: 3.0,
            min_spawn_distance: 5.0,
            spawn_attempts: 30,
            elite_chance: 0.1,
            elite_from_wave: 3,
            boss_every: 5,
            map: MapBounds::default(),
        }
    }
}

// =============================================================================
// RECORD
// =============================================================================

/// Per-wave bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveRecord {
    /// 1-based wave number
    pub index: u32,
    /// Kills required to end the wave
    pub quota: u32,
    /// Kills so far
    pub kill_count: u32,
    /// Seconds between spawn batches
    pub spawn_interval: f32,
    /// Enemies per batch
    pub batch_size: u32,
}

impl WaveRecord {
    /// Record for wave `index` (clamped to at least 1).
    pub fn for_index(index: u32, config: &WaveConfig) -> Self {
        let index = index.max(1);
        let steps = index - 1;
        let interval = config.base_spawn_interval
            / config.spawn_interval_decay.powi(steps.min(i32::MAX as u32) as i32);

        Self {
            index,
            quota: config.base_quota.saturating_add(config.quota_step.saturating_mul(steps)),
            kill_count: 0,
            spawn_interval: interval.max(config.spawn_interval_floor),
            batch_size: index,
        }
    }

    /// Does this wave bring a boss?
    pub fn is_boss_wave(&self, config: &WaveConfig) -> bool {
        config.boss_every > 0 && self.index % config.boss_every == 0
    }
}

/// Where the director is in the cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum WavePhase {
    /// Announced, waiting to start
    Intermission {
        /// Seconds until spawning begins
        remaining: f32,
    },
    /// Spawning and counting kills
    Active {
        /// Seconds since the last batch
        spawn_timer: f32,
    },
}

/// Display and bookkeeping signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveSignal {
    /// A wave was announced
    Announced {
        /// Wave number
        wave: u32,
    },
    /// Spawning began
    Started {
        /// Wave number
        wave: u32,
        /// Kill quota
        quota: u32,
    },
    /// Quota met or skipped
    Ended {
        /// Wave number
        wave: u32,
        /// Ended by skip rather than kills
        skipped: bool,
    },
}

// =============================================================================
// DIRECTOR
// =============================================================================

/// Spawn scheduler and wave tracker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaveDirector {
    config: WaveConfig,
    record: WaveRecord,
    phase: WavePhase,
    next_enemy_id: TargetId,
    signals: Vec<WaveSignal>,
}

impl WaveDirector {
    /// Create a director with wave 1 announced.
    pub fn new(config: WaveConfig) -> Self {
        let mut director = Self {
            record: WaveRecord::for_index(1, &config),
            phase: WavePhase::Intermission { remaining: config.intermission },
            config,
            next_enemy_id: 1,
            signals: Vec::new(),
        };
        director.start_wave(1);
        director
    }

    /// Current wave bookkeeping.
    pub fn record(&self) -> &WaveRecord {
        &self.record
    }

    /// Current phase.
    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Spawning and counting kills?
    pub fn is_active(&self) -> bool {
        matches!(self.phase, WavePhase::Active { .. })
    }

    /// Seconds until the announced wave starts, if in intermission.
    pub fn announcement(&self) -> Option<f32> {
        match self.phase {
            WavePhase::Intermission { remaining } => Some(remaining),
            WavePhase::Active { .. } => None,
        }
    }

    /// Configuration.
    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    /// Announce wave `index`; spawning begins after the intermission.
    pub fn start_wave(&mut self, index: u32) {
        self.record = WaveRecord::for_index(index, &self.config);
        self.phase = WavePhase::Intermission {
            remaining: self.config.intermission,
        };
        info!(
            "wave {} announced: quota={} interval={:.3}s batch={}",
            self.record.index, self.record.quota, self.record.spawn_interval, self.record.batch_size
        );
        self.signals.push(WaveSignal::Announced {
            wave: self.record.index,
        });
    }

    /// Count a kill. Ignored outside an active wave. Returns true if this
    /// kill ended the wave.
    pub fn on_enemy_killed(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.record.kill_count += 1;
        debug!("wave {} kills {}/{}", self.record.index, self.record.kill_count, self.record.quota);

        if self.record.kill_count >= self.record.quota {
            self.end_wave(false);
            true
        } else {
            false
        }
    }

    /// End the active wave immediately. The caller removes live enemies.
    /// Returns false (and does nothing) outside an active wave.
    pub fn skip_wave(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.end_wave(true);
        true
    }

    fn end_wave(&mut self, skipped: bool) {
        let wave = self.record.index;
        info!("wave {} {}", wave, if skipped { "skipped" } else { "cleared" });
        self.signals.push(WaveSignal::Ended { wave, skipped });
        self.start_wave(wave + 1);
    }

    /// Advance timers and return newly spawned enemies.
    pub fn tick(
        &mut self,
        dt: f32,
        player_position: Vec2,
        rng: &mut DeterministicRng,
        enemy: &EnemyConfig,
        boss: &BossConfig,
    ) -> Vec<Agent> {
        let mut spawned = Vec::new();

        match self.phase {
            WavePhase::Intermission { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = WavePhase::Intermission { remaining };
                    return spawned;
                }
                self.phase = WavePhase::Active { spawn_timer: 0.0 };
                self.signals.push(WaveSignal::Started {
                    wave: self.record.index,
                    quota: self.record.quota,
                });
                info!("wave {} started", self.record.index);

                if self.record.is_boss_wave(&self.config) {
                    let position = self.spawn_position(player_position, rng);
                    let id = self.allocate_id();
                    spawned.push(Agent::Boss(BossAgent::new(id, position, self.record.index, enemy, boss)));
                }
            }
            WavePhase::Active { spawn_timer } => {
                let spawn_timer = spawn_timer + dt;
                if spawn_timer >= self.record.spawn_interval {
                    self.phase = WavePhase::Active { spawn_timer: 0.0 };
                    for _ in 0..self.record.batch_size {
                        spawned.push(self.spawn_grunt(player_position, rng, enemy, boss));
                    }
                } else {
                    self.phase = WavePhase::Active { spawn_timer };
                }
            }
        }

        spawned
    }

    fn spawn_grunt(
        &mut self,
        player_position: Vec2,
        rng: &mut DeterministicRng,
        enemy: &EnemyConfig,
        boss: &BossConfig,
    ) -> Agent {
        let position = self.spawn_position(player_position, rng);
        let elite = self.record.index >= self.config.elite_from_wave
            && rng.next_bool(self.config.elite_chance);
        let tier = if elite { EnemyTier::Elite } else { EnemyTier::Normal };

        let stats = EnemyStats::for_wave(self.record.index, tier, enemy, boss);
        let id = self.allocate_id();
        Agent::Grunt(EnemyAgent::new(id, position, &stats, enemy))
    }

    /// Uniform sample inside the shrunk map, rejecting points too close to
    /// the player. Falls back to the bottom-left corner.
    pub fn spawn_position(&self, player_position: Vec2, rng: &mut DeterministicRng) -> Vec2 {
        let (half_w, half_h) = self.config.map.spawn_half_extents();
        let min_sq = self.config.min_spawn_distance * self.config.min_spawn_distance;

        for _ in 0..self.config.spawn_attempts {
            let candidate = rng.random_position_in(half_w, half_h);
            if candidate.distance_squared(player_position) >= min_sq {
                return candidate;
            }
        }
        Vec2::new(-half_w, -half_h)
    }

    fn allocate_id(&mut self) -> TargetId {
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        id
    }

    /// Drain pending signals.
    pub fn take_signals(&mut self) -> Vec<WaveSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Restart from wave 1.
    pub fn reset(&mut self) {
        self.next_enemy_id = 1;
        self.signals.clear();
        self.start_wave(1);
    }

    /// Feed into a state hash.
    pub fn hash_into(&self, hasher: &mut crate::core::hash::StateHasher) {
        hasher.update_u32(self.record.index);
        hasher.update_u32(self.record.kill_count);
        match self.phase {
            WavePhase::Intermission { remaining } => {
                hasher.update_u8(0);
                hasher.update_f32(remaining);
            }
            WavePhase::Active { spawn_timer } => {
                hasher.update_u8(1);
                hasher.update_f32(spawn_timer);
            }
        }
        hasher.update_u32(self.next_enemy_id);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn director() -> WaveDirector {
        WaveDirector::new(WaveConfig::default())
    }

    fn run(d: &mut WaveDirector, dt: f32, rng: &mut DeterministicRng) -> Vec<Agent> {
        d.tick(dt, Vec2::ZERO, rng, &EnemyConfig::default(), &BossConfig::default())
    }

    #[test]
    fn test_wave_record_formulas() {
        let config = WaveConfig::default();
        let w1 = WaveRecord::for_index(1, &config);
        assert_eq!(w1.quota, 10);
        assert_eq!(w1.batch_size, 1);
        assert!((w1.spawn_interval - 3.0).abs() < 1e-6);

        let w2 = WaveRecord::for_index(2, &config);
        assert_eq!(w2.quota, 20);
        assert!((w2.spawn_interval - 2.0).abs() < 1e-6);

        let w20 = WaveRecord::for_index(20, &config);
        assert_eq!(w20.quota, 200);
        assert_eq!(w20.spawn_interval, 0.2);
    }

    #[test]
    fn test_intermission_then_spawning() {
        let mut d = director();
        let mut rng = DeterministicRng::new(1);
        assert_eq!(d.take_signals(), vec![WaveSignal::Announced { wave: 1 }]);

        // 3s intermission
        for _ in 0..5 {
            assert!(run(&mut d, 0.5, &mut rng).is_empty());
        }
        assert!(!d.is_active());
        assert!(run(&mut d, 0.5, &mut rng).is_empty());
        assert!(d.is_active());
        assert_eq!(d.take_signals(), vec![WaveSignal::Started { wave: 1, quota: 10 }]);

        // First batch after one interval
        for _ in 0..5 {
            assert!(run(&mut d, 0.5, &mut rng).is_empty());
        }
        let batch = run(&mut d, 0.5, &mut rng);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id(), 1);
        assert_eq!(batch[0].tier(), EnemyTier::Normal);
    }

    #[test]
    fn test_kills_end_wave_and_schedule_next() {
        let mut d = director();
        let mut rng = DeterministicRng::new(1);

        // Kills before the wave starts are ignored
        assert!(!d.on_enemy_killed());
        run(&mut d, 3.0, &mut rng);
        assert!(d.is_active());

        for i in 0..9 {
            assert!(!d.on_enemy_killed());
            assert_eq!(d.record().kill_count, i + 1);
        }
        assert!(d.on_enemy_killed());

        assert_eq!(d.record().index, 2);
        assert_eq!(d.record().quota, 20);
        assert_eq!(d.record().kill_count, 0);
        assert!(d.record().spawn_interval < 3.0);
        assert_eq!(d.announcement(), Some(3.0));

        let signals = d.take_signals();
        assert!(signals.contains(&WaveSignal::Ended { wave: 1, skipped: false }));
        assert!(signals.contains(&WaveSignal::Announced { wave: 2 }));

        // Late kills during the intermission don't count
        assert!(!d.on_enemy_killed());
        assert_eq!(d.record().kill_count, 0);
    }

    #[test]
    fn test_skip_wave() {
        let mut d = director();
        let mut rng = DeterministicRng::new(1);
        assert!(!d.skip_wave());

        run(&mut d, 3.0, &mut rng);
        assert!(d.skip_wave());
        assert_eq!(d.record().index, 2);
        assert!(d.take_signals().contains(&WaveSignal::Ended { wave: 1, skipped: true }));
    }

    #[test]
    fn test_batch_size_grows() {
        let mut d = director();
        let mut rng = DeterministicRng::new(3);
        d.start_wave(3);
        run(&mut d, 3.0, &mut rng);

        let interval = d.record().spawn_interval;
        let batch = run(&mut d, interval, &mut rng);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_boss_on_fifth_wave() {
        let mut d = director();
        let mut rng = DeterministicRng::new(5);
        d.start_wave(5);

        let spawned = run(&mut d, 3.0, &mut rng);
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].tier(), EnemyTier::Boss);

        d.start_wave(6);
        assert!(run(&mut d, 3.0, &mut rng).is_empty());
    }

    #[test]
    fn test_spawn_fallback_corner() {
        let config = WaveConfig {
            min_spawn_distance: 100.0,
            ..WaveConfig::default()
        };
        let d = WaveDirector::new(config);
        let mut rng = DeterministicRng::new(9);
        assert_eq!(d.spawn_position(Vec2::ZERO, &mut rng), Vec2::new(-9.0, -6.0));
    }

    #[test]
    fn test_spawn_determinism() {
        let mut a = director();
        let mut b = director();
        let mut rng_a = DeterministicRng::new(42);
        let mut rng_b = DeterministicRng::new(42);
        a.start_wave(4);
        b.start_wave(4);

        for _ in 0..40 {
            let sa: Vec<Vec2> = run(&mut a, 0.25, &mut rng_a).iter().map(|e| e.position()).collect();
            let sb: Vec<Vec2> = run(&mut b, 0.25, &mut rng_b).iter().map(|e| e.position()).collect();
            assert_eq!(sa, sb);
        }
    }

    proptest! {
        #[test]
        fn test_spawns_respect_distance_and_bounds(seed in any::<u64>(), px in -9.0f32..9.0, py in -6.0f32..6.0) {
            let d = director();
            let mut rng = DeterministicRng::new(seed);
            let player = Vec2::new(px, py);
            let pos = d.spawn_position(player, &mut rng);

            let corner = Vec2::new(-9.0, -6.0);
            prop_assert!(pos == corner || pos.distance(player) >= 5.0);
            prop_assert!(pos.x.abs() <= 9.0 && pos.y.abs() <= 6.0);
        }

        #[test]
        fn test_quota_and_interval_formulas(n in 1u32..40) {
            let config = WaveConfig::default();
            let record = WaveRecord::for_index(n, &config);
            prop_assert_eq!(record.quota, 10 + 10 * (n - 1));
            let expected = (3.0f32 / 1.5f32.powi(n as i32 - 1)).max(0.2);
            prop_assert!((record.spawn_interval - expected).abs() < 1e-5);
            prop_assert_eq!(record.batch_size, n);
        }
    }
}
