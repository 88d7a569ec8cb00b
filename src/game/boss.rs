//! Boss Agent
//!
//! An enemy body wrapped in a timed outer cycle:
//!
//! ```text
//! Pursuing (3.0s) -> Telegraph (1.0s, still) -> Dashing (0.2s @ 18) -> Pursuing
//! ```
//!
//! Knockback freezes the cycle. Death starts an inert 1.5 s sequence after
//! which the boss is removed and the victory signal fires.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::hash::StateHasher;
use crate::core::vec2::Vec2;
use crate::game::collision::{closest_point_on_segment, swept_circle_overlap};
use crate::game::enemy::{
    resolve_contact, Contact, ContactKind, DamageOutcome, EnemyAgent, EnemyConfig,
    EnemyState, EnemyStats, EnemyTier, TierScaling,
};
use crate::game::hit_registry::TargetId;
use crate::game::player::PlayerView;
use crate::game::pose::progress;

/// Phase timers compare against this to absorb f32 accumulation error.
const PHASE_EPSILON: f32 = 1e-5;

/// Boss tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    /// Multipliers over a normal enemy of the same wave
    pub scaling: TierScaling,
    /// Seconds of pursuit between dashes
    pub pursue_interval: f32,
    /// Seconds standing still before a dash
    pub telegraph_duration: f32,
    /// Dash length in seconds
    pub dash_duration: f32,
    /// Dash speed (units/second)
    pub dash_speed: f32,
    /// Scripted death length
    pub death_duration: f32,
    /// Seconds between two damaging contacts
    pub contact_cooldown: f32,
    /// Speed of the push applied to the player on a hit
    pub player_knockback_speed: f32,
    /// Duration of that push
    pub player_knockback_duration: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            scaling: TierScaling {
                hp_multiplier: 15.0,
                damage_multiplier: 3.0,
                speed_multiplier: 0.8,
                radius_multiplier: 2.0,
            },
            pursue_interval: 3.0,
            telegraph_duration: 1.0,
            dash_duration: 0.2,
            dash_speed: 18.0,
            death_duration: 1.5,
            contact_cooldown: 1.0,
            player_knockback_speed: 8.0,
            player_knockback_duration: 0.25,
        }
    }
}

/// Outer behavior cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BossPhase {
    /// Chasing the player
    Pursuing {
        /// Seconds in this phase
        elapsed: f32,
    },
    /// Standing still, winding up
    Telegraph {
        /// Seconds in this phase
        elapsed: f32,
    },
    /// Moving fast along a locked direction
    Dashing {
        /// Seconds in this phase
        elapsed: f32,
        /// Locked at dash start
        direction: Vec2,
    },
    /// Inert death sequence
    Dying {
        /// Seconds in this phase
        elapsed: f32,
    },
}

/// A boss enemy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BossAgent {
    body: EnemyAgent,
    phase: BossPhase,
    contact_cooldown: f32,
    finished: bool,
    tuning: BossConfig,
}

impl BossAgent {
    /// Spawn a boss for `wave`.
    pub fn new(id: TargetId, position: Vec2, wave: u32, enemy: &EnemyConfig, boss: &BossConfig) -> Self {
        let stats = EnemyStats::for_wave(wave, EnemyTier::Boss, enemy, boss);
        info!("boss {} spawned with {} hp", id, stats.max_hp);
        Self {
            body: EnemyAgent::new(id, position, &stats, enemy),
            phase: BossPhase::Pursuing { elapsed: 0.0 },
            contact_cooldown: 0.0,
            finished: false,
            tuning: boss.clone(),
        }
    }

    /// Shared enemy body.
    pub fn body(&self) -> &EnemyAgent {
        &self.body
    }

    /// Current cycle phase.
    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    /// Seconds before another damaging contact is possible.
    pub fn contact_cooldown(&self) -> f32 {
        self.contact_cooldown
    }

    /// Observable state.
    pub fn state(&self) -> EnemyState {
        match self.phase {
            BossPhase::Dying { .. } => EnemyState::Dying,
            _ if self.body.in_knockback() => EnemyState::Knockback,
            BossPhase::Telegraph { .. } => EnemyState::Telegraph,
            BossPhase::Dashing { .. } => EnemyState::Dashing,
            BossPhase::Pursuing { .. } => self.body.state(),
        }
    }

    /// Alive and not in the death sequence.
    pub fn is_hittable(&self) -> bool {
        self.body.is_alive() && !matches!(self.phase, BossPhase::Dying { .. })
    }

    /// Death sequence complete?
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Wind-up progress while telegraphing.
    pub fn telegraph_progress(&self) -> Option<f32> {
        match self.phase {
            BossPhase::Telegraph { elapsed } => {
                Some(progress(elapsed, self.tuning.telegraph_duration))
            }
            _ => None,
        }
    }

    /// Apply damage. Entering the death sequence is reported as `killed`.
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.is_hittable() {
            return DamageOutcome::default();
        }
        let outcome = self.body.take_damage(amount);
        if outcome.killed {
            debug!("boss {} dying", self.body.id);
            self.phase = BossPhase::Dying { elapsed: 0.0 };
        }
        outcome
    }

    /// Push the boss back. Ignored while dying.
    pub fn apply_knockback(&mut self, direction: Vec2) {
        if self.is_hittable() {
            self.body.apply_knockback(direction);
        }
    }

    /// Advance one tick.
    pub fn tick(&mut self, dt: f32, player: &PlayerView) -> Option<Contact> {
        if let BossPhase::Dying { elapsed } = self.phase {
            let elapsed = elapsed + dt;
            self.phase = BossPhase::Dying { elapsed };
            if !self.finished && elapsed + PHASE_EPSILON >= self.tuning.death_duration {
                self.finished = true;
                info!("boss {} defeated", self.body.id);
            }
            return None;
        }

        self.contact_cooldown = (self.contact_cooldown - dt).max(0.0);

        // Knockback overrides the cycle and freezes its progress
        if self.body.advance_timers(dt) {
            return None;
        }

        let dash_from = self.advance_cycle(dt, player);
        self.check_contact(player, dash_from)
    }

    /// Returns where the boss started this tick if it dashed.
    fn advance_cycle(&mut self, dt: f32, player: &PlayerView) -> Option<Vec2> {
        let t = &self.tuning;
        let mut dash_from = None;
        self.phase = match self.phase {
            BossPhase::Pursuing { elapsed } => {
                self.body.pursue(dt, player);
                let elapsed = elapsed + dt;
                if elapsed + PHASE_EPSILON >= t.pursue_interval {
                    debug!("boss {} telegraphing", self.body.id);
                    BossPhase::Telegraph { elapsed: 0.0 }
                } else {
                    BossPhase::Pursuing { elapsed }
                }
            }
            BossPhase::Telegraph { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed + PHASE_EPSILON >= t.telegraph_duration {
                    let direction = (player.position - self.body.position).normalize_or(self.body.facing);
                    self.body.facing = direction;
                    debug!("boss {} dashing toward {:?}", self.body.id, direction);
                    BossPhase::Dashing {
                        elapsed: 0.0,
                        direction,
                    }
                } else {
                    BossPhase::Telegraph { elapsed }
                }
            }
            BossPhase::Dashing { elapsed, direction } => {
                let step = dt.min(t.dash_duration - elapsed).max(0.0);
                dash_from = Some(self.body.position);
                self.body.position += direction * (t.dash_speed * step);
                let elapsed = elapsed + dt;
                if elapsed + PHASE_EPSILON >= t.dash_duration {
                    BossPhase::Pursuing { elapsed: 0.0 }
                } else {
                    BossPhase::Dashing { elapsed, direction }
                }
            }
            dying @ BossPhase::Dying { .. } => dying,
        };
        dash_from
    }

    /// A dash is tested along the whole path covered this tick and resolved
    /// from the point closest to the player.
    fn check_contact(&mut self, player: &PlayerView, dash_from: Option<Vec2>) -> Option<Contact> {
        if !self.body.is_armed() || self.contact_cooldown > 0.0 {
            return None;
        }
        let position = match dash_from {
            Some(start) => {
                let end = self.body.position;
                if !player.alive || !swept_circle_overlap(start, end, self.body.hit_radius, player.position, 0.0) {
                    return None;
                }
                closest_point_on_segment(start, end, player.position)
            }
            None if self.body.touching(player) => self.body.position,
            None => return None,
        };

        let kind = resolve_contact(player, position);
        let mut contact = Contact {
            enemy: self.body.id,
            enemy_position: position,
            kind,
            damage: 0,
            player_push: None,
        };

        match kind {
            ContactKind::Guarded => {
                self.body.apply_knockback(position - player.position);
            }
            ContactKind::Parried => {}
            ContactKind::Hit => {
                self.contact_cooldown = self.tuning.contact_cooldown;
                contact.damage = self.body.contact_damage;
                contact.player_push = Some(player.position - position);
            }
        }
        Some(contact)
    }

    /// Feed into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.body.hash_into(hasher);
        match self.phase {
            BossPhase::Pursuing { elapsed } => {
                hasher.update_u8(0);
                hasher.update_f32(elapsed);
            }
            BossPhase::Telegraph { elapsed } => {
                hasher.update_u8(1);
                hasher.update_f32(elapsed);
            }
            BossPhase::Dashing { elapsed, direction } => {
                hasher.update_u8(2);
                hasher.update_f32(elapsed);
                hasher.update_vec2(direction);
            }
            BossPhase::Dying { elapsed } => {
                hasher.update_u8(3);
                hasher.update_f32(elapsed);
            }
        }
        hasher.update_f32(self.contact_cooldown);
        hasher.update_bool(self.finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::action::Exposure;

    fn player(position: Vec2) -> PlayerView {
        PlayerView {
            position,
            facing: Vec2::UP,
            exposure: Exposure {
                guarding: false,
                parrying: false,
                guard_half_angle: 60.0,
                parry_half_angle: 90.0,
            },
            alive: true,
        }
    }

    fn boss() -> BossAgent {
        BossAgent::new(7, Vec2::ZERO, 5, &EnemyConfig::default(), &BossConfig::default())
    }

    #[test]
    fn test_boss_stats() {
        let b = boss();
        // (2 + 4) * 15
        assert_eq!(b.body().max_hp(), 90);
        // (1 + 4 / 3) * 3
        assert_eq!(b.body().contact_damage, 6);
        assert_eq!(b.body().tier, EnemyTier::Boss);
    }

    #[test]
    fn test_telegraph_then_dash() {
        let mut b = boss();
        let far = player(Vec2::new(30.0, 0.0));

        // Pursue for exactly 3s
        for _ in 0..12 {
            assert!(b.tick(0.25, &far).is_none());
        }
        assert!(matches!(b.phase(), BossPhase::Telegraph { .. }));
        let before = b.body().position;

        // Telegraph lasts 1s with no displacement
        for _ in 0..4 {
            b.tick(0.25, &far);
            assert_eq!(b.body().position, before);
        }
        assert!(matches!(b.phase(), BossPhase::Dashing { .. }));

        // Player moves away during the dash; the direction stays locked
        let moved = player(Vec2::new(30.0, 20.0));
        for _ in 0..4 {
            b.tick(0.05, &moved);
        }
        assert!(matches!(b.phase(), BossPhase::Pursuing { .. }));

        let displacement = b.body().position - before;
        assert!((displacement.length() - 3.6).abs() < 1e-3);
        assert!(displacement.y.abs() < 1e-4);
    }

    #[test]
    fn test_dash_clamped_by_large_tick() {
        let mut b = boss();
        let far = player(Vec2::new(30.0, 0.0));
        b.phase = BossPhase::Dashing {
            elapsed: 0.0,
            direction: Vec2::RIGHT,
        };
        b.tick(1.0, &far);
        assert!((b.body().position.x - 3.6).abs() < 1e-4);
    }

    #[test]
    fn test_knockback_freezes_cycle() {
        let mut b = boss();
        let far = player(Vec2::new(30.0, 0.0));
        b.phase = BossPhase::Telegraph { elapsed: 0.5 };
        b.apply_knockback(Vec2::LEFT);

        b.tick(0.1, &far);
        assert_eq!(b.state(), EnemyState::Knockback);
        assert_eq!(b.phase(), BossPhase::Telegraph { elapsed: 0.5 });
    }

    #[test]
    fn test_contact_cooldown_and_push() {
        let mut b = boss();
        b.tick(0.5, &player(Vec2::new(30.0, 0.0)));
        let pos = b.body().position;

        let near = player(pos + Vec2::new(0.0, 0.5));
        let contact = b.tick(0.0, &near).unwrap();
        assert_eq!(contact.kind, ContactKind::Hit);
        assert_eq!(contact.damage, 6);
        assert!(contact.player_push.is_some());

        // Boss persists and cannot hit again immediately
        assert!(b.is_hittable());
        assert!(b.tick(0.0, &near).is_none());
    }

    #[test]
    fn test_dash_hits_player_between_samples() {
        let mut b = boss();
        b.tick(0.5, &player(Vec2::new(30.0, 0.0)));
        let start = b.body().position;
        b.phase = BossPhase::Dashing {
            elapsed: 0.0,
            direction: Vec2::RIGHT,
        };

        // 0.9 per tick: the ends of the second step are 0.75 away, the
        // path passes 0.6 away, inside the 0.7 contact radius
        let target = player(start + Vec2::new(1.35, 0.6));
        assert!(b.tick(0.05, &target).is_none());
        let contact = b.tick(0.05, &target).unwrap();

        assert!((b.body().position.x - start.x - 1.8).abs() < 1e-4);
        assert!(b.body().position.distance(target.position) > b.body().hit_radius);
        assert_eq!(contact.kind, ContactKind::Hit);
        assert_eq!(contact.damage, 6);
        assert!((contact.enemy_position.x - start.x - 1.35).abs() < 1e-4);
    }

    #[test]
    fn test_scripted_death() {
        let mut b = boss();
        let far = player(Vec2::new(30.0, 0.0));

        let out = b.take_damage(1000);
        assert_eq!(out, DamageOutcome { dealt: 90, killed: true });
        assert_eq!(b.state(), EnemyState::Dying);
        assert!(!b.is_hittable());

        // Further damage and knockback are ignored
        assert_eq!(b.take_damage(5), DamageOutcome::default());
        b.apply_knockback(Vec2::RIGHT);

        let pos = b.body().position;
        for _ in 0..5 {
            assert!(b.tick(0.25, &far).is_none());
            assert!(!b.is_finished());
        }
        assert_eq!(b.body().position, pos);
        b.tick(0.25, &far);
        assert!(b.is_finished());
    }
}
