//! Enemy Agents
//!
//! Per-enemy movement and contact-combat state machine. Enemies read an
//! immutable [`PlayerView`] and report [`Contact`]s; the world decides what
//! a contact does to the player.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::vec2::Vec2;
use crate::game::boss::{BossAgent, BossConfig};
use crate::game::collision::{within_arc, Knockback, TargetView};
use crate::game::hit_registry::TargetId;
use crate::game::player::PlayerView;

// =============================================================================
// CONFIG
// =============================================================================

/// Multipliers applied to a tier's stats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierScaling {
    /// Max HP multiplier
    pub hp_multiplier: f32,
    /// Contact damage multiplier
    pub damage_multiplier: f32,
    /// Movement speed multiplier
    pub speed_multiplier: f32,
    /// Body radius multiplier
    pub radius_multiplier: f32,
}

impl TierScaling {
    /// No scaling.
    pub const UNIT: TierScaling = TierScaling {
        hp_multiplier: 1.0,
        damage_multiplier: 1.0,
        speed_multiplier: 1.0,
        radius_multiplier: 1.0,
    };
}

/// Baseline enemy tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Pursuit speed (units/second)
    pub speed: f32,
    /// Center-to-center contact distance, also the body radius for hits
    pub hit_radius: f32,
    /// Max HP on wave 1
    pub base_hp: u32,
    /// Extra max HP per wave after the first
    pub hp_per_wave: u32,
    /// Contact damage on wave 1
    pub base_contact_damage: u32,
    /// Contact damage grows by 1 every this many waves
    pub contact_step_waves: u32,
    /// Seconds after spawning before contact damage is possible
    pub activate_delay: f32,
    /// Knockback duration (seconds)
    pub knockback_duration: f32,
    /// Knockback speed (units/second)
    pub knockback_speed: f32,
    /// Elite multipliers
    pub elite: TierScaling,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            speed: 3.5,
            hit_radius: 0.35,
            base_hp: 2,
            hp_per_wave: 1,
            base_contact_damage: 1,
            contact_step_waves: 3,
            activate_delay: 0.5,
            knockback_duration: 0.2,
            knockback_speed: 10.0,
            elite: TierScaling {
                hp_multiplier: 3.0,
                damage_multiplier: 2.0,
                speed_multiplier: 1.1,
                radius_multiplier: 1.3,
            },
        }
    }
}

// =============================================================================
// STATS
// =============================================================================

/// Enemy tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EnemyTier {
    /// Regular grunt
    Normal = 0,
    /// Tougher grunt
    Elite = 1,
    /// Boss
    Boss = 2,
}

/// Stats fixed at spawn time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Tier
    pub tier: EnemyTier,
    /// Max HP
    pub max_hp: u32,
    /// Damage dealt on contact
    pub contact_damage: u32,
    /// Pursuit speed
    pub speed: f32,
    /// Contact distance / body radius
    pub hit_radius: f32,
}

impl EnemyStats {
    /// Stats for an enemy of `tier` spawned on wave `wave` (1-based).
    ///
    /// `maxHp = (baseHp + hpPerWave * (wave - 1)) * tierHp`
    /// `contact = (baseContact + (wave - 1) / contactStep) * tierDamage`
    pub fn for_wave(wave: u32, tier: EnemyTier, enemy: &EnemyConfig, boss: &BossConfig) -> Self {
        let waves_in = wave.max(1) - 1;
        let scaling = match tier {
            EnemyTier::Normal => &TierScaling::UNIT,
            EnemyTier::Elite => &enemy.elite,
            EnemyTier::Boss => &boss.scaling,
        };

        let base_hp = enemy.base_hp.saturating_add(enemy.hp_per_wave.saturating_mul(waves_in));
        let step = enemy.contact_step_waves.max(1);
        let base_damage = enemy.base_contact_damage.saturating_add(waves_in / step);

        Self {
            tier,
            max_hp: scale(base_hp, scaling.hp_multiplier).max(1),
            contact_damage: scale(base_damage, scaling.damage_multiplier),
            speed: enemy.speed * scaling.speed_multiplier,
            hit_radius: enemy.hit_radius * scaling.radius_multiplier,
        }
    }
}

#[inline]
fn scale(value: u32, multiplier: f32) -> u32 {
    (value as f32 * multiplier).round().max(0.0) as u32
}

// =============================================================================
// CONTACT
// =============================================================================

/// Observable movement/combat state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EnemyState {
    /// Walking in, cannot hit yet
    Spawning = 0,
    /// Chasing the player
    Pursuing = 1,
    /// Being pushed back
    Knockback = 2,
    /// Boss: winding up a dash
    Telegraph = 3,
    /// Boss: dashing
    Dashing = 4,
    /// Boss: scripted death
    Dying = 5,
}

/// How a touch on the player resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    /// Blocked by guard, enemy knocked back
    Guarded,
    /// Landed inside an open parry window
    Parried,
    /// Player takes damage
    Hit,
}

/// Decide what a contact does, from the enemy's approach angle to the
/// player's forward axis. Guard wins over parry; both use strict arcs.
pub fn resolve_contact(player: &PlayerView, enemy_position: Vec2) -> ContactKind {
    let to_enemy = enemy_position - player.position;
    let exposure = &player.exposure;

    if exposure.guarding && within_arc(player.facing, to_enemy, exposure.guard_half_angle) {
        ContactKind::Guarded
    } else if exposure.parrying && within_arc(player.facing, to_enemy, exposure.parry_half_angle) {
        ContactKind::Parried
    } else {
        ContactKind::Hit
    }
}

/// A contact reported by an enemy this tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Enemy that touched the player
    pub enemy: TargetId,
    /// Enemy position at contact
    pub enemy_position: Vec2,
    /// Resolution
    pub kind: ContactKind,
    /// Damage to the player (meaningful for `Hit`)
    pub damage: u32,
    /// Push applied to the player, if any (boss hits)
    pub player_push: Option<Vec2>,
}

/// Result of a damage application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// HP actually removed
    pub dealt: u32,
    /// This hit brought HP to zero
    pub killed: bool,
}

// =============================================================================
// GRUNT
// =============================================================================

/// A regular (or elite) enemy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnemyAgent {
    /// Unique id
    pub id: TargetId,
    /// Tier
    pub tier: EnemyTier,
    /// Position
    pub position: Vec2,
    /// Facing (direction of travel)
    pub facing: Vec2,
    /// Pursuit speed
    pub speed: f32,
    /// Contact damage
    pub contact_damage: u32,
    /// Contact distance / body radius
    pub hit_radius: f32,
    hp: u32,
    max_hp: u32,
    spawn_elapsed: f32,
    activate_delay: f32,
    knockback_speed: f32,
    knockback_duration: f32,
    knockback: Option<Knockback>,
    /// Self-destructed by touching the player
    expired: bool,
}

impl EnemyAgent {
    /// Create an enemy that is still spawning in.
    pub fn new(id: TargetId, position: Vec2, stats: &EnemyStats, config: &EnemyConfig) -> Self {
        Self {
            id,
            tier: stats.tier,
            position,
            facing: Vec2::DOWN,
            speed: stats.speed,
            contact_damage: stats.contact_damage,
            hit_radius: stats.hit_radius,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            spawn_elapsed: 0.0,
            activate_delay: config.activate_delay,
            knockback_speed: config.knockback_speed,
            knockback_duration: config.knockback_duration,
            knockback: None,
            expired: false,
        }
    }

    /// Current HP.
    pub fn hp(&self) -> u32 {
        self.hp
    }

    /// Max HP.
    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// HP above zero?
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Removed itself by dealing contact damage?
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Past the spawn delay, so contact can deal damage?
    pub fn is_armed(&self) -> bool {
        self.spawn_elapsed >= self.activate_delay
    }

    /// Being knocked back?
    pub fn in_knockback(&self) -> bool {
        self.knockback.is_some()
    }

    /// Observable state.
    pub fn state(&self) -> EnemyState {
        if self.knockback.is_some() {
            EnemyState::Knockback
        } else if !self.is_armed() {
            EnemyState::Spawning
        } else {
            EnemyState::Pursuing
        }
    }

    /// Apply damage, clamped to remaining HP. Ignored once dead.
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.is_alive() || self.expired {
            return DamageOutcome::default();
        }
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        DamageOutcome {
            dealt,
            killed: self.hp == 0,
        }
    }

    /// Push the enemy along `direction` for the configured duration.
    pub fn apply_knockback(&mut self, direction: Vec2) {
        self.knockback = Some(Knockback::new(
            direction,
            -self.facing,
            self.knockback_speed,
            self.knockback_duration,
        ));
        debug!("enemy {} knocked back", self.id);
    }

    /// Advance the spawn timer and any knockback. Returns true if knockback
    /// consumed this tick (no pursuit, no contact checks).
    pub(crate) fn advance_timers(&mut self, dt: f32) -> bool {
        self.spawn_elapsed += dt;
        match self.knockback.as_mut() {
            Some(kb) => {
                let step = kb.advance(dt);
                self.position += step;
                if kb.is_finished() {
                    self.knockback = None;
                }
                true
            }
            None => false,
        }
    }

    /// Move toward the player at pursuit speed, facing the direction of travel.
    pub(crate) fn pursue(&mut self, dt: f32, player: &PlayerView) {
        if !player.alive {
            return;
        }
        let dir = (player.position - self.position).normalize();
        if dir != Vec2::ZERO {
            self.facing = dir;
            self.position += dir * (self.speed * dt);
        }
    }

    /// Is the player within contact distance?
    pub(crate) fn touching(&self, player: &PlayerView) -> bool {
        player.alive && self.position.distance_squared(player.position) <= self.hit_radius * self.hit_radius
    }

    /// Advance one tick. Returns a contact if the enemy touched the player.
    pub fn tick(&mut self, dt: f32, player: &PlayerView) -> Option<Contact> {
        if !self.is_alive() || self.expired {
            return None;
        }
        if self.advance_timers(dt) {
            return None;
        }

        self.pursue(dt, player);

        if !self.is_armed() || !self.touching(player) {
            return None;
        }

        let kind = resolve_contact(player, self.position);
        match kind {
            ContactKind::Guarded => {
                self.apply_knockback(self.position - player.position);
            }
            ContactKind::Parried => {}
            ContactKind::Hit => {
                // Grunts spend themselves on the hit; no kill credit
                self.expired = true;
            }
        }

        Some(Contact {
            enemy: self.id,
            enemy_position: self.position,
            kind,
            damage: if kind == ContactKind::Hit { self.contact_damage } else { 0 },
            player_push: None,
        })
    }

    /// Hit-test view.
    pub fn target_view(&self) -> TargetView {
        TargetView {
            id: self.id,
            position: self.position,
            radius: self.hit_radius,
        }
    }

    /// Feed into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id);
        hasher.update_u8(self.tier as u8);
        hasher.update_vec2(self.position);
        hasher.update_u32(self.hp);
        hasher.update_f32(self.spawn_elapsed);
        hasher.update_bool(self.knockback.is_some());
        hasher.update_bool(self.expired);
    }
}

// =============================================================================
// AGENT
// =============================================================================

/// Any enemy on the map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Agent {
    /// Normal or elite enemy
    Grunt(EnemyAgent),
    /// Boss enemy
    Boss(BossAgent),
}

impl Agent {
    /// Unique id.
    pub fn id(&self) -> TargetId {
        self.body().id
    }

    /// Tier.
    pub fn tier(&self) -> EnemyTier {
        self.body().tier
    }

    /// Shared body (position, HP, movement).
    pub fn body(&self) -> &EnemyAgent {
        match self {
            Agent::Grunt(e) => e,
            Agent::Boss(b) => b.body(),
        }
    }

    /// Position.
    pub fn position(&self) -> Vec2 {
        self.body().position
    }

    /// Observable state.
    pub fn state(&self) -> EnemyState {
        match self {
            Agent::Grunt(e) => e.state(),
            Agent::Boss(b) => b.state(),
        }
    }

    /// Can this enemy be struck right now?
    pub fn is_hittable(&self) -> bool {
        match self {
            Agent::Grunt(e) => e.is_alive() && !e.is_expired(),
            Agent::Boss(b) => b.is_hittable(),
        }
    }

    /// Ready to be removed from the world?
    pub fn is_finished(&self) -> bool {
        match self {
            Agent::Grunt(e) => !e.is_alive() || e.is_expired(),
            Agent::Boss(b) => b.is_finished(),
        }
    }

    /// Telegraph progress (0..1) while a boss winds up a dash.
    pub fn telegraph(&self) -> Option<f32> {
        match self {
            Agent::Grunt(_) => None,
            Agent::Boss(b) => b.telegraph_progress(),
        }
    }

    /// Advance one tick.
    pub fn tick(&mut self, dt: f32, player: &PlayerView) -> Option<Contact> {
        match self {
            Agent::Grunt(e) => e.tick(dt, player),
            Agent::Boss(b) => b.tick(dt, player),
        }
    }

    /// Apply damage; `killed` reports the death notification.
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        match self {
            Agent::Grunt(e) => e.take_damage(amount),
            Agent::Boss(b) => b.take_damage(amount),
        }
    }

    /// Push the enemy back.
    pub fn apply_knockback(&mut self, direction: Vec2) {
        match self {
            Agent::Grunt(e) => e.apply_knockback(direction),
            Agent::Boss(b) => b.apply_knockback(direction),
        }
    }

    /// Hit-test view.
    pub fn target_view(&self) -> TargetView {
        self.body().target_view()
    }

    /// Feed into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        match self {
            Agent::Grunt(e) => e.hash_into(hasher),
            Agent::Boss(b) => b.hash_into(hasher),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
