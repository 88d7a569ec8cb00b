//! Game Events
//!
//! Events generated during simulation for presentation, progression hooks
//! and replay verification.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::action::{ActionKind, ExitReason};
use crate::game::collision::StrikeSource;
use crate::game::enemy::EnemyTier;
use crate::game::hit_registry::TargetId;
use crate::game::progression::UpgradeOption;
use crate::game::projectile::ProjectileKind;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Player death first
    PlayerDeath = 0,
    /// Then damage
    Damage = 1,
    /// Then kills and despawns
    EnemyRemoval = 2,
    /// Then levels and upgrades
    Progression = 3,
    /// Then wave flow
    Wave = 4,
    /// Then action transitions
    Action = 5,
    /// Lowest priority
    Other = 255,
}

/// Why an enemy left the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DespawnReason {
    /// HP reached zero (or boss death sequence finished)
    Killed,
    /// Self-destructed dealing contact damage
    Expended,
    /// Removed by a wave skip
    Skipped,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Player action began
    ActionStarted {
        action: ActionKind,
    },

    /// Player action finished
    ActionEnded {
        action: ActionKind,
        reason: ExitReason,
    },

    /// Projectile launched
    ProjectileSpawned {
        projectile_id: u32,
        kind: ProjectileKind,
        position: Vec2,
    },

    /// Enemy created by the wave director
    EnemySpawned {
        enemy_id: TargetId,
        tier: EnemyTier,
        position: Vec2,
    },

    /// Player-owned damage landed
    DamageDealt {
        enemy_id: TargetId,
        amount: u32,
        source: StrikeSource,
        remaining_hp: u32,
    },

    /// Enemy HP reached zero
    EnemyKilled {
        enemy_id: TargetId,
        tier: EnemyTier,
        exp: u32,
    },

    /// Enemy removed from the map (cosmetic)
    EnemyDespawned {
        enemy_id: TargetId,
        reason: DespawnReason,
    },

    /// Contact blocked by guard
    ContactGuarded {
        enemy_id: TargetId,
    },

    /// Contact countered by parry
    ParryCounter {
        enemy_id: TargetId,
        damage: u32,
    },

    /// Enemy contact hurt the player
    PlayerDamaged {
        enemy_id: TargetId,
        amount: u32,
        remaining_hp: u32,
    },

    /// Blood slash cost paid
    HealthSacrificed {
        hp_lost: u32,
    },

    /// Player died, run over
    PlayerDied,

    /// Wave announced
    WaveAnnounced {
        wave: u32,
    },

    /// Wave spawning began
    WaveStarted {
        wave: u32,
        quota: u32,
    },

    /// Wave finished
    WaveEnded {
        wave: u32,
        skipped: bool,
    },

    /// Player levelled up
    LevelUp {
        level: u32,
    },

    /// Upgrade selection shown, clock paused
    UpgradeOffered {
        options: Vec<UpgradeOption>,
    },

    /// Upgrade applied
    UpgradeChosen {
        option: UpgradeOption,
    },

    /// Boss death sequence finished
    BossDefeated {
        enemy_id: TargetId,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Enemy involved (for tie-breaking)
    pub actor: Option<TargetId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let actor = match &data {
            GameEventData::EnemySpawned { enemy_id, .. }
            | GameEventData::DamageDealt { enemy_id, .. }
            | GameEventData::EnemyKilled { enemy_id, .. }
            | GameEventData::EnemyDespawned { enemy_id, .. }
            | GameEventData::ContactGuarded { enemy_id }
            | GameEventData::ParryCounter { enemy_id, .. }
            | GameEventData::PlayerDamaged { enemy_id, .. }
            | GameEventData::BossDefeated { enemy_id } => Some(*enemy_id),
            _ => None,
        };

        Self {
            tick,
            priority,
            actor,
            data,
        }
    }

    /// Create damage dealt event.
    pub fn damage_dealt(
        tick: u32,
        enemy_id: TargetId,
        amount: u32,
        source: StrikeSource,
        remaining_hp: u32,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Damage,
            GameEventData::DamageDealt {
                enemy_id,
                amount,
                source,
                remaining_hp,
            },
        )
    }

    /// Create enemy killed event.
    pub fn enemy_killed(tick: u32, enemy_id: TargetId, tier: EnemyTier, exp: u32) -> Self {
        Self::new(
            tick,
            EventPriority::EnemyRemoval,
            GameEventData::EnemyKilled { enemy_id, tier, exp },
        )
    }

    /// Create enemy despawned event.
    pub fn enemy_despawned(tick: u32, enemy_id: TargetId, reason: DespawnReason) -> Self {
        Self::new(
            tick,
            EventPriority::EnemyRemoval,
            GameEventData::EnemyDespawned { enemy_id, reason },
        )
    }

    /// Create player damaged event.
    pub fn player_damaged(tick: u32, enemy_id: TargetId, amount: u32, remaining_hp: u32) -> Self {
        Self::new(
            tick,
            EventPriority::Damage,
            GameEventData::PlayerDamaged {
                enemy_id,
                amount,
                remaining_hp,
            },
        )
    }

    /// Create player died event.
    pub fn player_died(tick: u32) -> Self {
        Self::new(tick, EventPriority::PlayerDeath, GameEventData::PlayerDied)
    }

    /// Create level up event.
    pub fn level_up(tick: u32, level: u32) -> Self {
        Self::new(tick, EventPriority::Progression, GameEventData::LevelUp { level })
    }

    /// Create action event.
    pub fn action(tick: u32, data: GameEventData) -> Self {
        Self::new(tick, EventPriority::Action, data)
    }

    /// Create wave event.
    pub fn wave(tick: u32, data: GameEventData) -> Self {
        Self::new(tick, EventPriority::Wave, data)
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.actor == other.actor
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then actor
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.actor.cmp(&other.actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let death = GameEvent::player_died(10);
        let damage = GameEvent::damage_dealt(10, 3, 1, StrikeSource::Swing, 1);
        let kill_a = GameEvent::enemy_killed(10, 2, EnemyTier::Normal, 1);
        let kill_b = GameEvent::enemy_killed(10, 5, EnemyTier::Normal, 1);
        let later = GameEvent::player_died(11);

        assert!(death < damage);
        assert!(damage < kill_a);
        assert!(kill_a < kill_b);
        assert!(kill_b < later);
    }

    #[test]
    fn test_actor_extracted() {
        assert_eq!(GameEvent::enemy_killed(0, 9, EnemyTier::Elite, 3).actor, Some(9));
        assert_eq!(GameEvent::level_up(0, 2).actor, None);
    }
}
