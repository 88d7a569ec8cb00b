//! Frame Snapshots
//!
//! Read-only, serializable picture of the world handed to a frontend once
//! per tick. Nothing here feeds back into the simulation.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::action::ActionKind;
use crate::game::cooldown::Skill;
use crate::game::enemy::{EnemyState, EnemyTier};
use crate::game::hit_registry::TargetId;
use crate::game::pose::Pose;
use crate::game::progression::UpgradeOption;
use crate::game::projectile::ProjectileKind;
use crate::game::world::World;

/// Player body and pose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Position
    pub position: Vec2,
    /// Facing
    pub facing: Vec2,
    /// Hit points
    pub hp: u32,
    /// Max hit points
    pub max_hp: u32,
    /// Running action
    pub action: ActionKind,
    /// Rig pose
    pub pose: Pose,
    /// Being pushed back
    pub knocked_back: bool,
}

/// Cooldown readout for one skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CooldownSnapshot {
    /// Skill
    pub skill: Skill,
    /// Owned
    pub unlocked: bool,
    /// Seconds left
    pub remaining: f32,
    /// Full duration
    pub duration: f32,
}

/// One enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    /// Id
    pub id: TargetId,
    /// Tier
    pub tier: EnemyTier,
    /// Position
    pub position: Vec2,
    /// Facing
    pub facing: Vec2,
    /// hp / max_hp
    pub hp_ratio: f32,
    /// Movement/combat state
    pub state: EnemyState,
    /// Telegraph wind-up progress (0..1), bosses only
    pub telegraph: Option<f32>,
}

/// One projectile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    /// Id
    pub id: u32,
    /// Kind
    pub kind: ProjectileKind,
    /// Position
    pub position: Vec2,
    /// Flight direction
    pub direction: Vec2,
}

/// Wave HUD.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveHud {
    /// Wave number
    pub index: u32,
    /// Kills so far
    pub kills: u32,
    /// Kills required
    pub quota: u32,
    /// Seconds until the announced wave starts
    pub announcement: Option<f32>,
}

/// Level HUD.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressionHud {
    /// Level
    pub level: u32,
    /// Experience toward the next level
    pub exp: u32,
    /// Experience needed
    pub required_exp: u32,
    /// Offer on screen
    pub offer: Option<Vec<UpgradeOption>>,
}

/// Everything a frontend needs to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Tick
    pub tick: u32,
    /// Simulated seconds
    pub time: f64,
    /// Clock stopped
    pub paused: bool,
    /// Player died
    pub game_over: bool,
    /// Player
    pub player: PlayerSnapshot,
    /// Per-skill cooldowns
    pub cooldowns: Vec<CooldownSnapshot>,
    /// Enemies in id order
    pub enemies: Vec<EnemySnapshot>,
    /// Projectiles in id order
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Wave HUD
    pub wave: WaveHud,
    /// Level HUD
    pub progression: ProgressionHud,
}

impl FrameSnapshot {
    /// Capture the current world.
    pub fn capture(world: &World) -> Self {
        let controller = &world.controller;
        let cooldowns = controller.cooldowns();

        Self {
            tick: world.tick,
            time: world.time,
            paused: world.is_paused(),
            game_over: world.is_game_over(),
            player: PlayerSnapshot {
                position: world.player.position,
                facing: world.player.facing,
                hp: world.player.hp(),
                max_hp: world.player.max_hp(),
                action: controller.kind(),
                pose: controller.pose(),
                knocked_back: world.player.in_knockback(),
            },
            cooldowns: Skill::ALL
                .iter()
                .map(|&skill| CooldownSnapshot {
                    skill,
                    unlocked: controller.is_unlocked(skill),
                    remaining: cooldowns.remaining(skill),
                    duration: cooldowns.duration(skill),
                })
                .collect(),
            enemies: world
                .agents
                .values()
                .map(|agent| {
                    let body = agent.body();
                    EnemySnapshot {
                        id: body.id,
                        tier: body.tier,
                        position: body.position,
                        facing: body.facing,
                        hp_ratio: body.hp() as f32 / body.max_hp().max(1) as f32,
                        state: agent.state(),
                        telegraph: agent.telegraph(),
                    }
                })
                .collect(),
            projectiles: world
                .projectiles
                .values()
                .map(|p| ProjectileSnapshot {
                    id: p.id,
                    kind: p.kind,
                    position: p.position,
                    direction: p.direction,
                })
                .collect(),
            wave: WaveHud {
                index: world.waves.record().index,
                kills: world.waves.record().kill_count,
                quota: world.waves.record().quota,
                announcement: world.waves.announcement(),
            },
            progression: ProgressionHud {
                level: world.progression.level(),
                exp: world.progression.exp(),
                required_exp: world.progression.required_exp(),
                offer: world.progression.offer().map(<[UpgradeOption]>::to_vec),
            },
        }
    }

    /// Serialize for a frontend or a debug dump.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::SimConfig;

    #[test]
    fn test_capture_fresh_world() {
        let world = World::new(SimConfig::default(), 1).unwrap();
        let snap = FrameSnapshot::capture(&world);

        assert_eq!(snap.tick, 0);
        assert_eq!(snap.player.hp, 100);
        assert_eq!(snap.player.action, ActionKind::Idle);
        assert_eq!(snap.cooldowns.len(), Skill::COUNT);
        assert!(snap.cooldowns.iter().all(|c| c.remaining == 0.0));
        assert!(snap.enemies.is_empty());
        assert_eq!(snap.wave.index, 1);
        assert_eq!(snap.wave.quota, 10);
        assert_eq!(snap.wave.announcement, Some(3.0));
        assert_eq!(snap.progression.level, 1);
        assert!(snap.progression.offer.is_none());
    }

    #[test]
    fn test_snapshot_json() {
        let world = World::new(SimConfig::default(), 1).unwrap();
        let snap = FrameSnapshot::capture(&world);
        let json = snap.to_json().unwrap();
        let back: FrameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
