//! Projectiles
//!
//! Ballistic entities launched by player skills. A projectile flies in a
//! straight line at constant speed until its time-to-live runs out. The
//! fireball dies on its first hit; the sword wave pierces and uses its own
//! [`HitRegistry`] so each enemy is damaged at most once per lifetime.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::vec2::Vec2;
use crate::game::collision::{circles_overlap, Strike, StrikeSource, TargetView};
use crate::game::hit_registry::HitRegistry;

/// Kind of projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProjectileKind {
    /// Single-target, dies on first hit
    Fireball = 0,
    /// Piercing, dies on expiry only
    SwordWave = 1,
}

impl ProjectileKind {
    /// Strike source tag for damage events.
    pub fn source(self) -> StrikeSource {
        match self {
            ProjectileKind::Fireball => StrikeSource::Fireball,
            ProjectileKind::SwordWave => StrikeSource::SwordWave,
        }
    }
}

/// Tuning for one projectile kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileTuning {
    /// Units per second
    pub speed: f32,
    /// Damage per hit
    pub damage: u32,
    /// Lifetime in seconds
    pub ttl: f32,
    /// Collision radius
    pub radius: f32,
}

/// Projectile configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Fireball tuning
    pub fireball: ProjectileTuning,
    /// Sword wave tuning
    pub sword_wave: ProjectileTuning,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            fireball: ProjectileTuning {
                speed: 10.0,
                damage: 2,
                ttl: 1.0,
                radius: 0.3,
            },
            sword_wave: ProjectileTuning {
                speed: 12.0,
                damage: 1,
                ttl: 0.8,
                radius: 0.6,
            },
        }
    }
}

impl ProjectileConfig {
    /// Tuning for a kind.
    pub fn tuning(&self, kind: ProjectileKind) -> &ProjectileTuning {
        match kind {
            ProjectileKind::Fireball => &self.fireball,
            ProjectileKind::SwordWave => &self.sword_wave,
        }
    }
}

/// Request to launch a projectile, produced by the action controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpawn {
    /// Kind to launch
    pub kind: ProjectileKind,
    /// Launch position
    pub origin: Vec2,
    /// Flight direction (normalized on creation)
    pub direction: Vec2,
}

/// A live projectile.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Projectile {
    /// Unique id
    pub id: u32,
    /// Kind
    pub kind: ProjectileKind,
    /// Current position
    pub position: Vec2,
    /// Unit flight direction, fixed at creation
    pub direction: Vec2,
    /// Units per second
    pub speed: f32,
    /// Damage per hit
    pub damage: u32,
    /// Seconds left to live
    pub ttl: f32,
    /// Collision radius
    pub radius: f32,
    hits: HitRegistry,
    alive: bool,
}

impl Projectile {
    /// Create from a spawn request.
    pub fn new(id: u32, spawn: &ProjectileSpawn, config: &ProjectileConfig) -> Self {
        let tuning = config.tuning(spawn.kind);
        let mut hits = HitRegistry::new();
        hits.begin_activation();
        Self {
            id,
            kind: spawn.kind,
            position: spawn.origin,
            direction: spawn.direction.normalize_or(Vec2::UP),
            speed: tuning.speed,
            damage: tuning.damage,
            ttl: tuning.ttl,
            radius: tuning.radius,
            hits,
            alive: true,
        }
    }

    /// Move, test hits, age. Returns strikes for the world to apply.
    ///
    /// `targets` must be in ascending id order so that a single-target
    /// projectile overlapping two enemies hits the same one on every run.
    pub fn tick(&mut self, dt: f32, targets: &[TargetView]) -> Vec<Strike> {
        let mut strikes = Vec::new();
        if !self.alive {
            return strikes;
        }

        self.position += self.direction * (self.speed * dt);

        for target in targets {
            if !circles_overlap(self.position, self.radius, target.position, target.radius) {
                continue;
            }
            if !self.hits.try_register(target.id) {
                continue;
            }
            strikes.push(Strike::new(target.id, self.damage, self.kind.source()));

            if self.kind == ProjectileKind::Fireball {
                self.alive = false;
                return strikes;
            }
        }

        self.ttl -= dt;
        if self.ttl <= 0.0 {
            self.alive = false;
        }

        strikes
    }

    /// Still in flight?
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Number of enemies this projectile has damaged.
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }

    /// Feed this projectile into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id);
        hasher.update_u8(self.kind as u8);
        hasher.update_vec2(self.position);
        hasher.update_f32(self.ttl);
        hasher.update_u32(self.hits.len() as u32);
    }
}
