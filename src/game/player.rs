//! Player Body
//!
//! Hit points, movement, facing and knockback for the player actor. The
//! action state machine lives in [`crate::game::action`]; this module only
//! owns the body it drives.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::hash::StateHasher;
use crate::core::vec2::Vec2;
use crate::game::action::Exposure;
use crate::game::collision::Knockback;
use crate::game::enemy::DamageOutcome;

/// Player tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Starting (and initial max) hit points
    pub max_hp: u32,
    /// Units per second
    pub move_speed: f32,
    /// Body radius
    pub radius: f32,
    /// Spawn position
    pub spawn: Vec2,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_hp: 100,
            move_speed: 5.0,
            radius: 0.4,
            spawn: Vec2::ZERO,
        }
    }
}

/// Immutable view handed to enemies each tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Position
    pub position: Vec2,
    /// Unit facing
    pub facing: Vec2,
    /// Guard/parry exposure
    pub exposure: Exposure,
    /// Alive?
    pub alive: bool,
}

/// The player body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    /// Position
    pub position: Vec2,
    /// Unit facing
    pub facing: Vec2,
    /// Units per second
    pub move_speed: f32,
    /// Body radius
    pub radius: f32,
    hp: u32,
    max_hp: u32,
    knockback: Option<Knockback>,
}

impl Player {
    /// Spawn a fresh player.
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            position: config.spawn,
            facing: Vec2::UP,
            move_speed: config.move_speed,
            radius: config.radius,
            hp: config.max_hp,
            max_hp: config.max_hp,
            knockback: None,
        }
    }

    /// Current hit points.
    pub fn hp(&self) -> u32 {
        self.hp
    }

    /// Max hit points.
    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// Still alive?
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Being knocked back?
    pub fn in_knockback(&self) -> bool {
        self.knockback.is_some()
    }

    /// Take damage, clamped at zero.
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome::default();
        }
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        if self.hp == 0 {
            info!("player died");
        }
        DamageOutcome {
            dealt,
            killed: self.hp == 0,
        }
    }

    /// Restore hit points, clamped at max.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let healed = amount.min(self.max_hp - self.hp);
        self.hp += healed;
        healed
    }

    /// Raise max and current hit points together.
    pub fn increase_max_hp(&mut self, amount: u32) {
        self.max_hp = self.max_hp.saturating_add(amount);
        if self.is_alive() {
            self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        }
    }

    /// Blood slash cost: hit points drop to 1.
    pub fn sacrifice_to_one(&mut self) {
        if self.hp > 1 {
            debug!("sacrificed {} hp", self.hp - 1);
            self.hp = 1;
        }
    }

    /// Turn toward a world-space aim point. No aim, or aim on top of the
    /// player, leaves facing unchanged.
    pub fn face_toward(&mut self, aim: Option<Vec2>) {
        if let Some(target) = aim {
            let dir = (target - self.position).normalize();
            if dir != Vec2::ZERO {
                self.facing = dir;
            }
        }
    }

    /// Start a push.
    pub fn apply_knockback(&mut self, direction: Vec2, speed: f32, duration: f32) {
        self.knockback = Some(Knockback::new(direction, -self.facing, speed, duration));
    }

    /// Move for one tick. Knockback overrides the movement input.
    pub fn advance(&mut self, dt: f32, move_input: Vec2) {
        if let Some(kb) = self.knockback.as_mut() {
            self.position += kb.advance(dt);
            if kb.is_finished() {
                self.knockback = None;
            }
            return;
        }
        if !self.is_alive() {
            return;
        }
        let dir = move_input.normalize();
        self.position += dir * (self.move_speed * dt);
    }

    /// Snapshot for enemy AI.
    pub fn view(&self, exposure: Exposure) -> PlayerView {
        PlayerView {
            position: self.position,
            facing: self.facing,
            exposure,
            alive: self.is_alive(),
        }
    }

    /// Feed into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.facing);
        hasher.update_u32(self.hp);
        hasher.update_u32(self.max_hp);
        hasher.update_bool(self.knockback.is_some());
    }
}
