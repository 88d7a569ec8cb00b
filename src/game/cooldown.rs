//! Skill Cooldowns
//!
//! Each skill stores only the clock reading of its last trigger. Remaining
//! time is derived from a monotonic accumulator of scaled tick time, so a
//! paused world (dt = 0) freezes every cooldown uniformly.

use std::fmt;
use serde::{Serialize, Deserialize};

// =============================================================================
// SKILLS
// =============================================================================

/// Every player action gated by a cooldown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Skill {
    /// Basic sword swing (always available)
    Attack = 0,
    /// Continuous spin around the actor
    Spin = 1,
    /// Timed counter window
    Parry = 2,
    /// Off-hand projectile
    Fireball = 3,
    /// Piercing blade projectile
    SwordWave = 4,
    /// Sacrifice-everything screen clear
    BloodSlash = 5,
}

impl Skill {
    /// All skills in index order.
    pub const ALL: [Skill; 6] = [
        Skill::Attack,
        Skill::Spin,
        Skill::Parry,
        Skill::Fireball,
        Skill::SwordWave,
        Skill::BloodSlash,
    ];

    /// Number of skills.
    pub const COUNT: usize = 6;

    /// Dense index for table lookups.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The skill that cannot be owned together with this one.
    pub fn exclusive_partner(self) -> Option<Skill> {
        match self {
            Skill::Spin => Some(Skill::Parry),
            Skill::Parry => Some(Skill::Spin),
            Skill::SwordWave => Some(Skill::BloodSlash),
            Skill::BloodSlash => Some(Skill::SwordWave),
            Skill::Attack | Skill::Fireball => None,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Skill::Attack => "Attack",
            Skill::Spin => "Spin Attack",
            Skill::Parry => "Parry",
            Skill::Fireball => "Fireball",
            Skill::SwordWave => "Sword Wave",
            Skill::BloodSlash => "Blood Slash",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Cooldown durations in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Basic swing (counted from swing close)
    pub attack: f32,
    /// Spin attack
    pub spin: f32,
    /// Parry
    pub parry: f32,
    /// Fireball
    pub fireball: f32,
    /// Sword wave
    pub sword_wave: f32,
    /// Blood slash
    pub blood_slash: f32,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            attack: 0.1,
            spin: 3.0,
            parry: 2.0,
            fireball: 1.5,
            sword_wave: 4.0,
            blood_slash: 20.0,
        }
    }
}

impl CooldownConfig {
    /// Configured duration for a skill.
    pub fn duration(&self, skill: Skill) -> f32 {
        match skill {
            Skill::Attack => self.attack,
            Skill::Spin => self.spin,
            Skill::Parry => self.parry,
            Skill::Fireball => self.fireball,
            Skill::SwordWave => self.sword_wave,
            Skill::BloodSlash => self.blood_slash,
        }
    }
}

// =============================================================================
// COOLDOWN SET
// =============================================================================

/// Per-skill cooldown bookkeeping against one monotonic clock.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CooldownSet {
    /// Accumulated scaled time in seconds
    clock: f64,
    durations: [f32; Skill::COUNT],
    last_trigger: [Option<f64>; Skill::COUNT],
}

impl CooldownSet {
    /// Create a set with every skill ready.
    pub fn new(config: &CooldownConfig) -> Self {
        let mut durations = [0.0; Skill::COUNT];
        for skill in Skill::ALL {
            durations[skill.index()] = config.duration(skill);
        }
        Self {
            clock: 0.0,
            durations,
            last_trigger: [None; Skill::COUNT],
        }
    }

    /// Advance the clock. Negative or non-finite steps are ignored.
    #[inline]
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.clock += dt as f64;
        }
    }

    /// Current clock reading.
    pub fn now(&self) -> f64 {
        self.clock
    }

    /// Start the cooldown for `skill` at the current clock reading.
    pub fn trigger(&mut self, skill: Skill) {
        self.last_trigger[skill.index()] = Some(self.clock);
    }

    /// Seconds until `skill` is ready again. Never negative.
    pub fn remaining(&self, skill: Skill) -> f32 {
        match self.last_trigger[skill.index()] {
            None => 0.0,
            Some(at) => {
                let left = self.durations[skill.index()] as f64 - (self.clock - at);
                left.max(0.0) as f32
            }
        }
    }

    /// Is `skill` off cooldown?
    #[inline]
    pub fn is_ready(&self, skill: Skill) -> bool {
        self.remaining(skill) <= 0.0
    }

    /// Configured duration for `skill`.
    pub fn duration(&self, skill: Skill) -> f32 {
        self.durations[skill.index()]
    }

    /// Make every skill ready without rewinding the clock.
    pub fn reset(&mut self) {
        self.last_trigger = [None; Skill::COUNT];
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ready_until_triggered() {
        let set = CooldownSet::new(&CooldownConfig::default());
        for skill in Skill::ALL {
            assert!(set.is_ready(skill));
            assert_eq!(set.remaining(skill), 0.0);
        }
    }

    #[test]
    fn test_trigger_and_elapse() {
        let mut set = CooldownSet::new(&CooldownConfig::default());
        set.trigger(Skill::Spin);
        assert_eq!(set.remaining(Skill::Spin), 3.0);
        assert!(!set.is_ready(Skill::Spin));

        set.advance(1.0);
        assert!((set.remaining(Skill::Spin) - 2.0).abs() < 1e-6);

        set.advance(2.5);
        assert_eq!(set.remaining(Skill::Spin), 0.0);
        assert!(set.is_ready(Skill::Spin));
    }

    #[test]
    fn test_zero_dt_freezes() {
        let mut set = CooldownSet::new(&CooldownConfig::default());
        set.trigger(Skill::Parry);
        for _ in 0..100 {
            set.advance(0.0);
        }
        assert_eq!(set.remaining(Skill::Parry), 2.0);
    }

    #[test]
    fn test_exclusive_partners() {
        assert_eq!(Skill::Spin.exclusive_partner(), Some(Skill::Parry));
        assert_eq!(Skill::BloodSlash.exclusive_partner(), Some(Skill::SwordWave));
        assert_eq!(Skill::Fireball.exclusive_partner(), None);
    }

    proptest! {
        #[test]
        fn test_remaining_non_increasing_and_non_negative(
            steps in proptest::collection::vec((0.0f32..0.5, any::<bool>()), 1..80)
        ) {
            let mut set = CooldownSet::new(&CooldownConfig::default());
            let mut prev = set.remaining(Skill::Fireball);

            for (dt, fire) in steps {
                set.advance(dt);
                let now = set.remaining(Skill::Fireball);
                prop_assert!(now >= 0.0);
                prop_assert!(now <= prev);

                if fire {
                    set.trigger(Skill::Fireball);
                    prop_assert_eq!(set.remaining(Skill::Fireball), 1.5);
                }
                prev = set.remaining(Skill::Fireball);
            }
        }
    }
}
