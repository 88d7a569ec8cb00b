//! Simulation Configuration
//!
//! Every tunable in one serde-deserializable tree. Missing fields fall back
//! to their defaults, so a config file only needs the values it changes:
//!
//! ```json
//! { "wave": { "base_quota": 5 }, "player": { "max_hp": 150 } }
//! ```

use std::path::Path;
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::game::action::ActionConfig;
use crate::game::boss::BossConfig;
use crate::game::cooldown::Skill;
use crate::game::enemy::EnemyConfig;
use crate::game::error::ConfigError;
use crate::game::player::PlayerConfig;
use crate::game::progression::ProgressionConfig;
use crate::game::projectile::ProjectileConfig;
use crate::game::rig::RigConfig;
use crate::game::wave::WaveConfig;

/// Environment variable naming an optional config file.
pub const CONFIG_ENV_VAR: &str = "BLADEWAVE_CONFIG";

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Player body
    pub player: PlayerConfig,
    /// Player rig parts
    pub rig: RigConfig,
    /// Action timings and cooldowns
    pub action: ActionConfig,
    /// Projectile tuning
    pub projectile: ProjectileConfig,
    /// Enemy tuning
    pub enemy: EnemyConfig,
    /// Boss tuning
    pub boss: BossConfig,
    /// Wave pacing
    pub wave: WaveConfig,
    /// Experience and upgrades
    pub progression: ProgressionConfig,
}

impl SimConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the file named by `BLADEWAVE_CONFIG`, or defaults if unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Check semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.action;
        positive("action.swing_duration", a.swing_duration)?;
        positive("action.parry_window", a.parry_window)?;
        positive("action.spin_duration", a.spin_duration)?;
        positive("action.spin_clear_interval", a.spin_clear_interval)?;
        non_negative("action.spin_blend", a.spin_blend)?;
        non_negative("action.fireball_extend", a.fireball_extend)?;
        non_negative("action.fireball_hold", a.fireball_hold)?;
        non_negative("action.fireball_retract", a.fireball_retract)?;
        non_negative("action.blood_slash_tint", a.blood_slash_tint)?;
        positive("action.blood_slash_swing", a.blood_slash_swing)?;
        non_negative("action.blood_slash_expand", a.blood_slash_expand)?;
        half_angle("action.guard_half_angle", a.guard_half_angle)?;
        half_angle("action.parry_half_angle", a.parry_half_angle)?;

        for skill in Skill::ALL {
            let duration = a.cooldowns.duration(skill);
            if !duration.is_finite() || duration < 0.0 {
                return Err(ConfigError::invalid(
                    "action.cooldowns",
                    format!("{} cooldown must be >= 0, got {}", skill, duration),
                ));
            }
        }

        for (name, tuning) in [
            ("projectile.fireball", &self.projectile.fireball),
            ("projectile.sword_wave", &self.projectile.sword_wave),
        ] {
            let valid = tuning.ttl > 0.0 && tuning.speed >= 0.0 && tuning.radius > 0.0;
            if !valid {
                return Err(ConfigError::invalid(
                    name,
                    "ttl and radius must be positive, speed non-negative",
                ));
            }
        }

        positive("player.move_speed", self.player.move_speed)?;
        if self.player.max_hp == 0 {
            return Err(ConfigError::invalid("player.max_hp", "must be at least 1"));
        }

        positive("enemy.speed", self.enemy.speed)?;
        positive("enemy.hit_radius", self.enemy.hit_radius)?;
        non_negative("enemy.activate_delay", self.enemy.activate_delay)?;
        positive("enemy.knockback_duration", self.enemy.knockback_duration)?;
        if self.enemy.contact_step_waves == 0 {
            return Err(ConfigError::invalid("enemy.contact_step_waves", "must be at least 1"));
        }

        positive("boss.pursue_interval", self.boss.pursue_interval)?;
        positive("boss.telegraph_duration", self.boss.telegraph_duration)?;
        positive("boss.dash_duration", self.boss.dash_duration)?;
        non_negative("boss.death_duration", self.boss.death_duration)?;
        non_negative("boss.contact_cooldown", self.boss.contact_cooldown)?;

        let w = &self.wave;
        if w.base_quota == 0 {
            return Err(ConfigError::invalid("wave.base_quota", "must be at least 1"));
        }
        positive("wave.base_spawn_interval", w.base_spawn_interval)?;
        positive("wave.spawn_interval_floor", w.spawn_interval_floor)?;
        if w.spawn_interval_decay.is_nan() || w.spawn_interval_decay < 1.0 {
            return Err(ConfigError::invalid("wave.spawn_interval_decay", "must be >= 1"));
        }
        non_negative("wave.intermission", w.intermission)?;
        if !(0.0..=1.0).contains(&w.elite_chance) {
            return Err(ConfigError::invalid("wave.elite_chance", "must be within [0, 1]"));
        }
        let (half_w, half_h) = w.map.spawn_half_extents();
        if half_w <= 0.0 || half_h <= 0.0 {
            return Err(ConfigError::invalid("wave.map", "map is empty after the spawn margin"));
        }

        if self.progression.base_required_exp == 0 {
            return Err(ConfigError::invalid("progression.base_required_exp", "must be at least 1"));
        }
        if self.progression.offer_size == 0 {
            return Err(ConfigError::invalid("progression.offer_size", "must be at least 1"));
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be > 0, got {}", value)))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be >= 0, got {}", value)))
    }
}

fn half_angle(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be within [0, 180] degrees, got {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimConfig::from_json_str(
            r#"{ "wave": { "base_quota": 5 }, "player": { "max_hp": 150 } }"#,
        )
        .unwrap();
        assert_eq!(config.wave.base_quota, 5);
        assert_eq!(config.wave.quota_step, 10);
        assert_eq!(config.player.max_hp, 150);
        assert_eq!(config.action, ActionConfig::default());
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(SimConfig::from_json_str("{}").unwrap(), SimConfig::default());
    }

    #[test]
    fn test_malformed_json() {
        let err = SimConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SimConfig::from_json_str(r#"{ "action": { "swing_duration": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "action.swing_duration", .. }));

        let err = SimConfig::from_json_str(r#"{ "action": { "guard_half_angle": 270.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "action.guard_half_angle", .. }));

        let err = SimConfig::from_json_str(
            r#"{ "wave": { "map": { "width": 2.0, "height": 14.0, "margin": 1.0 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "wave.map", .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SimConfig::load("/definitely/not/here/bladewave.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("bladewave-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "boss": { "dash_speed": 20.0 } }"#).unwrap();
        let config = SimConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.boss.dash_speed, 20.0);
    }
}
