//! Actor Pose
//!
//! Presentation-facing pose values driven by the action state machine.
//! Angles are in degrees relative to the actor's facing, counter-clockwise
//! positive.

use serde::{Serialize, Deserialize};

/// Hermite smoothstep on `t` clamped to [0, 1].
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation between two scalars.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Progress of `elapsed` through `duration`, clamped to [0, 1].
/// A non-positive duration is always complete.
#[inline]
pub fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).clamp(0.0, 1.0)
    }
}

/// Observable pose of the player's rig.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Weapon angle off facing, degrees
    pub weapon_angle: f32,
    /// Off-hand extension, 0 = rest, 1 = fully extended
    pub off_hand_extension: f32,
    /// Blood tint intensity, 0..1
    pub tint: f32,
    /// Blood slash shockwave expansion, 0..1
    pub effect_scale: f32,
}

impl Pose {
    /// Neutral pose.
    pub const REST: Pose = Pose {
        weapon_angle: 0.0,
        off_hand_extension: 0.0,
        tint: 0.0,
        effect_scale: 0.0,
    };

    /// Pose with only the weapon angle changed.
    pub fn with_weapon(angle: f32) -> Self {
        Self {
            weapon_angle: angle,
            ..Self::REST
        }
    }

    /// Is this the neutral pose?
    pub fn is_rest(&self) -> bool {
        *self == Self::REST
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::REST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(-3.0), 0.0);
        assert_eq!(smoothstep(7.0), 1.0);
    }

    #[test]
    fn test_smoothstep_eases() {
        // Slow at the ends, fast in the middle
        assert!(smoothstep(0.1) < 0.1);
        assert!(smoothstep(0.9) > 0.9);
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress(0.1, 0.2), 0.5);
        assert_eq!(progress(0.5, 0.2), 1.0);
        assert_eq!(progress(0.0, 0.0), 1.0);
    }
}
