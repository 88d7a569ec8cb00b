//! Collision Detection
//!
//! Geometry for hitboxes and contacts, plus the value types that carry
//! cross-actor outcomes. Actors never mutate each other: they read
//! [`TargetView`]s and emit [`Strike`]s, and the world applies them.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::hit_registry::TargetId;

/// Check if two circles overlap (touching counts).
#[inline]
pub fn circles_overlap(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> bool {
    let combined = radius_a + radius_b;
    pos_a.distance_squared(pos_b) <= combined * combined
}

/// Closest point to `point` on the segment `a..b`.
pub fn closest_point_on_segment(a: Vec2, b: Vec2, point: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Check if a segment (a blade) touches a circle.
#[inline]
pub fn segment_circle_overlap(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    closest_point_on_segment(a, b, center).distance_squared(center) <= radius * radius
}

/// Signed angle in degrees from `from` to `to`, counter-clockwise positive.
#[inline]
pub fn signed_angle_deg(from: Vec2, to: Vec2) -> f32 {
    from.cross(to).atan2(from.dot(to)).to_degrees()
}

/// Check if a moving circle touches a static one at any point of its
/// straight path from `start` to `end`.
#[inline]
pub fn swept_circle_overlap(start: Vec2, end: Vec2, radius_a: f32, center: Vec2, radius_b: f32) -> bool {
    segment_circle_overlap(start, end, center, radius_a + radius_b)
}

/// Is `to_target` strictly inside the cone of `half_angle_deg` around
/// `forward`? A zero offset (target exactly on the actor) counts as inside.
pub fn within_arc(forward: Vec2, to_target: Vec2, half_angle_deg: f32) -> bool {
    if to_target.length_squared() <= f32::EPSILON {
        return true;
    }
    forward.angle_between(to_target).to_degrees() < half_angle_deg
}

// =============================================================================
// CROSS-ACTOR VALUES
// =============================================================================

/// Read-only view of something that can be struck.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetView {
    /// Target id
    pub id: TargetId,
    /// Center position
    pub position: Vec2,
    /// Body radius
    pub radius: f32,
}

/// What produced a strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrikeSource {
    /// Basic sword swing
    Swing,
    /// Spin attack
    Spin,
    /// Parry counter-attack
    ParryCounter,
    /// Blood slash detonation
    BloodSlash,
    /// Fireball projectile
    Fireball,
    /// Sword wave projectile
    SwordWave,
}

/// A damage request from a player-owned source to one enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Strike {
    /// Enemy to damage
    pub target: TargetId,
    /// Damage amount
    pub damage: u32,
    /// Push direction, if the strike knocks the target back
    pub knockback: Option<Vec2>,
    /// What dealt it
    pub source: StrikeSource,
}

impl Strike {
    /// Plain damage with no knockback.
    pub fn new(target: TargetId, damage: u32, source: StrikeSource) -> Self {
        Self {
            target,
            damage,
            knockback: None,
            source,
        }
    }

    /// Add a knockback direction.
    pub fn with_knockback(mut self, direction: Vec2) -> Self {
        self.knockback = Some(direction);
        self
    }
}

// =============================================================================
// KNOCKBACK
// =============================================================================

/// Forced, timed displacement overriding normal movement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    /// Unit push direction
    pub direction: Vec2,
    /// Push speed (units/second)
    pub speed: f32,
    /// Seconds left
    pub remaining: f32,
}

impl Knockback {
    /// Start a knockback. A zero direction becomes `fallback`.
    pub fn new(direction: Vec2, fallback: Vec2, speed: f32, duration: f32) -> Self {
        Self {
            direction: direction.normalize_or(fallback),
            speed,
            remaining: duration,
        }
    }

    /// Consume up to `dt` seconds and return the displacement.
    pub fn advance(&mut self, dt: f32) -> Vec2 {
        let step = dt.min(self.remaining).max(0.0);
        self.remaining -= step;
        self.direction * (self.speed * step)
    }

    /// Has the push run out?
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_overlap() {
        let a = Vec2::ZERO;
        let b = Vec2::new(1.0, 0.0);

        // Distance 1.0, combined radius 1.2
        assert!(circles_overlap(a, 0.6, b, 0.6));
        assert!(!circles_overlap(a, 0.6, Vec2::new(2.0, 0.0), 0.6));
    }

    #[test]
    fn test_signed_angle() {
        assert!((signed_angle_deg(Vec2::UP, Vec2::LEFT) - 90.0).abs() < 1e-4);
        assert!((signed_angle_deg(Vec2::UP, Vec2::RIGHT) + 90.0).abs() < 1e-4);
        assert!(signed_angle_deg(Vec2::UP, Vec2::new(0.0, 3.0)).abs() < 1e-4);
    }

    #[test]
    fn test_swept_circle_catches_pass_through() {
        // Jumps from one side of the target to the other in a single step
        let start = Vec2::new(-1.0, 0.5);
        let end = Vec2::new(1.0, 0.5);
        assert!(!circles_overlap(start, 0.3, Vec2::ZERO, 0.3));
        assert!(!circles_overlap(end, 0.3, Vec2::ZERO, 0.3));
        assert!(swept_circle_overlap(start, end, 0.3, Vec2::ZERO, 0.3));
        assert!(!swept_circle_overlap(start, end, 0.1, Vec2::ZERO, 0.1));
    }

    #[test]
    fn test_segment_circle_overlap() {
        let a = Vec2::new(0.3, 0.0);
        let b = Vec2::new(1.7, 0.0);

        assert!(segment_circle_overlap(a, b, Vec2::new(1.0, 0.3), 0.35));
        assert!(!segment_circle_overlap(a, b, Vec2::new(1.0, 0.5), 0.35));
        // Beyond the tip
        assert!(!segment_circle_overlap(a, b, Vec2::new(2.2, 0.0), 0.35));
        // Past the hilt, near the owner
        assert!(segment_circle_overlap(a, b, Vec2::new(0.0, 0.0), 0.35));
    }

    #[test]
    fn test_within_arc_is_strict() {
        let forward = Vec2::UP;
        assert!(within_arc(forward, Vec2::new(0.0, 2.0), 60.0));
        assert!(within_arc(forward, Vec2::from_angle(90f32.to_radians() + 0.5), 60.0));
        assert!(!within_arc(forward, Vec2::RIGHT, 60.0));
        assert!(!within_arc(forward, Vec2::RIGHT, 90.0 - 1e-3));
        assert!(!within_arc(forward, Vec2::DOWN, 179.0));
    }

    #[test]
    fn test_knockback_displacement() {
        let mut kb = Knockback::new(Vec2::new(2.0, 0.0), Vec2::UP, 10.0, 0.2);
        let d1 = kb.advance(0.125);
        let d2 = kb.advance(0.125);

        assert!((d1.x - 1.25).abs() < 1e-5);
        assert!((d2.x - 0.75).abs() < 1e-5);
        assert!(kb.is_finished());
        assert_eq!(kb.advance(0.1), Vec2::ZERO);
    }

    #[test]
    fn test_knockback_zero_direction_uses_fallback() {
        let kb = Knockback::new(Vec2::ZERO, Vec2::LEFT, 5.0, 0.1);
        assert_eq!(kb.direction, Vec2::LEFT);
    }
}
