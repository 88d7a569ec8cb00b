//! Actor Rig Binding
//!
//! Named parts (weapon, off-hand limb) are resolved once at construction.
//! A missing weapon is fatal; a missing off-hand only removes the skills
//! that need it.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::vec2::Vec2;
use crate::game::collision::{segment_circle_overlap, signed_angle_deg, TargetView};
use crate::game::cooldown::Skill;
use crate::game::error::BindingError;

/// Names accepted for the weapon part, in priority order.
pub const WEAPON_NAMES: [&str; 3] = ["weapon", "sword", "blade"];

/// Names accepted for the off-hand limb, in priority order.
pub const OFF_HAND_NAMES: [&str; 3] = ["off_hand", "left_arm", "arm_l"];

/// One named part of an actor's rig.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigPart {
    /// Lookup name
    pub name: String,
    /// Reach from the attachment point
    pub length: f32,
}

impl RigPart {
    /// Create a part.
    pub fn new(name: impl Into<String>, length: f32) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// Rig description as configured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Parts to bind
    pub parts: Vec<RigPart>,
    /// Distance from the actor center to the weapon hilt
    pub hilt_offset: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            parts: vec![RigPart::new("weapon", 1.4), RigPart::new("off_hand", 0.6)],
            hilt_offset: 0.3,
        }
    }
}

/// What binding found, for logging and UI.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingReport {
    /// Name of the bound weapon part
    pub weapon: String,
    /// Name of the bound off-hand part, if any
    pub off_hand: Option<String>,
    /// Skills made permanently unavailable by missing parts
    pub disabled_skills: Vec<Skill>,
}

/// Resolved rig geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorRig {
    hilt_offset: f32,
    weapon_length: f32,
    off_hand_length: Option<f32>,
}

impl ActorRig {
    /// Resolve the rig's named parts.
    pub fn bind(config: &RigConfig) -> Result<(Self, BindingReport), BindingError> {
        let mut seen = BTreeSet::new();
        for part in &config.parts {
            if !seen.insert(part.name.as_str()) {
                return Err(BindingError::DuplicatePart(part.name.clone()));
            }
            if !part.length.is_finite() || part.length <= 0.0 {
                return Err(BindingError::InvalidLength {
                    name: part.name.clone(),
                    length: part.length,
                });
            }
        }

        let weapon = find_part(&config.parts, &WEAPON_NAMES).ok_or_else(|| {
            BindingError::MissingWeapon {
                accepted: WEAPON_NAMES.to_vec(),
            }
        })?;
        let off_hand = find_part(&config.parts, &OFF_HAND_NAMES);

        let mut report = BindingReport {
            weapon: weapon.name.clone(),
            off_hand: off_hand.map(|p| p.name.clone()),
            disabled_skills: Vec::new(),
        };

        if off_hand.is_none() {
            report.disabled_skills.push(Skill::Fireball);
            warn!(
                "rig has no off-hand part (accepted names: {:?}); fireball disabled",
                OFF_HAND_NAMES
            );
        }

        debug!("bound rig: weapon={} off_hand={:?}", report.weapon, report.off_hand);

        let rig = Self {
            hilt_offset: config.hilt_offset.max(0.0),
            weapon_length: weapon.length,
            off_hand_length: off_hand.map(|p| p.length),
        };
        Ok((rig, report))
    }

    /// Total weapon reach from the actor center.
    #[inline]
    pub fn reach(&self) -> f32 {
        self.hilt_offset + self.weapon_length
    }

    /// Does the rig have an off-hand limb?
    #[inline]
    pub fn has_off_hand(&self) -> bool {
        self.off_hand_length.is_some()
    }

    /// Can this rig ever perform `skill`?
    pub fn supports(&self, skill: Skill) -> bool {
        match skill {
            Skill::Fireball => self.has_off_hand(),
            _ => true,
        }
    }

    /// World-space blade segment (hilt, tip) for a weapon angle in degrees.
    pub fn weapon_segment(&self, origin: Vec2, facing: Vec2, weapon_angle: f32) -> (Vec2, Vec2) {
        let dir = facing.normalize_or(Vec2::UP).rotate(weapon_angle.to_radians());
        (origin + dir * self.hilt_offset, origin + dir * self.reach())
    }

    /// Does the blade touch `target` anywhere while rotating from
    /// `from_deg` to `to_deg`? Both end poses are included, so a sweep with
    /// `from_deg == to_deg` tests a single pose.
    pub fn blade_sweep_overlap(
        &self,
        origin: Vec2,
        facing: Vec2,
        from_deg: f32,
        to_deg: f32,
        target: &TargetView,
    ) -> bool {
        for angle in [from_deg, to_deg] {
            let (hilt, tip) = self.weapon_segment(origin, facing, angle);
            if segment_circle_overlap(hilt, tip, target.position, target.radius) {
                return true;
            }
        }

        // Otherwise the target must sit inside the swept ring sector
        let offset = target.position - origin;
        let distance = offset.length();
        if distance + target.radius < self.hilt_offset || distance - target.radius > self.reach() {
            return false;
        }
        let (lo, hi) = if from_deg <= to_deg { (from_deg, to_deg) } else { (to_deg, from_deg) };
        if hi - lo >= 360.0 {
            return true;
        }
        let relative = signed_angle_deg(facing.normalize_or(Vec2::UP), offset);
        lo + (relative - lo).rem_euclid(360.0) <= hi
    }

    /// World-space off-hand tip at `extension` (0..1) along facing.
    pub fn off_hand_tip(&self, origin: Vec2, facing: Vec2, extension: f32) -> Option<Vec2> {
        let length = self.off_hand_length?;
        let dir = facing.normalize_or(Vec2::UP);
        Some(origin + dir * (length * extension.clamp(0.0, 1.0)))
    }
}

fn find_part<'a>(parts: &'a [RigPart], names: &[&str]) -> Option<&'a RigPart> {
    names
        .iter()
        .find_map(|name| parts.iter().find(|p| p.name == *name))
}
