//! Progression
//!
//! Experience, levels and the upgrade selection that pauses the run. The
//! required experience grows by a fixed step per level; every level-up
//! queues one selection. Selections are presented one at a time and drawn
//! from the pool only when presented, so earlier picks shape later offers.

use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::rng::DeterministicRng;
use crate::game::cooldown::Skill;
use crate::game::enemy::EnemyTier;
use crate::game::error::SelectionError;

/// Skills that can be offered, in pool order.
pub const UNLOCKABLE_SKILLS: [Skill; 5] = [
    Skill::Fireball,
    Skill::Spin,
    Skill::Parry,
    Skill::SwordWave,
    Skill::BloodSlash,
];

/// Progression tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Experience required for level 2
    pub base_required_exp: u32,
    /// Added to the requirement after each level-up
    pub required_exp_step: u32,
    /// Max HP gained per level
    pub level_max_hp: u32,
    /// Attack damage gained per level
    pub level_damage: u32,
    /// Heal option amount
    pub heal_amount: u32,
    /// Damage option amount
    pub damage_amount: u32,
    /// Max HP option amount
    pub max_hp_amount: u32,
    /// Options per offer
    pub offer_size: usize,
    /// Experience for a normal kill
    pub exp_normal: u32,
    /// Experience for an elite kill
    pub exp_elite: u32,
    /// Experience for a boss kill
    pub exp_boss: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_required_exp: 10,
            required_exp_step: 5,
            level_max_hp: 20,
            level_damage: 1,
            heal_amount: 30,
            damage_amount: 1,
            max_hp_amount: 20,
            offer_size: 3,
            exp_normal: 1,
            exp_elite: 3,
            exp_boss: 10,
        }
    }
}

impl ProgressionConfig {
    /// Kill reward for a tier.
    pub fn exp_for(&self, tier: EnemyTier) -> u32 {
        match tier {
            EnemyTier::Normal => self.exp_normal,
            EnemyTier::Elite => self.exp_elite,
            EnemyTier::Boss => self.exp_boss,
        }
    }
}

/// One choice in an upgrade offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeOption {
    /// Unlock an active skill
    Unlock(Skill),
    /// Restore hit points
    Heal(u32),
    /// Raise attack damage
    Damage(u32),
    /// Raise max (and current) hit points
    MaxHp(u32),
}

impl fmt::Display for UpgradeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeOption::Unlock(skill) => write!(f, "{}", skill),
            UpgradeOption::Heal(n) => write!(f, "Heal (+{} HP)", n),
            UpgradeOption::Damage(n) => write!(f, "Damage +{}", n),
            UpgradeOption::MaxHp(n) => write!(f, "Max HP +{}", n),
        }
    }
}

/// A level gained by [`Progression::add_exp`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    /// New level
    pub level: u32,
    /// Max HP to add
    pub max_hp_gain: u32,
    /// Attack damage to add
    pub damage_gain: u32,
}

/// Experience and selection state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Progression {
    config: ProgressionConfig,
    level: u32,
    exp: u32,
    required_exp: u32,
    queued: u32,
    offer: Option<Vec<UpgradeOption>>,
}

impl Progression {
    /// Level 1, no experience.
    pub fn new(config: ProgressionConfig) -> Self {
        Self {
            level: 1,
            exp: 0,
            required_exp: config.base_required_exp.max(1),
            queued: 0,
            offer: None,
            config,
        }
    }

    /// Current level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Experience toward the next level.
    pub fn exp(&self) -> u32 {
        self.exp
    }

    /// Experience needed for the next level.
    pub fn required_exp(&self) -> u32 {
        self.required_exp
    }

    /// Configuration.
    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Selections waiting behind the one on screen.
    pub fn queued(&self) -> u32 {
        self.queued
    }

    /// The offer currently on screen.
    pub fn offer(&self) -> Option<&[UpgradeOption]> {
        self.offer.as_deref()
    }

    /// A selection is pending, so the simulation clock must stop.
    pub fn is_paused(&self) -> bool {
        self.offer.is_some() || self.queued > 0
    }

    /// Accumulate experience, levelling up as many times as it covers.
    pub fn add_exp(&mut self, amount: u32) -> Vec<LevelUp> {
        let mut gained = Vec::new();
        self.exp = self.exp.saturating_add(amount);

        while self.exp >= self.required_exp {
            self.exp -= self.required_exp;
            self.level += 1;
            self.required_exp = self.required_exp.saturating_add(self.config.required_exp_step);
            self.queued += 1;
            info!("level up: {} (next at {})", self.level, self.required_exp);

            gained.push(LevelUp {
                level: self.level,
                max_hp_gain: self.config.level_max_hp,
                damage_gain: self.config.level_damage,
            });
        }
        gained
    }

    /// If nothing is on screen and a selection is queued, draw the next
    /// offer. `owned` reports skills the player already has.
    pub fn present_next(
        &mut self,
        owned: impl Fn(Skill) -> bool,
        rng: &mut DeterministicRng,
    ) -> Option<&[UpgradeOption]> {
        if self.offer.is_none() && self.queued > 0 {
            self.queued -= 1;
            let mut pool = self.option_pool(&owned);
            let mut offer = Vec::with_capacity(self.config.offer_size);

            while offer.len() < self.config.offer_size && !pool.is_empty() {
                let pick = rng.next_int(pool.len() as u32) as usize;
                offer.push(pool.remove(pick));
            }
            debug!("upgrade offer: {:?}", offer);
            self.offer = Some(offer);
            return self.offer.as_deref();
        }
        None
    }

    /// Everything currently eligible, in pool order.
    pub fn option_pool(&self, owned: impl Fn(Skill) -> bool) -> Vec<UpgradeOption> {
        let mut pool: Vec<UpgradeOption> = UNLOCKABLE_SKILLS
            .iter()
            .copied()
            .filter(|&skill| {
                !owned(skill) && !skill.exclusive_partner().is_some_and(&owned)
            })
            .map(UpgradeOption::Unlock)
            .collect();

        pool.push(UpgradeOption::Heal(self.config.heal_amount));
        pool.push(UpgradeOption::Damage(self.config.damage_amount));
        pool.push(UpgradeOption::MaxHp(self.config.max_hp_amount));
        pool
    }

    /// Take option `index` from the offer on screen. The caller applies it
    /// and then presents the next queued offer, if any.
    pub fn choose(&mut self, index: usize) -> Result<UpgradeOption, SelectionError> {
        let offer = self.offer.as_ref().ok_or(SelectionError::NoPendingOffer)?;
        let option = *offer.get(index).ok_or(SelectionError::IndexOutOfRange {
            index,
            len: offer.len(),
        })?;
        self.offer = None;
        info!("upgrade chosen: {}", option);
        Ok(option)
    }

    /// Back to level 1.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Feed into a state hash.
    pub fn hash_into(&self, hasher: &mut crate::core::hash::StateHasher) {
        hasher.update_u32(self.level);
        hasher.update_u32(self.exp);
        hasher.update_u32(self.required_exp);
        hasher.update_u32(self.queued);
        hasher.update_bool(self.offer.is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nothing_owned(_: Skill) -> bool {
        false
    }

    #[test]
    fn test_level_thresholds() {
        let mut p = Progression::new(ProgressionConfig::default());
        assert!(p.add_exp(9).is_empty());
        assert!(!p.is_paused());

        let ups = p.add_exp(1);
        assert_eq!(ups.len(), 1);
        assert_eq!(ups[0].level, 2);
        assert_eq!(ups[0].max_hp_gain, 20);
        assert_eq!(p.exp(), 0);
        assert_eq!(p.required_exp(), 15);
        assert!(p.is_paused());
    }

    #[test]
    fn test_multiple_level_ups_queue_offers() {
        let mut p = Progression::new(ProgressionConfig::default());
        // 10 + 15 = 25, 2 left over
        let ups = p.add_exp(27);
        assert_eq!(ups.len(), 2);
        assert_eq!(p.level(), 3);
        assert_eq!(p.exp(), 2);
        assert_eq!(p.queued(), 2);

        let mut rng = DeterministicRng::new(1);
        assert_eq!(p.present_next(nothing_owned, &mut rng).map(|o| o.len()), Some(3));
        assert_eq!(p.queued(), 1);

        // Already showing one
        assert!(p.present_next(nothing_owned, &mut rng).is_none());

        p.choose(0).unwrap();
        assert!(p.is_paused());
        assert!(p.present_next(nothing_owned, &mut rng).is_some());
        p.choose(2).unwrap();
        assert!(!p.is_paused());
    }

    #[test]
    fn test_offer_options_are_distinct() {
        let mut p = Progression::new(ProgressionConfig::default());
        let mut rng = DeterministicRng::new(77);
        for _ in 0..20 {
            p.add_exp(p.required_exp());
            let offer = p.present_next(nothing_owned, &mut rng).unwrap().to_vec();
            for (i, a) in offer.iter().enumerate() {
                assert!(!offer[i + 1..].contains(a));
            }
            p.choose(0).unwrap();
        }
    }

    #[test]
    fn test_exclusive_pairs_removed_from_pool() {
        let p = Progression::new(ProgressionConfig::default());
        let pool = p.option_pool(|s| s == Skill::Spin || s == Skill::Fireball);

        assert!(!pool.contains(&UpgradeOption::Unlock(Skill::Spin)));
        assert!(!pool.contains(&UpgradeOption::Unlock(Skill::Parry)));
        assert!(!pool.contains(&UpgradeOption::Unlock(Skill::Fireball)));
        assert!(pool.contains(&UpgradeOption::Unlock(Skill::SwordWave)));
        assert!(pool.contains(&UpgradeOption::Unlock(Skill::BloodSlash)));
        assert!(pool.contains(&UpgradeOption::Heal(30)));
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_choose_errors() {
        let mut p = Progression::new(ProgressionConfig::default());
        assert_eq!(p.choose(0), Err(SelectionError::NoPendingOffer));

        p.add_exp(10);
        let mut rng = DeterministicRng::new(3);
        p.present_next(nothing_owned, &mut rng);
        assert_eq!(
            p.choose(3),
            Err(SelectionError::IndexOutOfRange { index: 3, len: 3 })
        );
        // Still pending after a bad index
        assert!(p.offer().is_some());
    }

    #[test]
    fn test_offer_determinism() {
        let draw = |seed| {
            let mut p = Progression::new(ProgressionConfig::default());
            let mut rng = DeterministicRng::new(seed);
            p.add_exp(10);
            p.present_next(nothing_owned, &mut rng).map(|o| o.to_vec())
        };
        assert_eq!(draw(12345), draw(12345));
    }

    #[test]
    fn test_exp_per_tier() {
        let config = ProgressionConfig::default();
        assert_eq!(config.exp_for(EnemyTier::Normal), 1);
        assert_eq!(config.exp_for(EnemyTier::Elite), 3);
        assert_eq!(config.exp_for(EnemyTier::Boss), 10);
    }
}
