//! Hit Registry
//!
//! Per-activation dedup set. Whoever owns an active hitbox owns its
//! registry; damage is applied only when `try_register` returns true.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

/// Identifier of anything that can be struck (enemy ids).
pub type TargetId = u32;

/// Set of targets already hit during the current activation window.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HitRegistry {
    hits: BTreeSet<TargetId>,
    /// Number of windows opened so far (diagnostics only)
    activations: u32,
}

impl HitRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new activation window, forgetting every previous hit.
    pub fn begin_activation(&mut self) {
        self.hits.clear();
        self.activations = self.activations.wrapping_add(1);
    }

    /// Register a hit on `target`.
    ///
    /// Returns true the first time a target is seen in this window,
    /// false for every repeat.
    #[inline]
    pub fn try_register(&mut self, target: TargetId) -> bool {
        self.hits.insert(target)
    }

    /// Forget hits mid-activation so continuous skills can hit again.
    pub fn clear_periodically(&mut self) {
        self.hits.clear();
    }

    /// Has `target` been hit in this window?
    #[inline]
    pub fn contains(&self, target: TargetId) -> bool {
        self.hits.contains(&target)
    }

    /// Number of distinct targets hit in this window.
    #[inline]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// True if nothing has been hit in this window.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of activation windows opened.
    pub fn activations(&self) -> u32 {
        self.activations
    }

    /// Iterate hit targets in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.hits.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_register_once_per_window() {
        let mut reg = HitRegistry::new();
        reg.begin_activation();

        assert!(reg.try_register(7));
        assert!(!reg.try_register(7));
        assert!(reg.try_register(8));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_begin_activation_clears() {
        let mut reg = HitRegistry::new();
        reg.begin_activation();
        reg.try_register(1);

        reg.begin_activation();
        assert!(reg.is_empty());
        assert!(reg.try_register(1));
        assert_eq!(reg.activations(), 2);
    }

    #[test]
    fn test_periodic_clear_keeps_window() {
        let mut reg = HitRegistry::new();
        reg.begin_activation();
        reg.try_register(3);
        reg.clear_periodically();

        assert!(!reg.contains(3));
        assert!(reg.try_register(3));
        assert_eq!(reg.activations(), 1);
    }

    proptest! {
        #[test]
        fn test_exactly_one_success_per_id_per_clear(
            ids in proptest::collection::vec(0u32..16, 0..64),
            clear_at in 0usize..64,
        ) {
            let mut reg = HitRegistry::new();
            reg.begin_activation();
            let mut successes = std::collections::BTreeMap::<u32, u32>::new();

            for (i, id) in ids.iter().enumerate() {
                if i == clear_at {
                    reg.clear_periodically();
                    successes.clear();
                }
                if reg.try_register(*id) {
                    *successes.entry(*id).or_default() += 1;
                }
            }

            for count in successes.values() {
                prop_assert_eq!(*count, 1);
            }
        }
    }
}
