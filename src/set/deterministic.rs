//! Deterministic Leveled Set
//!
//! A todolist: every key is inserted on every level, and whenever the top
//! level grows past one key a partial rebuild thins the sparse levels back
//! to the geometric bound `|L_i| <= (2 - epsilon)^i`.
//!
//! # Rebuild
//!
//! The rebuild finds the special index `m`, the smallest level already within
//! its bound, and rebuilds `L_{m-1}, ..., L_0` in that order, each taking every
//! second node of the level below it. Work is proportional to `|L_m|`, and
//! the total over `N` operations is `O(N log N / epsilon)`.

use std::fmt;

use super::LeveledSet;
use super::nested::NestedLevels;
use super::nested::RebuildStats;
use super::primitives::HEAD;
use crate::config::LeveledConfig;
use crate::error::ConfigResult;

/// A deterministic todolist over keys of type `K`.
pub struct DeterministicLeveledSet<K> {
    levels: NestedLevels<K>,
}

impl<K: Ord> DeterministicLeveledSet<K> {
    /// Create a set with levels `0..=height`.
    ///
    /// # Panics
    ///
    /// Panics if `height` is zero or too large, or `epsilon` is not in
    /// (0, 1).
    pub fn new(height: usize, epsilon: f64) -> DeterministicLeveledSet<K> {
        let config = LeveledConfig::new(height, epsilon);
        if let Err(err) = config.validate() {
            panic!("invalid deterministic set configuration: {}", err);
        }
        return DeterministicLeveledSet {
            levels: NestedLevels::new(config),
        };
    }

    /// Create a set, rejecting an invalid configuration before any node is
    /// allocated.
    pub fn try_new(config: LeveledConfig) -> ConfigResult<DeterministicLeveledSet<K>> {
        config.validate()?;
        return Ok(DeterministicLeveledSet {
            levels: NestedLevels::new(config),
        });
    }

    pub fn config(&self) -> &LeveledConfig {
        return &self.levels.config;
    }

    pub fn rebuild_stats(&self) -> &RebuildStats {
        return self.levels.stats();
    }

    /// Rebuild once the top level holds more than one key.
    fn check_rebuild(&mut self) {
        if self.levels.count(0) <= 1 {
            return;
        }
        let config = self.levels.config.clone();
        let bound = move |level: usize| config.density_bound(level);
        let special = self.levels.special_index(&bound);
        self.levels.rebuild(special, &bound, |_, _| false);
    }
}

impl<K: Ord> LeveledSet<K> for DeterministicLeveledSet<K> {
    fn insert(&mut self, key: K) -> bool {
        if self.levels.insert(key).is_none() {
            return false;
        }
        if self.levels.config.verbose {
            tracing::debug!(len = self.levels.len(), "inserted key");
        }
        self.check_rebuild();
        return true;
    }

    fn delete(&mut self, key: &K) -> bool {
        if self.levels.remove(key).is_none() {
            if self.levels.config.verbose {
                tracing::debug!("delete: key not found");
            }
            return false;
        }
        if self.levels.config.verbose {
            tracing::debug!(len = self.levels.len(), "deleted key");
        }
        self.check_rebuild();
        return true;
    }

    fn search(&mut self, key: &K) -> bool {
        // Nesting means a hit on any level is a hit on the densest one.
        let arena = &self.levels.arena;
        let mut current = HEAD;
        for level in 0..=self.levels.bottom() {
            current = arena.advance(current, level, key);
            if arena.holds(arena.next(current, level), key) {
                if self.levels.config.verbose {
                    tracing::debug!(level, "found key");
                }
                return true;
            }
        }
        if self.levels.config.verbose {
            tracing::debug!("search: key not found");
        }
        return false;
    }

    fn len(&self) -> usize {
        return self.levels.len();
    }

    fn height(&self) -> usize {
        return self.levels.bottom() + 1;
    }

    fn level_keys(&self, level: usize) -> Vec<&K> {
        return self.levels.arena.keys(level);
    }

    fn level_len(&self, level: usize) -> usize {
        return self.levels.count(level);
    }

    fn describe(&self) -> String
    where
        K: fmt::Debug,
    {
        return self
            .levels
            .arena
            .describe("ToDo List", 0..=self.levels.bottom());
    }

    fn check_invariants(&self) {
        self.levels.check_invariants();
        assert!(
            self.levels.count(0) <= 1,
            "INVARIANT VIOLATED: top level holds {} keys",
            self.levels.count(0)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn empty_set() {
        let mut set: DeterministicLeveledSet<i32> = DeterministicLeveledSet::new(3, 0.1);
        assert!(set.is_empty());
        assert!(!set.search(&1));
        assert!(!set.delete(&1));
        assert_eq!(set.height(), 4);
        set.check_invariants();
    }

    #[test]
    fn reference_sequence() {
        let mut set = DeterministicLeveledSet::new(3, 0.1);
        for key in [3, 6, 7, 9, 12, 17, 19] {
            assert!(set.insert(key));
            set.check_invariants();
        }
        assert!(set.search(&9));
        assert!(!set.search(&15));

        assert!(set.delete(&3));
        assert!(set.delete(&7));
        set.check_invariants();
        assert!(!set.search(&3));
        assert!(!set.search(&7));
        assert_eq!(set.level_keys(3), vec![&6, &9, &12, &17, &19]);
    }

    #[test]
    fn top_level_stays_small() {
        let mut set = DeterministicLeveledSet::new(3, 0.1);
        for key in 0..63 {
            set.insert(key);
            assert!(set.level_len(0) <= 1, "top level overflowed after {}", key);
        }
        set.check_invariants();
        for key in 0..63 {
            assert!(set.search(&key));
        }
    }

    #[test]
    fn rebuilt_levels_meet_density_bound() {
        let height = LeveledConfig::height_for(500, 0.2).unwrap();
        let mut set = DeterministicLeveledSet::new(height, 0.2);
        for key in 0..500 {
            let rebuilds = set.rebuild_stats().rebuilds;
            set.insert(key * 7 % 500);
            if set.rebuild_stats().rebuilds == rebuilds {
                continue;
            }
            if let Some(special) = set.rebuild_stats().last_special_index {
                for level in 0..special {
                    assert!(
                        set.level_len(level) as f64 <= set.config().density_bound(level),
                        "level {} over its bound after rebuild",
                        level
                    );
                }
            }
        }
        set.check_invariants();
    }

    #[test]
    fn delete_hands_slots_to_substitute() {
        let mut set = DeterministicLeveledSet::new(4, 0.2);
        for key in 0..20 {
            set.insert(key);
        }
        for level in 0..set.height() {
            let keys: Vec<i32> = set.level_keys(level).into_iter().copied().collect();
            for key in keys {
                let size = set.level_len(level);
                set.delete(&key);
                set.check_invariants();
                assert!(set.level_len(level) <= size);
                set.insert(key);
            }
        }
        assert_eq!(set.len(), 20);
    }

    #[test]
    fn delete_maximum_unlinks() {
        let mut set = DeterministicLeveledSet::new(2, 0.5);
        for key in [1, 2, 3] {
            set.insert(key);
        }
        assert!(set.delete(&3));
        assert!(!set.search(&3));
        assert_eq!(set.level_keys(2), vec![&1, &2]);
        set.check_invariants();
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut set = DeterministicLeveledSet::new(3, 0.1);
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert_eq!(set.len(), 2);
        set.check_invariants();
    }

    #[test]
    fn delete_absent_leaves_structure_unchanged() {
        let mut set = DeterministicLeveledSet::new(5, 0.2);
        for key in (0..40).map(|k| k * 3) {
            set.insert(key);
        }
        let before = set.describe();
        assert!(!set.delete(&4));
        assert_eq!(set.describe(), before);
    }

    #[test]
    fn invalid_config_fails_fast() {
        let result: ConfigResult<DeterministicLeveledSet<i32>> =
            DeterministicLeveledSet::try_new(LeveledConfig::new(3, 1.5));
        assert_eq!(result.err(), Some(ConfigError::EpsilonOutOfRange(1.5)));
    }

    #[test]
    #[should_panic(expected = "invalid deterministic set configuration")]
    fn new_panics_on_zero_height() {
        let _set: DeterministicLeveledSet<i32> = DeterministicLeveledSet::new(0, 0.1);
    }

    #[test]
    fn describe_lists_levels_sparse_first() {
        let mut set = DeterministicLeveledSet::new(1, 0.5);
        set.insert(4);
        set.insert(2);
        assert_eq!(
            set.describe(),
            "ToDo List:\nLevel 0 (count: 1): 4 -> None\nLevel 1 (count: 2): 2 -> 4 -> None\n"
        );
    }
}
