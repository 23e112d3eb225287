//! Randomized Leveled Set
//!
//! The classic skip list. Each key draws a level from a geometric
//! distribution and is linked into every level from 0 up to that draw. Level
//! 0 holds every key; higher levels are progressively sparser.
//!
//! ```text
//! Level 2: HEAD ---------------> 9 ---------------------> NULL
//! Level 1: HEAD ------> 6 -----> 9 ---------> 17 -------> NULL
//! Level 0: HEAD -> 3 -> 6 -> 7 -> 9 -> 12 -> 17 -> 19 -> NULL
//! ```
//!
//! Bounds are expected, not worst-case: there is no rebalancing, and an
//! unlucky sequence of draws degrades search to a linear scan.

use std::fmt;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use smallvec::SmallVec;
use smallvec::smallvec;

use super::LeveledSet;
use super::primitives::Arena;
use super::primitives::HEAD;
use super::primitives::Idx;
use super::primitives::NULL;
use crate::config::RandomizedConfig;
use crate::error::ConfigResult;

type Predecessors = SmallVec<[Idx; 24]>;

/// Geometric level generator: the chance of reaching level `n` is `p` times
/// the chance of reaching level `n - 1`, truncated at `max`.
pub struct GeometricLevels {
    p: f64,
    max: usize,
    rng: SmallRng,
}

impl GeometricLevels {
    pub fn new(max: usize, p: f64, seed: Option<u64>) -> GeometricLevels {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        return GeometricLevels { p, max, rng };
    }

    /// Draw a level in `0..=max`.
    pub fn draw(&mut self) -> usize {
        let mut level = 0;
        while level < self.max && self.rng.r#gen::<f64>() < self.p {
            level += 1;
        }
        return level;
    }
}

/// A skip list over keys of type `K`.
pub struct RandomizedLeveledSet<K> {
    arena: Arena<K>,
    levels: GeometricLevels,
    /// Highest level any key may occupy.
    max_level: usize,
    /// Highest level currently holding a key.
    current_level: usize,
    len: usize,
    verbose: bool,
}

impl<K: Ord> RandomizedLeveledSet<K> {
    /// Create a set with the given level cap and promotion probability.
    ///
    /// # Panics
    ///
    /// Panics if `max_level` is zero or too large, or `p` is not in (0, 1).
    pub fn new(max_level: usize, p: f64) -> RandomizedLeveledSet<K> {
        let config = RandomizedConfig::new(max_level, p);
        if let Err(err) = config.validate() {
            panic!("invalid randomized set configuration: {}", err);
        }
        return Self::build(config);
    }

    /// Create a set, rejecting an invalid configuration before any node is
    /// allocated.
    pub fn try_new(config: RandomizedConfig) -> ConfigResult<RandomizedLeveledSet<K>> {
        config.validate()?;
        return Ok(Self::build(config));
    }

    fn build(config: RandomizedConfig) -> RandomizedLeveledSet<K> {
        return RandomizedLeveledSet {
            arena: Arena::new(config.max_level + 1),
            levels: GeometricLevels::new(config.max_level, config.p, config.seed),
            max_level: config.max_level,
            current_level: 0,
            len: 0,
            verbose: config.verbose,
        };
    }

    /// Highest level currently holding a key.
    pub fn current_level(&self) -> usize {
        return self.current_level;
    }

    /// Rightmost node before `key` on each level, walking from the current
    /// top level down. Levels above the current top route through the head.
    fn find_predecessors(&self, key: &K) -> Predecessors {
        let mut predecessors: Predecessors = smallvec![HEAD; self.max_level + 1];
        let mut current = HEAD;
        for level in (0..=self.current_level).rev() {
            current = self.arena.advance(current, level, key);
            predecessors[level] = current;
        }
        return predecessors;
    }
}

impl<K: Ord> LeveledSet<K> for RandomizedLeveledSet<K> {
    fn insert(&mut self, key: K) -> bool {
        let predecessors = self.find_predecessors(&key);
        if self.arena.holds(self.arena.next(predecessors[0], 0), &key) {
            return false;
        }

        let level = self.levels.draw();
        let new_idx = self.arena.alloc(key);
        for (lvl, &pred) in predecessors.iter().enumerate().take(level + 1) {
            self.arena.link_after(pred, lvl, new_idx);
        }
        if level > self.current_level {
            self.current_level = level;
        }
        self.len += 1;

        if self.verbose {
            tracing::debug!(level, len = self.len, "inserted key");
        }
        return true;
    }

    fn delete(&mut self, key: &K) -> bool {
        let predecessors = self.find_predecessors(key);
        let target = self.arena.next(predecessors[0], 0);
        if !self.arena.holds(target, key) {
            if self.verbose {
                tracing::debug!("delete: key not found");
            }
            return false;
        }

        // A node occupies a contiguous run of levels from 0 upwards.
        for level in 0..=self.current_level {
            let pred = predecessors[level];
            if self.arena.next(pred, level) != target {
                break;
            }
            let after = self.arena.next(target, level);
            self.arena.set_next(pred, level, after);
        }
        while self.current_level > 0 && self.arena.next(HEAD, self.current_level) == NULL {
            self.current_level -= 1;
        }
        self.arena.release(target);
        self.len -= 1;

        if self.verbose {
            tracing::debug!(len = self.len, "deleted key");
        }
        return true;
    }

    fn search(&mut self, key: &K) -> bool {
        let mut current = HEAD;
        for level in (0..=self.current_level).rev() {
            current = self.arena.advance(current, level, key);
            if self.arena.holds(self.arena.next(current, level), key) {
                if self.verbose {
                    tracing::debug!(level, "found key");
                }
                return true;
            }
        }
        if self.verbose {
            tracing::debug!("search: key not found");
        }
        return false;
    }

    fn len(&self) -> usize {
        return self.len;
    }

    fn height(&self) -> usize {
        return self.max_level + 1;
    }

    fn level_keys(&self, level: usize) -> Vec<&K> {
        return self.arena.keys(level);
    }

    fn level_len(&self, level: usize) -> usize {
        return self.arena.count(level);
    }

    fn describe(&self) -> String
    where
        K: fmt::Debug,
    {
        return self
            .arena
            .describe("Skip List", (0..=self.current_level).rev());
    }

    fn check_invariants(&self) {
        self.arena.assert_sorted(0..=self.max_level);

        let bottom = self.arena.count(0);
        assert_eq!(
            bottom, self.len,
            "INVARIANT VIOLATED: level 0 holds {} keys but len()={}",
            bottom, self.len
        );
        assert_eq!(
            self.arena.live(),
            self.len + 1,
            "INVARIANT VIOLATED: arena holds unreachable nodes"
        );

        // Higher levels are subsets of lower ones.
        for level in 1..=self.max_level {
            self.arena.assert_nested(level, level - 1);
        }
        for level in self.current_level + 1..=self.max_level {
            assert_eq!(
                self.arena.next(HEAD, level),
                NULL,
                "INVARIANT VIOLATED: level {} is above the current top but not empty",
                level
            );
        }
        if self.current_level > 0 {
            assert_ne!(
                self.arena.next(HEAD, self.current_level),
                NULL,
                "INVARIANT VIOLATED: current top level {} is empty",
                self.current_level
            );
        }
    }
}
