//! Working-Set Leveled Set
//!
//! A deterministic todolist that adapts to access patterns. Searches move
//! the found key to the tail of a recency log `Q`, and every partial rebuild
//! keeps the most recently searched keys on the sparse levels. As a result,
//! searching for `x` costs roughly the logarithm of its working-set number
//! (the number of distinct keys searched since `x` was last searched) rather
//! than the logarithm of the set size.
//!
//! # Search
//!
//! The walk goes from level 0 towards the densest level and tests for the key
//! only at checkpoint levels (perfect squares) and at the densest level. On a
//! hit at level `k`, a shallow alias of the key is linked into every level
//! above its shallowest appearance, and a rebuild runs immediately.
//!
//! # Aliases
//!
//! The alias is a second node carrying the same key. Inside the rebuild it
//! stands in for its home node, sharing its label. Afterwards, the home node
//! takes over every level the alias still occupies and the alias is freed. No
//! alias outlives the search that created it.
//!
//! # Rebuild
//!
//! 1. Pick the special index `m`, the smallest level with
//!    `|L_m| <= (2 - epsilon)^m`.
//! 2. Label the most recently searched nodes with their recency rank, as many
//!    as level `m - 1` reserves (half its capacity, rounded up).
//! 3. Rebuild `L_{m-1}, ..., L_0`. Level `i - 1` keeps the nodes whose rank
//!    is below its reservation, then fills the rest of its capacity by stride.
//!    Every rebuilt level meets `(2 - epsilon)^i`, and the most recent key
//!    always lands on level 0.
//! 4. Clear the labels.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::smallvec;

use super::LeveledSet;
use super::nested::NestedLevels;
use super::nested::Predecessors;
use super::nested::RebuildStats;
use super::primitives::HEAD;
use super::primitives::Idx;
use super::primitives::RecencyLog;
use crate::config::LeveledConfig;
use crate::error::ConfigResult;

/// A shallow alias created by a search, awaiting reconciliation.
#[derive(Clone, Copy)]
struct Alias {
    alias: Idx,
    home: Idx,
    /// The alias occupies levels `0..depth`.
    depth: usize,
}

/// Perfect-square levels, where search tests for an early hit.
fn is_checkpoint(level: usize) -> bool {
    let root = level.isqrt();
    return root * root == level;
}

/// A working-set todolist over keys of type `K`.
pub struct WorkingSetLeveledSet<K> {
    levels: NestedLevels<K>,
    /// Home nodes ordered by last search; the tail is the most recent.
    recency: RecencyLog,
    /// Recency ranks handed out for the rebuild in progress, keyed by home
    /// node. Empty between operations.
    labels: FxHashMap<Idx, usize>,
}

impl<K: Ord + Clone> WorkingSetLeveledSet<K> {
    /// Create a set with levels `0..=height`.
    ///
    /// # Panics
    ///
    /// Panics if `height` is zero or too large, or `epsilon` is not in
    /// (0, 1).
    pub fn new(height: usize, epsilon: f64) -> WorkingSetLeveledSet<K> {
        let config = LeveledConfig::new(height, epsilon);
        if let Err(err) = config.validate() {
            panic!("invalid working-set configuration: {}", err);
        }
        return Self::build(config);
    }

    /// Create a set, rejecting an invalid configuration before any node is
    /// allocated.
    pub fn try_new(config: LeveledConfig) -> ConfigResult<WorkingSetLeveledSet<K>> {
        config.validate()?;
        return Ok(Self::build(config));
    }

    fn build(config: LeveledConfig) -> WorkingSetLeveledSet<K> {
        return WorkingSetLeveledSet {
            levels: NestedLevels::new(config),
            recency: RecencyLog::new(),
            labels: FxHashMap::default(),
        };
    }

    pub fn config(&self) -> &LeveledConfig {
        return &self.levels.config;
    }

    pub fn rebuild_stats(&self) -> &RebuildStats {
        return self.levels.stats();
    }

    /// Sparsest level holding `key`, or `None` if it is absent.
    pub fn shallowest_level(&self, key: &K) -> Option<usize> {
        let predecessors = self.levels.find_predecessors(key);
        let arena = &self.levels.arena;
        return (0..=self.levels.bottom())
            .find(|&level| arena.holds(arena.next(predecessors[level], level), key));
    }

    /// Number of distinct keys searched since `key` was last searched, or
    /// `None` if it has not been searched since it was inserted.
    pub fn working_set_number(&self, key: &K) -> Option<usize> {
        let predecessors = self.levels.find_predecessors(key);
        let idx = self.levels.find(&predecessors, key)?;
        return self.recency.rank(idx);
    }

    /// Searched keys, most recent first.
    pub fn recent_keys(&self) -> Vec<&K> {
        return self
            .recency
            .most_recent()
            .filter_map(|idx| self.levels.arena.key(idx))
            .collect();
    }

    fn check_rebuild(&mut self) {
        if self.levels.count(0) > self.levels.config.top_level_limit() {
            self.rebuild(None);
        }
    }

    /// Label the most recent nodes, rebuild, then settle any alias.
    fn rebuild(&mut self, alias: Option<Alias>) {
        let config = self.levels.config.clone();
        let bound = |level: usize| config.density_bound(level);

        let special = self.levels.special_index(bound);
        if special > 0 {
            let quota = config.label_limit(special - 1);
            for (rank, idx) in self.recency.most_recent().take(quota).enumerate() {
                self.labels.insert(idx, rank);
            }
        }

        let labels = &self.labels;
        self.levels.rebuild(special, bound, |idx, level| {
            let home = match alias {
                Some(alias) if alias.alias == idx => alias.home,
                _ => idx,
            };
            // Labels are distinct and a key has one node per level, so at
            // most `label_limit(level - 1)` nodes pass.
            return labels
                .get(&home)
                .is_some_and(|&label| label < config.label_limit(level - 1));
        });
        self.labels.clear();

        if let Some(alias) = alias {
            self.levels.reconcile_alias(alias.alias, alias.home, 0..alias.depth);
        }
    }
}

impl<K: Ord + Clone> LeveledSet<K> for WorkingSetLeveledSet<K> {
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
        let Some(idx) = self.levels.remove(key) else {
            if self.levels.config.verbose {
                tracing::debug!("delete: key not found");
            }
            return false;
        };
        self.recency.remove(idx);
        if self.levels.config.verbose {
            tracing::debug!(len = self.levels.len(), "deleted key");
        }
        self.check_rebuild();
        return true;
    }

    fn search(&mut self, key: &K) -> bool {
        let bottom = self.levels.bottom();
        let arena = &self.levels.arena;
        let mut predecessors: Predecessors = smallvec![HEAD; bottom + 1];
        let mut current = HEAD;
        let mut found = None;
        for level in 0..=bottom {
            current = arena.advance(current, level, key);
            predecessors[level] = current;
            if is_checkpoint(level) || level == bottom {
                let next = arena.next(current, level);
                if arena.holds(next, key) {
                    found = Some((level, next));
                    break;
                }
            }
        }

        let Some((level, home)) = found else {
            if self.levels.config.verbose {
                tracing::debug!("search: key not found");
            }
            return false;
        };

        // Levels between checkpoints may already hold the key; the alias
        // only fills the prefix where it is missing.
        let depth = (0..level)
            .find(|&lvl| arena.holds(arena.next(predecessors[lvl], lvl), key))
            .unwrap_or(level);
        if self.levels.config.verbose {
            tracing::debug!(level, depth, "found key");
        }

        self.recency.touch(home);
        let alias = if depth > 0 {
            let alias = self.levels.link_alias(key.clone(), &predecessors, 0..depth);
            Some(Alias { alias, home, depth })
        } else {
            None
        };
        self.rebuild(alias);
        return true;
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
            .describe("Working ToDo List", 0..=self.levels.bottom());
    }

    fn check_invariants(&self) {
        self.levels.check_invariants();
        assert!(
            self.labels.is_empty(),
            "INVARIANT VIOLATED: {} labels survived a rebuild",
            self.labels.len()
        );
        assert!(
            self.recency.len() <= self.levels.len(),
            "INVARIANT VIOLATED: recency log longer than the set"
        );
        for idx in self.recency.most_recent() {
            let key = self.levels.arena.key(idx);
            assert!(
                key.is_some(),
                "INVARIANT VIOLATED: recency log references a free slot"
            );
            if let Some(key) = key {
                let predecessors = self.levels.find_predecessors(key);
                assert_eq!(
                    self.levels.find(&predecessors, key),
                    Some(idx),
                    "INVARIANT VIOLATED: recency log references a node off the densest level"
                );
            }
        }
    }
}
