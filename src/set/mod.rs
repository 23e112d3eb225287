//! Leveled ordered-key sets.
//!
//! Three structures share one shape, a head sentinel plus parallel singly
//! linked levels, and differ in how keys are spread across the levels:
//!
//! | Type | Leveling | Rebalancing |
//! |------|----------|-------------|
//! | `RandomizedLeveledSet` | geometric coin flips per key | none |
//! | `DeterministicLeveledSet` | every key on every level, thinned | partial rebuild when the top level overflows |
//! | `WorkingSetLeveledSet` | as deterministic, biased by recency | partial rebuild after every hit |

mod deterministic;
mod nested;
pub mod primitives;
mod randomized;
mod working_set;

use std::fmt;

pub use deterministic::DeterministicLeveledSet;
pub use nested::RebuildStats;
pub use randomized::GeometricLevels;
pub use randomized::RandomizedLeveledSet;
pub use working_set::WorkingSetLeveledSet;

/// An ordered set of keys spread across linked levels.
///
/// Implementors provide:
/// - Insert, delete and membership search
/// - Per-level inspection for diagnostics and tests
/// - An invariant check that panics on a structural bug
///
/// Level numbering is implementation-specific: the randomized set keeps all
/// keys on level 0, the nested sets keep all keys on their last level.
pub trait LeveledSet<K: Ord> {
    /// Add `key`. Returns false, leaving the set untouched, if it is
    /// already present.
    fn insert(&mut self, key: K) -> bool;

    /// Remove `key`. Returns false if it was absent.
    fn delete(&mut self, key: &K) -> bool;

    /// Whether `key` is present.
    ///
    /// Takes `&mut self` because self-adjusting sets reorganize on access.
    fn search(&mut self, key: &K) -> bool;

    /// Number of distinct keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Number of levels, including empty ones.
    fn height(&self) -> usize;

    /// Keys on `level`, ascending.
    fn level_keys(&self, level: usize) -> Vec<&K>;

    /// Number of keys on `level`.
    fn level_len(&self, level: usize) -> usize {
        return self.level_keys(level).len();
    }

    /// Per-level dump of the structure, each level terminated by `None`.
    fn describe(&self) -> String
    where
        K: fmt::Debug;

    /// Panic with a description if a structural invariant does not hold.
    ///
    /// Walks every level, so it is meant for tests and debugging rather than
    /// the hot path.
    fn check_invariants(&self);
}
