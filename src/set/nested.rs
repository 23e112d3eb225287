//! Nested levels with partial rebuilding.
//!
//! The shared core of the deterministic and working-set sets. Levels are
//! numbered from the sparsest (0) to the densest (`height`), and they nest:
//! every key on level `i` is also on every level below it in the picture.
//!
//! ```text
//! Level 0: HEAD ----------------------> 9 -------------------------> NULL
//! Level 1: HEAD ---------> 6 ---------> 9 ----------> 17 ----------> NULL
//! Level 2: HEAD ---------> 6 ---------> 9 -----> 12 -> 17 ---------> NULL
//! Level 3: HEAD -> 3 ----> 6 -> 7 ----> 9 -----> 12 -> 17 -> 19 ---> NULL
//! ```
//!
//! # Operations
//!
//! - `find_predecessors(key)`: walk level 0 first, then carry the predecessor
//!   down level by level
//! - `insert(key)`: splice into every level
//! - `remove(key)`: hand the key's slots to its successor (the substitute)
//! - `rebuild(m, ..)`: rebuild levels `m-1` down to `0`, each from the level
//!   below it in the picture
//!
//! Per-level counts are maintained incrementally, so the rebuild trigger and
//! the special index are found without walking the levels.

use smallvec::SmallVec;
use smallvec::smallvec;

use super::primitives::Arena;
use super::primitives::HEAD;
use super::primitives::Idx;
use super::primitives::NULL;
use crate::config::LeveledConfig;

pub(super) type Predecessors = SmallVec<[Idx; 24]>;

/// Cumulative rebuild work, for checking the amortized bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Partial rebuilds that relinked at least one level.
    pub rebuilds: u64,
    /// Nodes visited while relinking, summed over all rebuilds.
    pub relinked: u64,
    /// Special index chosen by the most recent rebuild.
    pub last_special_index: Option<usize>,
}

pub(super) struct NestedLevels<K> {
    pub(super) arena: Arena<K>,
    pub(super) config: LeveledConfig,
    /// Exact number of nodes on each level.
    counts: Vec<usize>,
    len: usize,
    stats: RebuildStats,
    /// Set once the height has proven too small for the set.
    warned_overflow: bool,
}

impl<K: Ord> NestedLevels<K> {
    pub(super) fn new(config: LeveledConfig) -> NestedLevels<K> {
        let levels = config.height + 1;
        return NestedLevels {
            arena: Arena::new(levels),
            config,
            counts: vec![0; levels],
            len: 0,
            stats: RebuildStats::default(),
            warned_overflow: false,
        };
    }

    /// Index of the densest level.
    pub(super) fn bottom(&self) -> usize {
        return self.config.height;
    }

    pub(super) fn len(&self) -> usize {
        return self.len;
    }

    pub(super) fn count(&self, level: usize) -> usize {
        return self.counts[level];
    }

    pub(super) fn stats(&self) -> &RebuildStats {
        return &self.stats;
    }

    /// Rightmost node before `key` on every level. Nesting means the
    /// predecessor on level `i` is reachable from the one on level `i - 1`.
    pub(super) fn find_predecessors(&self, key: &K) -> Predecessors {
        let mut predecessors: Predecessors = smallvec![HEAD; self.bottom() + 1];
        let mut current = HEAD;
        for level in 0..=self.bottom() {
            current = self.arena.advance(current, level, key);
            predecessors[level] = current;
        }
        return predecessors;
    }

    /// The node holding `key` on the densest level, if any.
    pub(super) fn find(&self, predecessors: &Predecessors, key: &K) -> Option<Idx> {
        let bottom = self.bottom();
        let candidate = self.arena.next(predecessors[bottom], bottom);
        if self.arena.holds(candidate, key) {
            return Some(candidate);
        }
        return None;
    }

    /// Splice `key` into every level. Returns the new handle, or `None` if
    /// the key is already present.
    pub(super) fn insert(&mut self, key: K) -> Option<Idx> {
        let predecessors = self.find_predecessors(&key);
        if self.find(&predecessors, &key).is_some() {
            return None;
        }
        let new_idx = self.arena.alloc(key);
        for (level, &pred) in predecessors.iter().enumerate() {
            self.arena.link_after(pred, level, new_idx);
            self.counts[level] += 1;
        }
        self.len += 1;
        return Some(new_idx);
    }

    /// Remove `key`, letting the next key take over its slot on every level
    /// where the next key was not already linked. Returns the released
    /// handle, or `None` if the key was absent.
    pub(super) fn remove(&mut self, key: &K) -> Option<Idx> {
        let predecessors = self.find_predecessors(key);
        let target = self.find(&predecessors, key)?;
        let substitute = self.arena.next(target, self.bottom());

        for (level, &pred) in predecessors.iter().enumerate() {
            if self.arena.next(pred, level) != target {
                continue;
            }
            let after = self.arena.next(target, level);
            if substitute == NULL || after == substitute {
                self.arena.set_next(pred, level, after);
                self.counts[level] -= 1;
            } else {
                self.arena.set_next(pred, level, substitute);
                self.arena.set_next(substitute, level, after);
            }
        }

        self.arena.release(target);
        self.len -= 1;
        return Some(target);
    }

    /// Link a fresh node carrying a copy of a present key into `levels`,
    /// right after the given predecessors. Used for shallow aliases, which
    /// must be reconciled with [`NestedLevels::reconcile_alias`] before the
    /// next predecessor walk.
    pub(super) fn link_alias(
        &mut self,
        key: K,
        predecessors: &[Idx],
        levels: std::ops::Range<usize>,
    ) -> Idx {
        let alias = self.arena.alloc(key);
        for level in levels {
            self.arena.link_after(predecessors[level], level, alias);
            self.counts[level] += 1;
        }
        return alias;
    }

    /// Replace `alias` by `home` on every level in `levels` where the alias
    /// is still linked, then free the alias.
    pub(super) fn reconcile_alias(
        &mut self,
        alias: Idx,
        home: Idx,
        levels: std::ops::Range<usize>,
    ) {
        let mut relinked = 0;
        if let Some(key) = self.arena.key(home) {
            // Only the alias shares this key, and it never precedes it, so
            // the walk below sees a fully nested structure.
            let predecessors = self.find_predecessors(key);
            for level in levels {
                let pred = predecessors[level];
                if self.arena.next(pred, level) != alias {
                    continue;
                }
                let after = self.arena.next(alias, level);
                self.arena.set_next(pred, level, home);
                self.arena.set_next(home, level, after);
                relinked += 1;
            }
        }
        self.arena.release(alias);
        tracing::trace!(relinked, "reconciled alias");
    }

    /// Smallest level whose size is within `bound`, or the densest level.
    pub(super) fn special_index(&self, bound: impl Fn(usize) -> f64) -> usize {
        for level in 0..=self.bottom() {
            if self.counts[level] as f64 <= bound(level) {
                return level;
            }
        }
        return self.bottom();
    }

    /// Rebuild levels `special - 1` down to `0`. Level `i - 1` takes the
    /// nodes of level `i` that `keep` accepts, plus every `stride`-th node
    /// counted since the last node taken. The stride is chosen per level so
    /// that `L_{i-1}` ends within `floor(bound(i - 1))`; when the level
    /// below is within its own bound and `keep` accepts nothing, it is two.
    ///
    /// `keep` must accept at most `floor(bound(i - 1))` nodes of level `i`.
    pub(super) fn rebuild(
        &mut self,
        special: usize,
        bound: impl Fn(usize) -> f64,
        keep: impl Fn(Idx, usize) -> bool,
    ) {
        self.stats.last_special_index = Some(special);
        if special == 0 {
            return;
        }
        tracing::trace!(special, "partial rebuild");
        if self.counts[special] as f64 > bound(special) && !self.warned_overflow {
            self.warned_overflow = true;
            tracing::warn!(
                height = self.bottom(),
                len = self.len,
                "height too small for the set, density bound cannot hold"
            );
        }

        for level in (1..=special).rev() {
            let capacity = bound(level - 1).floor() as usize;
            let pinned = self.arena.walk(level).filter(|&idx| keep(idx, level)).count();
            debug_assert!(pinned <= capacity, "keep accepted more nodes than fit");
            let free = capacity.saturating_sub(pinned).saturating_add(1);
            let stride = (self.counts[level] / free + 1).max(2);

            let mut tail = HEAD;
            let mut since = 0;
            let mut kept = 0;
            let mut current = self.arena.next(HEAD, level);
            while current != NULL {
                since += 1;
                if keep(current, level) || since >= stride {
                    self.arena.set_next(tail, level - 1, current);
                    tail = current;
                    since = 0;
                    kept += 1;
                }
                current = self.arena.next(current, level);
                self.stats.relinked += 1;
            }
            self.arena.set_next(tail, level - 1, NULL);
            self.counts[level - 1] = kept;
        }
        self.stats.rebuilds += 1;
    }

    /// Panic unless the levels are sorted, nested, and match their counts.
    pub(super) fn check_invariants(&self) {
        let bottom = self.bottom();
        self.arena.assert_sorted(0..=bottom);
        for level in 0..bottom {
            self.arena.assert_nested(level, level + 1);
        }
        for level in 0..=bottom {
            let actual = self.arena.count(level);
            assert_eq!(
                actual, self.counts[level],
                "INVARIANT VIOLATED: level {} holds {} nodes but its count is {}",
                level, actual, self.counts[level]
            );
        }
        assert_eq!(
            self.counts[bottom], self.len,
            "INVARIANT VIOLATED: densest level holds {} keys but len()={}",
            self.counts[bottom], self.len
        );
        assert_eq!(
            self.arena.live(),
            self.len + 1,
            "INVARIANT VIOLATED: arena holds unreachable nodes"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(height: usize, epsilon: f64) -> NestedLevels<i32> {
        return NestedLevels::new(LeveledConfig::new(height, epsilon));
    }

    #[test]
    fn insert_links_every_level() {
        let mut nested = levels(3, 0.1);
        for key in [5, 1, 3] {
            assert!(nested.insert(key).is_some());
        }
        for level in 0..=3 {
            assert_eq!(nested.arena.keys(level), vec![&1, &3, &5]);
            assert_eq!(nested.count(level), 3);
        }
        assert!(nested.insert(3).is_none());
        nested.check_invariants();
    }

    #[test]
    fn remove_promotes_substitute() {
        let mut nested = levels(2, 0.1);
        for key in [1, 2, 3, 4] {
            nested.insert(key);
        }
        // Level 1 keeps 2 and 4, level 0 keeps 4.
        nested.rebuild(2, |_| 100.0, |_, _| false);
        assert_eq!(nested.arena.keys(1), vec![&2, &4]);
        assert_eq!(nested.arena.keys(0), vec![&4]);

        // 4 is the maximum, so it is simply unlinked.
        assert!(nested.remove(&4).is_some());
        assert_eq!(nested.arena.keys(0), Vec::<&i32>::new());
        assert_eq!(nested.arena.keys(1), vec![&2]);

        // 2's slot on level 1 passes to 3.
        assert!(nested.remove(&2).is_some());
        assert_eq!(nested.arena.keys(1), vec![&3]);
        assert_eq!(nested.arena.keys(2), vec![&1, &3]);
        assert!(nested.remove(&2).is_none());
        nested.check_invariants();
    }

    #[test]
    fn special_index_uses_counts() {
        let mut nested = levels(4, 0.1);
        assert_eq!(nested.special_index(|i| 1.9f64.powi(i as i32)), 0);
        for key in 0..5 {
            nested.insert(key);
        }
        // 5 > 1, 5 > 1.9, 5 > 3.61, 5 <= 6.859
        assert_eq!(nested.special_index(|i| 1.9f64.powi(i as i32)), 3);
    }

    #[test]
    fn overflowing_rebuild_widens_first_stride() {
        let mut nested = levels(3, 0.1);
        for key in 0..63 {
            nested.insert(key);
        }
        let bound = |i: usize| 1.9f64.powi(i as i32);
        let special = nested.special_index(bound);
        assert_eq!(special, 3);
        nested.rebuild(special, bound, |_, _| false);
        assert!(nested.count(2) as f64 <= bound(2));
        assert!(nested.count(1) as f64 <= bound(1));
        assert!(nested.count(0) <= 1);
        nested.check_invariants();
    }

    #[test]
    fn keep_predicate_retains_nodes() {
        let mut nested = levels(1, 0.5);
        let mut handles = Vec::new();
        for key in 0..6 {
            handles.push(nested.insert(key).unwrap());
        }
        let first = handles[0];
        nested.rebuild(1, |_| 100.0, |idx, _| idx == first);
        // 0 kept by the predicate, then every second node after it.
        assert_eq!(nested.arena.keys(0), vec![&0, &2, &4]);
        assert_eq!(nested.stats().rebuilds, 1);
        assert_eq!(nested.stats().relinked, 6);
    }

    #[test]
    fn kept_nodes_and_stride_share_capacity() {
        let mut nested = levels(1, 0.5);
        let mut handles = Vec::new();
        for key in 0..20 {
            handles.push(nested.insert(key).unwrap());
        }
        let pinned: Vec<Idx> = handles[..3].to_vec();
        // Capacity 4 with 3 pinned leaves room for one strided node.
        nested.rebuild(1, |i| [4.0, 100.0][i], |idx, _| pinned.contains(&idx));
        assert_eq!(nested.arena.keys(0), vec![&0, &1, &2, &13]);
        assert_eq!(nested.count(0), 4);
        nested.check_invariants();
    }

    #[test]
    fn alias_reconciles_into_home() {
        let mut nested = levels(2, 0.5);
        let home = nested.insert(7).unwrap();
        nested.insert(3);
        // Level 1 keeps only 7 and level 0 ends up empty.
        nested.rebuild(2, |_| 100.0, |_, _| false);
        assert_eq!(nested.arena.keys(1), vec![&7]);
        assert_eq!(nested.arena.keys(0), Vec::<&i32>::new());

        let predecessors = nested.find_predecessors(&7);
        let alias = nested.link_alias(7, &predecessors, 0..1);
        assert_eq!(nested.arena.keys(0), vec![&7]);
        nested.reconcile_alias(alias, home, 0..1);

        assert_eq!(nested.arena.next(HEAD, 0), home);
        nested.check_invariants();
    }
}
