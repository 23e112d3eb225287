//! Index-addressed node storage.
//!
//! Every structure in this crate keeps its nodes in an `Arena` and links them
//! by `u32` handle instead of by pointer. A rebuild rewires handles in bulk
//! without ever holding a reference into the node table, and deleted slots go
//! on a free list for reuse.
//!
//! ```text
//! handle:   0 (HEAD)    1       2       3
//! key:      None        Some(7) Some(3) Some(9)
//! next[0]:  2  ------>  3       1       NULL
//! ```
//!
//! The head sentinel always lives at handle 0. Its key is `None`, which
//! orders before every real key.

use std::fmt;
use std::fmt::Write;

use smallvec::SmallVec;
use smallvec::smallvec;

/// Node handle. u32 saves space vs usize on 64-bit.
pub type Idx = u32;

/// Null handle marker.
pub const NULL: Idx = Idx::MAX;

/// Handle of the head sentinel.
pub const HEAD: Idx = 0;

/// Links stored inline before spilling to the heap. Covers sets of around a
/// million keys at the default epsilon.
const INLINE_LEVELS: usize = 24;

/// Per-node successor links, one per level.
pub type Links = SmallVec<[Idx; INLINE_LEVELS]>;

struct Node<K> {
    /// `None` only for the head sentinel and for free slots.
    key: Option<K>,
    /// Successor at each level.
    next: Links,
}

/// A growable node table with a free list.
pub struct Arena<K> {
    nodes: Vec<Node<K>>,
    /// Released slots, reused before the table grows.
    free_list: Vec<Idx>,
    /// Number of links every node carries.
    levels: usize,
}

impl<K> Arena<K> {
    /// Create an arena whose nodes carry `levels` links. The head sentinel is
    /// allocated immediately with every link null.
    pub fn new(levels: usize) -> Arena<K> {
        let head = Node {
            key: None,
            next: smallvec![NULL; levels],
        };
        return Arena {
            nodes: vec![head],
            free_list: Vec::new(),
            levels,
        };
    }

    /// Number of links per node.
    pub fn levels(&self) -> usize {
        return self.levels;
    }

    /// Number of live nodes, the head included.
    pub fn live(&self) -> usize {
        return self.nodes.len() - self.free_list.len();
    }

    // --- Node access helpers ---

    fn node(&self, idx: Idx) -> &Node<K> {
        return &self.nodes[idx as usize];
    }

    fn node_mut(&mut self, idx: Idx) -> &mut Node<K> {
        return &mut self.nodes[idx as usize];
    }

    /// Allocate a node holding `key` with every link null.
    pub fn alloc(&mut self, key: K) -> Idx {
        if let Some(idx) = self.free_list.pop() {
            let node = self.node_mut(idx);
            node.key = Some(key);
            node.next.iter_mut().for_each(|link| *link = NULL);
            return idx;
        }
        let idx = self.nodes.len() as Idx;
        debug_assert!(idx != NULL, "arena exhausted");
        self.nodes.push(Node {
            key: Some(key),
            next: smallvec![NULL; self.levels],
        });
        return idx;
    }

    /// Return a node's slot to the free list, handing back its key.
    /// The caller must already have unlinked it from every level.
    pub fn release(&mut self, idx: Idx) -> Option<K> {
        debug_assert!(idx != HEAD, "the head sentinel is never released");
        let key = self.node_mut(idx).key.take();
        self.free_list.push(idx);
        return key;
    }

    /// Key of a node. `None` for the head sentinel.
    pub fn key(&self, idx: Idx) -> Option<&K> {
        return self.node(idx).key.as_ref();
    }

    pub fn next(&self, idx: Idx, level: usize) -> Idx {
        return self.node(idx).next[level];
    }

    pub fn set_next(&mut self, idx: Idx, level: usize, to: Idx) {
        self.node_mut(idx).next[level] = to;
    }

    /// Splice `new` in right after `pred` on `level`.
    pub fn link_after(&mut self, pred: Idx, level: usize, new: Idx) {
        let old = self.next(pred, level);
        self.set_next(new, level, old);
        self.set_next(pred, level, new);
    }

    /// Iterate the handles on `level`, sentinel excluded.
    pub fn walk(&self, level: usize) -> LevelWalk<'_, K> {
        return LevelWalk {
            arena: self,
            level,
            current: self.next(HEAD, level),
        };
    }

    /// Count the nodes on `level` by walking it.
    pub fn count(&self, level: usize) -> usize {
        return self.walk(level).count();
    }

    /// Keys on `level`, in list order.
    pub fn keys(&self, level: usize) -> Vec<&K> {
        return self.walk(level).filter_map(|idx| self.key(idx)).collect();
    }
}

impl<K: Ord> Arena<K> {
    /// Whether `idx` is a real node whose key sorts strictly before `key`.
    pub fn precedes(&self, idx: Idx, key: &K) -> bool {
        if idx == NULL {
            return false;
        }
        return match self.key(idx) {
            Some(k) => k < key,
            None => true,
        };
    }

    /// Whether `idx` is a real node holding exactly `key`.
    pub fn holds(&self, idx: Idx, key: &K) -> bool {
        if idx == NULL {
            return false;
        }
        return self.key(idx) == Some(key);
    }

    /// Advance along `level` from `start` to the rightmost node whose key is
    /// strictly less than `key`.
    pub fn advance(&self, start: Idx, level: usize, key: &K) -> Idx {
        let mut current = start;
        loop {
            let next = self.next(current, level);
            if !self.precedes(next, key) {
                return current;
            }
            current = next;
        }
    }

    /// Panic unless every listed level is strictly increasing.
    pub fn assert_sorted(&self, levels: impl Iterator<Item = usize>) {
        for level in levels {
            let keys = self.keys(level);
            for pair in keys.windows(2) {
                assert!(
                    pair[0] < pair[1],
                    "INVARIANT VIOLATED: level {} is not strictly increasing",
                    level
                );
            }
        }
    }

    /// Panic unless every key on `sparse` also appears on `dense`. Both
    /// levels must already be sorted.
    pub fn assert_nested(&self, sparse: usize, dense: usize) {
        let dense_keys = self.keys(dense);
        let mut i = 0;
        for key in self.keys(sparse) {
            while i < dense_keys.len() && dense_keys[i] < key {
                i += 1;
            }
            assert!(
                i < dense_keys.len() && dense_keys[i] == key,
                "INVARIANT VIOLATED: level {} holds a key missing from level {}",
                sparse,
                dense
            );
        }
    }
}

impl<K: fmt::Debug> Arena<K> {
    /// Render the given levels, one line each, as
    /// `Level i (count: n): k1 -> k2 -> None`.
    pub fn describe(&self, title: &str, levels: impl Iterator<Item = usize>) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{}:", title);
        for level in levels {
            let keys = self.keys(level);
            let _ = write!(output, "Level {} (count: {}): ", level, keys.len());
            for key in keys {
                let _ = write!(output, "{:?} -> ", key);
            }
            let _ = writeln!(output, "None");
        }
        return output;
    }
}

/// Iterator over the handles on one level.
pub struct LevelWalk<'a, K> {
    arena: &'a Arena<K>,
    level: usize,
    current: Idx,
}

impl<'a, K> Iterator for LevelWalk<'a, K> {
    type Item = Idx;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == NULL {
            return None;
        }
        let idx = self.current;
        self.current = self.arena.next(idx, self.level);
        return Some(idx);
    }
}
