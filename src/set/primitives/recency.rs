//! Recency log of searched nodes.
//!
//! An intrusive doubly linked list over arena handles: the prev/next links
//! for node `i` live at index `i` of two parallel vectors, so membership,
//! unlink and move-to-tail are all O(1). The tail is the most recently
//! searched node.
//!
//! ```text
//! head (least recent)                        tail (most recent)
//!   17  <->  4  <->  250  <->  5
//! ```
//!
//! A node appears at most once. Touching a node already in the log moves it
//! to the tail, so a node's distance from the tail is its working-set number.

use super::arena::Idx;
use super::arena::NULL;

/// The doubly linked recency list `Q`.
pub struct RecencyLog {
    prev: Vec<Idx>,
    next: Vec<Idx>,
    /// Whether each handle is currently in the list.
    member: Vec<bool>,
    head: Idx,
    tail: Idx,
    len: usize,
}

impl RecencyLog {
    pub fn new() -> RecencyLog {
        return RecencyLog {
            prev: Vec::new(),
            next: Vec::new(),
            member: Vec::new(),
            head: NULL,
            tail: NULL,
            len: 0,
        };
    }

    pub fn len(&self) -> usize {
        return self.len;
    }

    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    pub fn contains(&self, idx: Idx) -> bool {
        return self.member.get(idx as usize).copied().unwrap_or(false);
    }

    fn ensure(&mut self, idx: Idx) {
        let needed = idx as usize + 1;
        if self.member.len() < needed {
            self.prev.resize(needed, NULL);
            self.next.resize(needed, NULL);
            self.member.resize(needed, false);
        }
    }

    /// Mark `idx` as the most recently used node.
    pub fn touch(&mut self, idx: Idx) {
        if self.tail == idx {
            return;
        }
        self.remove(idx);
        self.ensure(idx);

        let i = idx as usize;
        self.prev[i] = self.tail;
        self.next[i] = NULL;
        self.member[i] = true;
        if self.tail != NULL {
            self.next[self.tail as usize] = idx;
        } else {
            self.head = idx;
        }
        self.tail = idx;
        self.len += 1;
    }

    /// Drop `idx` from the log. No-op if it is not there.
    pub fn remove(&mut self, idx: Idx) {
        if !self.contains(idx) {
            return;
        }
        let i = idx as usize;
        let prev = self.prev[i];
        let next = self.next[i];

        if prev != NULL {
            self.next[prev as usize] = next;
        } else {
            self.head = next;
        }
        if next != NULL {
            self.prev[next as usize] = prev;
        } else {
            self.tail = prev;
        }

        self.prev[i] = NULL;
        self.next[i] = NULL;
        self.member[i] = false;
        self.len -= 1;
    }

    /// Iterate from the most recent node backwards.
    pub fn most_recent(&self) -> MostRecent<'_> {
        return MostRecent {
            log: self,
            current: self.tail,
        };
    }

    /// Distance of `idx` from the tail: 0 for the most recent node.
    pub fn rank(&self, idx: Idx) -> Option<usize> {
        if !self.contains(idx) {
            return None;
        }
        return self.most_recent().position(|entry| entry == idx);
    }
}

impl Default for RecencyLog {
    fn default() -> Self {
        return Self::new();
    }
}

/// Iterator from the tail of the log towards its head.
pub struct MostRecent<'a> {
    log: &'a RecencyLog,
    current: Idx,
}

impl<'a> Iterator for MostRecent<'a> {
    type Item = Idx;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == NULL {
            return None;
        }
        let idx = self.current;
        self.current = self.log.prev[idx as usize];
        return Some(idx);
    }
}
