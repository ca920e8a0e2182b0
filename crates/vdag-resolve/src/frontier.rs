//! Traversal entries and the ordered frontier they wait in.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;
use vdag_merkle::{Cid, DagNode};

/// A node reached during traversal.
#[derive(Debug)]
pub struct Entry<V, M> {
    pub cid: Cid,
    pub node: Arc<DagNode<V, M>>,
    /// The entry whose parent list led here, `None` for start entries.
    pub child: Option<Cid>,
    /// The start id this branch descends from.
    pub origin: Cid,
}

impl<V, M> Entry<V, M> {
    /// A start entry, its own origin.
    pub fn start(cid: Cid, node: Arc<DagNode<V, M>>) -> Self {
        Entry {
            cid,
            node,
            child: None,
            origin: cid,
        }
    }

    /// An entry for a parent of `self`, inheriting its origin.
    pub fn parent(&self, cid: Cid, node: Arc<DagNode<V, M>>) -> Self {
        Entry {
            cid,
            node,
            child: Some(self.cid),
            origin: self.origin,
        }
    }

    /// Whether this entry is the start id it was seeded from.
    pub fn is_head(&self) -> bool {
        self.cid == self.origin
    }
}

impl<V, M> Clone for Entry<V, M> {
    fn clone(&self) -> Self {
        Entry {
            cid: self.cid,
            node: Arc::clone(&self.node),
            child: self.child,
            origin: self.origin,
        }
    }
}

/// Ordered work list of entries waiting to be visited.
///
/// The frontier has no ordering policy of its own; callers pick one per
/// traversal by choosing how entries are inserted.
#[derive(Debug)]
pub struct Frontier<V, M> {
    entries: VecDeque<Entry<V, M>>,
}

impl<V, M> Frontier<V, M> {
    pub fn new() -> Self {
        Frontier {
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<V, M>> {
        self.entries.iter()
    }

    pub fn push_back(&mut self, entry: Entry<V, M>) {
        self.entries.push_back(entry);
    }

    pub fn push_front(&mut self, entry: Entry<V, M>) {
        self.entries.push_front(entry);
    }

    pub fn pop_front(&mut self) -> Option<Entry<V, M>> {
        self.entries.pop_front()
    }

    /// Insert after every entry that `compare` does not rank after `entry`.
    ///
    /// Keeps the frontier sorted if it already was; equal entries stay in
    /// insertion order.
    pub fn insert_sorted<F>(&mut self, entry: Entry<V, M>, compare: F)
    where
        F: Fn(&Entry<V, M>, &Entry<V, M>) -> Ordering,
    {
        let index = self
            .entries
            .partition_point(|queued| compare(queued, &entry) != Ordering::Greater);
        self.entries.insert(index, entry);
    }

    /// True if every queued entry refers to `cid` (vacuously true when empty).
    pub fn all_match(&self, cid: &Cid) -> bool {
        self.entries.iter().all(|entry| entry.cid == *cid)
    }
}

impl<V, M> Default for Frontier<V, M> {
    fn default() -> Self {
        Self::new()
    }
}
