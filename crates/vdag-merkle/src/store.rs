//! Node storage contract and an in-memory implementation.
//!
//! Stores are external collaborators of the resolvers: they own persistence,
//! serialization and content addressing. The resolvers only ever call
//! [`NodeStore::read_node`] and [`NodeStore::write_node`].

use crate::hash::Cid;
use crate::node::DagNode;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a node store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("node not found: {}", .0.short())]
    NotFound(Cid),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// How many calls of one kind may be in flight at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Concurrency {
    #[default]
    Unbounded,
    Bounded(NonZeroUsize),
}

impl Concurrency {
    /// A bounded limit. A limit of 0 is treated as 1.
    pub fn bounded(limit: usize) -> Self {
        Concurrency::Bounded(NonZeroUsize::MIN.saturating_add(limit.saturating_sub(1)))
    }

    /// The numeric limit, `None` when unbounded.
    pub fn limit(&self) -> Option<usize> {
        match self {
            Concurrency::Unbounded => None,
            Concurrency::Bounded(n) => Some(n.get()),
        }
    }
}

/// Access limits handed to the store on every call.
///
/// Timeouts are advisory: they are forwarded so a store can honor them,
/// nothing upstream enforces them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreLimits {
    pub read_concurrency: Concurrency,
    pub write_concurrency: Concurrency,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

/// Content-addressed node storage.
///
/// `write_node` must be deterministic: identical node content yields
/// identical CIDs. Failures are never retried by callers.
#[async_trait]
pub trait NodeStore<V, M>: Send + Sync + 'static
where
    V: Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    /// Fetch the node stored under `cid`.
    async fn read_node(&self, cid: &Cid, limits: &StoreLimits) -> Result<DagNode<V, M>, StoreError>;

    /// Persist `node`, returning its CID.
    async fn write_node(&self, node: &DagNode<V, M>, limits: &StoreLimits) -> Result<Cid, StoreError>;
}

/// In-memory implementation of [`NodeStore`].
///
/// CIDs are computed with [`DagNode::content_id`]. Read and write calls are
/// counted so tests can assert on I/O.
#[derive(Debug)]
pub struct MemoryNodeStore<V, M> {
    nodes: RwLock<HashMap<Cid, DagNode<V, M>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl<V, M> MemoryNodeStore<V, M> {
    pub fn new() -> Self {
        MemoryNodeStore {
            nodes: RwLock::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.nodes.read().contains_key(cid)
    }

    /// Number of `read_node` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `write_node` calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Store a node under an arbitrary CID, bypassing content addressing.
    ///
    /// Used to stage nodes that a well-behaved writer would never produce.
    pub fn put_unchecked(&self, cid: Cid, node: DagNode<V, M>) {
        self.nodes.write().insert(cid, node);
    }
}

impl<V: Clone, M: Clone> MemoryNodeStore<V, M> {
    pub fn get(&self, cid: &Cid) -> Option<DagNode<V, M>> {
        self.nodes.read().get(cid).cloned()
    }
}

impl<V: Serialize, M: Serialize> MemoryNodeStore<V, M> {
    /// Store a node synchronously, returning its CID.
    pub fn put(&self, node: DagNode<V, M>) -> Result<Cid, StoreError> {
        let cid = node.content_id()?;
        self.nodes.write().entry(cid).or_insert(node);
        Ok(cid)
    }
}

impl<V, M> Default for MemoryNodeStore<V, M> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V, M> NodeStore<V, M> for MemoryNodeStore<V, M>
where
    V: Clone + Serialize + Send + Sync + 'static,
    M: Clone + Serialize + Send + Sync + 'static,
{
    async fn read_node(&self, cid: &Cid, _limits: &StoreLimits) -> Result<DagNode<V, M>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.get(cid).ok_or(StoreError::NotFound(*cid))
    }

    async fn write_node(&self, node: &DagNode<V, M>, _limits: &StoreLimits) -> Result<Cid, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.put(node.clone())
    }
}
