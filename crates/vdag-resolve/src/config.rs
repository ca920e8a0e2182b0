//! Resolver configuration and the concurrency-limited store adapter.
//!
//! A [`Config`] is built once by [`ConfigBuilder`] and shared through `Arc`
//! by every handle derived from it. Its [`StoreAdapter`] owns the admission
//! queues, so all calls against one configuration share the same limits.

use crate::error::{ResolveError, Result};
use crate::{MetaPayload, VersionPayload};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::warn;
use vdag_merkle::{Cid, Concurrency, DagNode, NodeStore, StoreError, StoreLimits};

/// Application ordering over two version nodes, in ascending sense.
///
/// Only consulted when both nodes carry `meta`.
pub type TieBreakFn<V, M> = dyn Fn(&DagNode<V, M>, &DagNode<V, M>) -> Ordering + Send + Sync;

/// Shared tie-breaker.
pub type TieBreaker<V, M> = Arc<TieBreakFn<V, M>>;

/// Wraps a [`NodeStore`] with per-operation concurrency limits.
///
/// Calls beyond a bounded limit wait for a permit in FIFO order. Nodes read
/// back are validated before they are returned.
pub struct StoreAdapter<V, M> {
    store: Arc<dyn NodeStore<V, M>>,
    limits: StoreLimits,
    read_permits: Option<Semaphore>,
    write_permits: Option<Semaphore>,
}

impl<V: VersionPayload, M: MetaPayload> StoreAdapter<V, M> {
    pub fn new(store: Arc<dyn NodeStore<V, M>>, limits: StoreLimits) -> Self {
        StoreAdapter {
            store,
            read_permits: limits.read_concurrency.limit().map(Semaphore::new),
            write_permits: limits.write_concurrency.limit().map(Semaphore::new),
            limits,
        }
    }

    pub fn limits(&self) -> &StoreLimits {
        &self.limits
    }

    /// Read and validate the node stored under `cid`.
    pub async fn read_node(&self, cid: &Cid) -> Result<DagNode<V, M>> {
        let _permit = match &self.read_permits {
            Some(permits) => Some(permits.acquire().await.map_err(|_| ResolveError::Read {
                cid: *cid,
                source: StoreError::Unavailable("read queue closed".to_string()),
            })?),
            None => None,
        };

        let node = self
            .store
            .read_node(cid, &self.limits)
            .await
            .map_err(|source| {
                warn!(cid = %cid.short(), error = %source, "store read failed");
                ResolveError::Read { cid: *cid, source }
            })?;

        node.validate(cid)
            .map_err(|reason| ResolveError::MalformedNode { cid: *cid, reason })?;

        Ok(node)
    }

    /// Write `node`, returning the CID the store assigned.
    pub async fn write_node(&self, node: &DagNode<V, M>) -> Result<Cid> {
        let _permit = match &self.write_permits {
            Some(permits) => Some(permits.acquire().await.map_err(|_| ResolveError::Write {
                source: StoreError::Unavailable("write queue closed".to_string()),
            })?),
            None => None,
        };

        self.store.write_node(node, &self.limits).await.map_err(|source| {
            warn!(error = %source, "store write failed");
            ResolveError::Write { source }
        })
    }
}

/// Fully formed resolver configuration.
pub struct Config<V, M> {
    adapter: StoreAdapter<V, M>,
    tie_breaker: TieBreaker<V, M>,
}

impl<V: VersionPayload, M: MetaPayload> Config<V, M> {
    /// Start building a configuration over `store`.
    pub fn builder<S: NodeStore<V, M>>(store: Arc<S>) -> ConfigBuilder<V, M> {
        ConfigBuilder::new(store)
    }

    pub fn limits(&self) -> &StoreLimits {
        self.adapter.limits()
    }

    pub fn tie_breaker(&self) -> &TieBreakFn<V, M> {
        self.tie_breaker.as_ref()
    }

    pub async fn read_node(&self, cid: &Cid) -> Result<DagNode<V, M>> {
        self.adapter.read_node(cid).await
    }

    pub async fn write_node(&self, node: &DagNode<V, M>) -> Result<Cid> {
        self.adapter.write_node(node).await
    }
}

impl<V, M> fmt::Debug for Config<V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("limits", &self.adapter.limits)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Config`].
pub struct ConfigBuilder<V, M> {
    store: Arc<dyn NodeStore<V, M>>,
    tie_breaker: Option<TieBreaker<V, M>>,
    limits: StoreLimits,
}

impl<V: VersionPayload, M: MetaPayload> ConfigBuilder<V, M> {
    pub fn new<S: NodeStore<V, M>>(store: Arc<S>) -> Self {
        ConfigBuilder {
            store: store as Arc<dyn NodeStore<V, M>>,
            tie_breaker: None,
            limits: StoreLimits::default(),
        }
    }

    /// Set the ordering used between concurrent versions that carry `meta`.
    pub fn tie_breaker<F>(mut self, tie_breaker: F) -> Self
    where
        F: Fn(&DagNode<V, M>, &DagNode<V, M>) -> Ordering + Send + Sync + 'static,
    {
        let tie_breaker: TieBreaker<V, M> = Arc::new(tie_breaker);
        self.tie_breaker = Some(tie_breaker);
        self
    }

    pub fn read_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.limits.read_concurrency = concurrency;
        self
    }

    pub fn write_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.limits.write_concurrency = concurrency;
        self
    }

    /// Advisory: forwarded to the store, not enforced.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.limits.read_timeout = Some(timeout);
        self
    }

    /// Advisory: forwarded to the store, not enforced.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.limits.write_timeout = Some(timeout);
        self
    }

    /// Build the shared configuration.
    ///
    /// Without a tie-breaker every pair of concurrent versions compares equal
    /// and CID order decides.
    pub fn build(self) -> Arc<Config<V, M>> {
        let tie_breaker: TieBreaker<V, M> = match self.tie_breaker {
            Some(tie_breaker) => tie_breaker,
            None => Arc::new(|_: &DagNode<V, M>, _: &DagNode<V, M>| Ordering::Equal),
        };

        Arc::new(Config {
            adapter: StoreAdapter::new(self.store, self.limits),
            tie_breaker,
        })
    }
}
