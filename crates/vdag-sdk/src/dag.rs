//! Immutable handles on a version DAG.

use crate::error::Result;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use vdag_merkle::{Cid, DagNode};
use vdag_resolve::{canonicalize, resolve_heads, resolve_versions, Config, MetaPayload, Resolution, VersionPayload};

/// Options for [`VersionDag::resolve`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Heads to resolve from instead of the handle's own, typically the
    /// `next_cids` of a previous page.
    pub from_cids: Option<Vec<Cid>>,
    /// Page size. `None` resolves the whole history.
    pub limit: Option<usize>,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cids(mut self, cids: Vec<Cid>) -> Self {
        self.from_cids = Some(cids);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A position in a version history: a canonical set of heads plus the
/// configuration used to read and write it.
///
/// Handles never change. `add` and `merge` write a node and return a new
/// handle on it; the old handle stays valid. Handles compare equal when their
/// heads do, whatever configuration they carry.
pub struct VersionDag<V, M> {
    heads: Vec<Cid>,
    config: Arc<Config<V, M>>,
}

impl<V: VersionPayload, M: MetaPayload> VersionDag<V, M> {
    /// A handle on `heads`, sorted and deduplicated.
    pub fn new(heads: impl IntoIterator<Item = Cid>, config: Arc<Config<V, M>>) -> Self {
        VersionDag {
            heads: canonicalize(heads),
            config,
        }
    }

    /// A handle on an empty history.
    pub fn empty(config: Arc<Config<V, M>>) -> Self {
        Self::new(Vec::new(), config)
    }

    /// A handle positioned on a known head.
    pub fn resume(cid: Cid, config: Arc<Config<V, M>>) -> Self {
        Self::new([cid], config)
    }

    /// Start a new history with `version` as its root.
    pub async fn create(version: V, meta: Option<M>, config: Arc<Config<V, M>>) -> Result<Self> {
        Self::empty(config).add(version, meta).await
    }

    pub fn heads(&self) -> &[Cid] {
        &self.heads
    }

    pub fn config(&self) -> &Arc<Config<V, M>> {
        &self.config
    }

    fn advance(&self, cid: Cid) -> Self {
        VersionDag {
            heads: vec![cid],
            config: Arc::clone(&self.config),
        }
    }

    /// Append a version on top of the current heads.
    pub async fn add(&self, version: V, meta: Option<M>) -> Result<Self> {
        let node = DagNode::version(self.heads.clone(), version, meta);
        let cid = self.config.write_node(&node).await?;

        debug!(cid = %cid.short(), parents = self.heads.len(), "added version");
        Ok(self.advance(cid))
    }

    /// Merge `other_heads` into this history.
    ///
    /// Heads that are ancestors of other heads are dropped first. If what is
    /// left is already this handle's head set, nothing is written and an
    /// equal handle is returned; otherwise a merge node is written on the
    /// remaining heads, carrying `version` if given.
    pub async fn merge(&self, other_heads: &[Cid], version: Option<V>) -> Result<Self> {
        let combined = canonicalize(self.heads.iter().chain(other_heads).copied());
        let resolved = resolve_heads(self.config.as_ref(), &combined, Some(1)).await?;

        if resolved.heads == self.heads {
            debug!(heads = self.heads.len(), "merge is a no-op");
            return Ok(self.clone());
        }

        let node = DagNode::merge(resolved.heads, version);
        let cid = self.config.write_node(&node).await?;

        debug!(cid = %cid.short(), parents = node.parent_count(), "merged heads");
        Ok(self.advance(cid))
    }

    /// A handle on this history's heads plus `other_heads`, without merging.
    pub fn union(&self, other_heads: &[Cid]) -> Self {
        Self::new(
            self.heads.iter().chain(other_heads).copied(),
            Arc::clone(&self.config),
        )
    }

    /// Linearize the history, newest first.
    pub async fn resolve(&self, options: ResolveOptions) -> Result<Resolution<V, M>> {
        let from = options.from_cids.as_deref().unwrap_or(&self.heads);
        resolve_versions(self.config.as_ref(), from, options.limit).await
    }
}

impl<V, M> Clone for VersionDag<V, M> {
    fn clone(&self) -> Self {
        VersionDag {
            heads: self.heads.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<V, M> PartialEq for VersionDag<V, M> {
    fn eq(&self, other: &Self) -> bool {
        self.heads == other.heads
    }
}

impl<V, M> Eq for VersionDag<V, M> {}

impl<V, M> fmt::Debug for VersionDag<V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionDag")
            .field("heads", &self.heads)
            .finish_non_exhaustive()
    }
}
