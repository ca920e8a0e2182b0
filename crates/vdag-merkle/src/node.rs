//! DAG node definition and builder.
//!
//! Each node in the version DAG contains:
//! - References to parent nodes (causal predecessors)
//! - An optional version payload
//! - An optional ranking key (`meta`) used to order concurrent versions
//!
//! A node carrying neither payload nor meta is a pure merge node.

use crate::hash::{Cid, Hasher};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a node does not have a valid shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("node carries meta without a version")]
    MetaWithoutVersion,

    #[error("node lists itself as a parent")]
    SelfParent,
}

/// A node in the version DAG.
///
/// Nodes are immutable once written: their CID is derived from their content,
/// parents included, so a node can never reference a descendant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagNode<V, M> {
    /// CIDs of parent nodes. Empty only for a history root.
    pub parents: Vec<Cid>,

    /// The application payload, absent on merge nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<V>,

    /// Ranking key for concurrent siblings. Only valid alongside `version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<M>,
}

impl<V, M> DagNode<V, M> {
    /// A version node on top of `parents`.
    pub fn version(parents: Vec<Cid>, version: V, meta: Option<M>) -> Self {
        DagNode {
            parents,
            version: Some(version),
            meta,
        }
    }

    /// A merge node joining `parents`, optionally carrying a version.
    pub fn merge(parents: Vec<Cid>, version: Option<V>) -> Self {
        DagNode {
            parents,
            version,
            meta: None,
        }
    }

    /// Check if this node starts a history.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Check if this node is a pure merge/checkpoint node.
    pub fn is_merge(&self) -> bool {
        self.version.is_none()
    }

    pub fn has_meta(&self) -> bool {
        self.meta.is_some()
    }

    /// Check a direct parent link (not transitive ancestry).
    pub fn has_parent(&self, cid: &Cid) -> bool {
        self.parents.contains(cid)
    }

    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }

    /// Check that the node has one of the accepted shapes when stored under `cid`.
    pub fn validate(&self, cid: &Cid) -> Result<(), ShapeError> {
        if self.meta.is_some() && self.version.is_none() {
            return Err(ShapeError::MetaWithoutVersion);
        }
        if self.has_parent(cid) {
            return Err(ShapeError::SelfParent);
        }
        Ok(())
    }
}

impl<V: Serialize, M: Serialize> DagNode<V, M> {
    /// Compute the content identifier for this node.
    ///
    /// Parent order is part of the content: callers that want order-independent
    /// ids must canonicalize parents before building the node.
    pub fn content_id(&self) -> Result<Cid, serde_json::Error> {
        let mut hasher = Hasher::new();

        hasher.update(&(self.parents.len() as u64).to_le_bytes());
        for parent in &self.parents {
            hasher.update(parent.as_bytes());
        }

        hash_optional(&mut hasher, self.version.as_ref())?;
        hash_optional(&mut hasher, self.meta.as_ref())?;

        Ok(hasher.finalize())
    }
}

fn hash_optional<T: Serialize>(hasher: &mut Hasher, value: Option<&T>) -> Result<(), serde_json::Error> {
    match value {
        Some(value) => {
            let bytes = serde_json::to_vec(value)?;
            hasher.update(&[1]);
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        None => hasher.update(&[0]),
    }
    Ok(())
}

/// Builder for DAG nodes.
#[derive(Clone, Debug)]
pub struct NodeBuilder<V, M> {
    parents: Vec<Cid>,
    version: Option<V>,
    meta: Option<M>,
}

impl<V, M> NodeBuilder<V, M> {
    pub fn new() -> Self {
        NodeBuilder {
            parents: Vec::new(),
            version: None,
            meta: None,
        }
    }

    /// Set the parent nodes.
    pub fn with_parents(mut self, parents: Vec<Cid>) -> Self {
        self.parents = parents;
        self
    }

    pub fn with_version(mut self, version: V) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_meta(mut self, meta: M) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn build(self) -> DagNode<V, M> {
        DagNode {
            parents: self.parents,
            version: self.version,
            meta: self.meta,
        }
    }
}

impl<V, M> Default for NodeBuilder<V, M> {
    fn default() -> Self {
        Self::new()
    }
}
