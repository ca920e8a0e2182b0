//! # vdag-merkle
//!
//! Content-addressed node model for the version DAG.
//!
//! This crate provides:
//! - [`Cid`], the SHA-256 content identifier of a node
//! - [`DagNode`], a version node or a merge node with its parent links
//! - [`NodeStore`], the async storage contract the resolvers consume
//! - [`MemoryNodeStore`], an in-memory store for tests and simulations
//!
//! ## Example
//!
//! ```rust
//! use vdag_merkle::{DagNode, MemoryNodeStore, NodeBuilder};
//!
//! let store: MemoryNodeStore<String, u64> = MemoryNodeStore::new();
//!
//! // The root version of a history
//! let root = NodeBuilder::new()
//!     .with_version("A".to_string())
//!     .with_meta(1)
//!     .build();
//! let root_cid = store.put(root).unwrap();
//!
//! // Two concurrent versions on top of it
//! let b = store.put(DagNode::version(vec![root_cid], "B".to_string(), Some(2))).unwrap();
//! let c = store.put(DagNode::version(vec![root_cid], "C".to_string(), Some(3))).unwrap();
//!
//! // A merge node joining them
//! let mut parents = vec![b, c];
//! parents.sort();
//! let merge = store.put(DagNode::merge(parents, None)).unwrap();
//!
//! assert_eq!(store.len(), 4);
//! assert!(store.get(&merge).unwrap().is_merge());
//! ```

mod hash;
mod node;
mod store;

pub use hash::{Cid, Hasher};
pub use node::{DagNode, NodeBuilder, ShapeError};
pub use store::{Concurrency, MemoryNodeStore, NodeStore, StoreError, StoreLimits};
