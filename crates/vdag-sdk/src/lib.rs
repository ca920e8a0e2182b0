//! vdag SDK - immutable handles for multi-writer version histories
//!
//! Any number of writers append versions against the heads they last saw,
//! merge divergent branches when they meet, and later reconstruct one
//! deterministic ordering of the whole history, whichever replica does the
//! reconstruction.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use vdag_sdk::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let store: Arc<MemoryNodeStore<String, u64>> = Arc::new(MemoryNodeStore::new());
//! let config = Config::builder(store)
//!     .tie_breaker(|a, b| a.meta.cmp(&b.meta))
//!     .build();
//!
//! // Two writers branch off the same root
//! let root = VersionDag::create("A".to_string(), Some(1), config).await?;
//! let alice = root.add("B".to_string(), Some(2)).await?;
//! let bob = root.add("C".to_string(), Some(3)).await?;
//!
//! // Alice learns about Bob's head and merges it
//! let merged = alice.merge(bob.heads(), None).await?;
//!
//! let history = merged.resolve(ResolveOptions::new()).await?;
//! let versions: Vec<&str> = history.versions.iter().map(|v| v.version.as_str()).collect();
//! assert_eq!(versions, ["C", "B", "A"]);
//! # Ok::<(), ResolveError>(())
//! # }).unwrap();
//! ```
//!
//! # Architecture
//!
//! - [`dag`] - the [`VersionDag`] handle and its resolve options
//! - [`error`] - error and result types
//!
//! Resolution itself lives in `vdag-resolve`; the node model and storage
//! contract in `vdag-merkle`.

pub mod dag;
pub mod error;

pub use dag::{ResolveOptions, VersionDag};
pub use error::{ResolveError, Result, StoreError};

// Re-export the types needed to configure and read a handle
pub use vdag_merkle::{Cid, Concurrency, DagNode, MemoryNodeStore, NodeStore, StoreLimits};
pub use vdag_resolve::{Config, ConfigBuilder, Resolution, ResolvedVersion};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::dag::{ResolveOptions, VersionDag};
    pub use crate::error::ResolveError;
    pub use vdag_merkle::{Cid, Concurrency, DagNode, MemoryNodeStore, NodeStore};
    pub use vdag_resolve::{Config, Resolution};
}
