//! # vdag-resolve
//!
//! Head and version resolution over a content-addressed version DAG.
//!
//! This crate provides:
//! - [`resolve_heads`]: reduce a set of head CIDs to the frontier that
//!   describes the same history, plus the common ancestor for a version budget
//! - [`resolve_versions`]: linearize the history into a deterministic
//!   newest-first sequence and paginate it
//! - [`Config`]: the store, limits and tie-breaker every resolution runs with
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vdag_merkle::{DagNode, MemoryNodeStore};
//! use vdag_resolve::{resolve_versions, Config};
//!
//! # tokio_test::block_on(async {
//! let store: Arc<MemoryNodeStore<String, u64>> = Arc::new(MemoryNodeStore::new());
//! let a = store.put(DagNode::version(vec![], "A".to_string(), Some(1))).unwrap();
//! let b = store.put(DagNode::version(vec![a], "B".to_string(), Some(2))).unwrap();
//!
//! let config = Config::builder(store)
//!     .tie_breaker(|x, y| x.meta.cmp(&y.meta))
//!     .build();
//!
//! let resolution = resolve_versions(config.as_ref(), &[b], None).await.unwrap();
//! let versions: Vec<&str> = resolution.versions.iter().map(|v| v.version.as_str()).collect();
//! assert_eq!(versions, ["B", "A"]);
//! assert!(resolution.next_cids.is_empty());
//! # });
//! ```

pub mod comparator;
pub mod config;
pub mod error;
pub mod frontier;
pub mod heads;
pub mod traverse;
pub mod versions;

use std::fmt::Debug;
use std::hash::Hash;
use vdag_merkle::Cid;

pub use comparator::compare;
pub use config::{Config, ConfigBuilder, StoreAdapter, TieBreakFn, TieBreaker};
pub use error::{ResolveError, Result};
pub use frontier::{Entry, Frontier};
pub use heads::{resolve_heads, ResolvedHeads};
pub use traverse::{traverse, NodeReader};
pub use versions::{resolve_versions, MemoizedReader, Resolution, ResolvedVersion};

/// Application payload stored on version nodes.
///
/// Versions are counted by value, so equal payloads on distinct nodes count
/// once.
pub trait VersionPayload: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> VersionPayload for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Ranking key attached to version nodes, opaque to the resolvers.
pub trait MetaPayload: Clone + Debug + Send + Sync + 'static {}

impl<T> MetaPayload for T where T: Clone + Debug + Send + Sync + 'static {}

/// Sort and deduplicate a set of CIDs.
///
/// Heads are a set: every entry point canonicalizes them so results never
/// depend on the order callers list them in.
pub fn canonicalize(cids: impl IntoIterator<Item = Cid>) -> Vec<Cid> {
    let mut cids: Vec<Cid> = cids.into_iter().collect();
    cids.sort_unstable();
    cids.dedup();
    cids
}
