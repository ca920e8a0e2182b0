//! Generic frontier walk over the DAG.
//!
//! The walk carries no DAG semantics of its own: what happens on each visit
//! and where new entries land in the frontier is decided by the caller.

use crate::config::Config;
use crate::error::Result;
use crate::frontier::{Entry, Frontier};
use crate::{MetaPayload, VersionPayload};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::trace;
use vdag_merkle::{Cid, DagNode};

/// Source of nodes for a traversal.
#[async_trait]
pub trait NodeReader<V, M>: Send + Sync
where
    V: VersionPayload,
    M: MetaPayload,
{
    async fn read(&self, cid: &Cid) -> Result<Arc<DagNode<V, M>>>;
}

#[async_trait]
impl<V: VersionPayload, M: MetaPayload> NodeReader<V, M> for Config<V, M> {
    async fn read(&self, cid: &Cid) -> Result<Arc<DagNode<V, M>>> {
        self.read_node(cid).await.map(Arc::new)
    }
}

/// Fetch `cids` in parallel, keeping their order.
///
/// Concurrency is bounded by the reader (the store adapter's read limit).
async fn fetch_all<V, M, R>(reader: &R, cids: &[Cid]) -> Result<Vec<Arc<DagNode<V, M>>>>
where
    V: VersionPayload,
    M: MetaPayload,
    R: NodeReader<V, M> + ?Sized,
{
    try_join_all(cids.iter().map(|cid| reader.read(cid))).await
}

/// Walk the DAG from `start` until the frontier is exhausted or `on_visit`
/// breaks.
///
/// Entries are dequeued one at a time. After a visit the entry's parents are
/// fetched in parallel and handed to `on_enqueue` in parent order, so the
/// frontier never depends on which read finished first. Parents of one entry
/// are all fetched before the next entry is dequeued.
pub async fn traverse<V, M, R, F, E>(reader: &R, start: &[Cid], mut on_visit: F, mut on_enqueue: E) -> Result<()>
where
    V: VersionPayload,
    M: MetaPayload,
    R: NodeReader<V, M> + ?Sized,
    F: FnMut(&Entry<V, M>, &Frontier<V, M>) -> ControlFlow<()>,
    E: FnMut(&mut Frontier<V, M>, Entry<V, M>),
{
    let mut frontier = Frontier::new();

    let nodes = fetch_all(reader, start).await?;
    for (cid, node) in start.iter().zip(nodes) {
        on_enqueue(&mut frontier, Entry::start(*cid, node));
    }

    while let Some(entry) = frontier.pop_front() {
        trace!(cid = %entry.cid.short(), queued = frontier.len(), "visit");

        if on_visit(&entry, &frontier).is_break() {
            trace!(cid = %entry.cid.short(), "traversal stopped");
            break;
        }

        let nodes = fetch_all(reader, &entry.node.parents).await?;
        for (cid, node) in entry.node.parents.iter().zip(nodes) {
            on_enqueue(&mut frontier, entry.parent(*cid, node));
        }
    }

    Ok(())
}
