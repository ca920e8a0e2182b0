//! Deterministic linearization of concurrent versions, with pagination.

use crate::comparator::compare;
use crate::config::{Config, TieBreakFn};
use crate::error::Result;
use crate::frontier::{Entry, Frontier};
use crate::heads::resolve_heads;
use crate::traverse::{traverse, NodeReader};
use crate::{MetaPayload, VersionPayload};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::debug;
use vdag_merkle::{Cid, DagNode};

/// One emitted version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedVersion<V, M> {
    pub version: V,
    pub meta: Option<M>,
}

/// One page of the linearized history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution<V, M> {
    /// Newest first.
    pub versions: Vec<ResolvedVersion<V, M>>,
    /// Heads to resolve from for the next page, empty on the last one.
    pub next_cids: Vec<Cid>,
}

type PendingRead<'a, V, M> = Shared<BoxFuture<'a, Result<Arc<DagNode<V, M>>>>>;

/// Reader that fetches each id at most once.
///
/// Concurrent reads of an id share one in-flight request; failures are
/// cached as well. Meant to live for a single resolution.
pub struct MemoizedReader<'a, V, M, R: ?Sized> {
    inner: &'a R,
    cache: Mutex<HashMap<Cid, PendingRead<'a, V, M>>>,
}

impl<'a, V, M, R> MemoizedReader<'a, V, M, R>
where
    V: VersionPayload,
    M: MetaPayload,
    R: NodeReader<V, M> + ?Sized,
{
    pub fn new(inner: &'a R) -> Self {
        MemoizedReader {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct ids requested so far.
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}

#[async_trait]
impl<'a, V, M, R> NodeReader<V, M> for MemoizedReader<'a, V, M, R>
where
    V: VersionPayload,
    M: MetaPayload,
    R: NodeReader<V, M> + ?Sized,
{
    async fn read(&self, cid: &Cid) -> Result<Arc<DagNode<V, M>>> {
        let pending = {
            let mut cache = self.cache.lock();
            cache
                .entry(*cid)
                .or_insert_with(|| {
                    let inner = self.inner;
                    let cid = *cid;
                    async move { inner.read(&cid).await }.boxed().shared()
                })
                .clone()
        };

        pending.await
    }
}

/// Resolve the history behind `head_cids` into a newest-first sequence.
///
/// Heads are canonicalized by the head resolver first. Every node reachable
/// from them is then read once, and nodes are emitted in priority order as
/// soon as all of their reachable children have been emitted: pure merge
/// nodes first, the rest by [`compare`]. A version therefore always precedes
/// its ancestors, and the order does not depend on read timing.
///
/// With a `limit`, the first `limit` versions are returned and the ids of
/// the remaining ones become `next_cids`. The history behind `next_cids` is
/// exactly the part not yet emitted, so resolving from it continues the same
/// sequence.
pub async fn resolve_versions<V, M>(
    config: &Config<V, M>,
    head_cids: &[Cid],
    limit: Option<usize>,
) -> Result<Resolution<V, M>>
where
    V: VersionPayload,
    M: MetaPayload,
{
    let reader = MemoizedReader::new(config);

    let resolved = resolve_heads(&reader, head_cids, limit).await?;
    let sequence = linearize(config, &reader, &resolved.heads).await?;
    let resolution = paginate(sequence, limit);

    debug!(
        ancestor = ?resolved.ancestor.map(|cid| cid.short()),
        versions = resolution.versions.len(),
        next = resolution.next_cids.len(),
        reads = reader.cached(),
        "resolved versions"
    );

    Ok(resolution)
}

/// Pure merges rank ahead of everything else, the rest by [`compare`].
fn priority<V, M>(tie_breaker: &TieBreakFn<V, M>, a: &Entry<V, M>, b: &Entry<V, M>) -> Ordering {
    match (a.node.is_merge(), b.node.is_merge()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => compare(tie_breaker, a, b),
    }
}

/// Version entries reachable from `heads`, in emission order.
async fn linearize<V, M, R>(config: &Config<V, M>, reader: &R, heads: &[Cid]) -> Result<Vec<Entry<V, M>>>
where
    V: VersionPayload,
    M: MetaPayload,
    R: NodeReader<V, M> + ?Sized,
{
    // Every reachable node, and how many parent links point at it.
    let mut entries: HashMap<Cid, Entry<V, M>> = HashMap::new();
    let mut pending: HashMap<Cid, usize> = HashMap::new();

    traverse(
        reader,
        heads,
        |_, _| ControlFlow::Continue(()),
        |frontier: &mut Frontier<V, M>, entry: Entry<V, M>| {
            if entry.child.is_some() {
                *pending.entry(entry.cid).or_insert(0) += 1;
            }
            if !entries.contains_key(&entry.cid) {
                entries.insert(entry.cid, entry.clone());
                frontier.push_back(entry);
            }
        },
    )
    .await?;

    let tie_breaker = config.tie_breaker();
    let by_priority = |a: &Entry<V, M>, b: &Entry<V, M>| priority(tie_breaker, a, b);

    let mut ready = Frontier::new();
    for head in heads {
        if pending.contains_key(head) {
            continue;
        }
        if let Some(entry) = entries.get(head) {
            ready.insert_sorted(entry.clone(), by_priority);
        }
    }

    let mut sequence = Vec::new();
    while let Some(entry) = ready.pop_front() {
        for parent in &entry.node.parents {
            let Some(count) = pending.get_mut(parent) else {
                continue;
            };
            *count -= 1;
            if *count > 0 {
                continue;
            }
            if let Some(reached) = entries.get(parent) {
                ready.insert_sorted(entry.parent(*parent, Arc::clone(&reached.node)), by_priority);
            }
        }

        if !entry.node.is_merge() {
            sequence.push(entry);
        }
    }

    Ok(sequence)
}

fn paginate<V: Clone, M: Clone>(sequence: Vec<Entry<V, M>>, limit: Option<usize>) -> Resolution<V, M> {
    let split = limit.map_or(sequence.len(), |limit| limit.min(sequence.len()));
    let (page, rest) = sequence.split_at(split);

    let versions = page
        .iter()
        .filter_map(|entry| {
            entry.node.version.clone().map(|version| ResolvedVersion {
                version,
                meta: entry.node.meta.clone(),
            })
        })
        .collect();

    Resolution {
        versions,
        next_cids: rest.iter().map(|entry| entry.cid).collect(),
    }
}
