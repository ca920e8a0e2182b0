//! Concurrent head detection and common-ancestor search.

use crate::canonicalize;
use crate::error::Result;
use crate::frontier::{Entry, Frontier};
use crate::traverse::{traverse, NodeReader};
use crate::{MetaPayload, VersionPayload};
use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use tracing::{debug, trace};
use vdag_merkle::Cid;

/// Outcome of [`resolve_heads`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedHeads {
    /// Nearest point where every branch converges, `None` for disjoint
    /// histories.
    pub ancestor: Option<Cid>,
    /// The input heads that are not ancestors of another input head, sorted.
    pub heads: Vec<Cid>,
    /// Distinct versions seen before the traversal stopped.
    pub versions_count: usize,
}

/// Reduce `head_cids` to the concurrent heads and find their common ancestor.
///
/// The walk is breadth-first from every head at once. Once no branch has
/// pending parents left to reach and the whole frontier has collapsed onto a
/// single id, that id is a common ancestor. The walk keeps going to older
/// ancestors until at least `limit` distinct versions have been seen; with no
/// limit it runs to the roots and reports the oldest convergence point.
pub async fn resolve_heads<V, M, R>(reader: &R, head_cids: &[Cid], limit: Option<usize>) -> Result<ResolvedHeads>
where
    V: VersionPayload,
    M: MetaPayload,
    R: NodeReader<V, M> + ?Sized,
{
    let heads = canonicalize(head_cids.iter().copied());
    debug!(heads = heads.len(), ?limit, "resolving heads");

    let mut ancestor = None;
    let mut ancestors: HashMap<Cid, HashSet<Cid>> = heads.iter().map(|cid| (*cid, HashSet::new())).collect();
    let mut mandatory: HashSet<Cid> = HashSet::new();
    let mut versions: HashSet<V> = HashSet::new();

    traverse(
        reader,
        &heads,
        |entry: &Entry<V, M>, frontier: &Frontier<V, M>| {
            if let Some(version) = &entry.node.version {
                versions.insert(version.clone());
            }

            if entry.is_head() {
                mandatory.extend(entry.node.parents.iter().copied());
                return ControlFlow::Continue(());
            }

            ancestors.entry(entry.origin).or_default().insert(entry.cid);
            mandatory.remove(&entry.cid);

            if mandatory.is_empty() && frontier.all_match(&entry.cid) {
                trace!(cid = %entry.cid.short(), versions = versions.len(), "common ancestor candidate");
                ancestor = Some(entry.cid);

                if limit.is_some_and(|limit| versions.len() >= limit) {
                    return ControlFlow::Break(());
                }
            }

            ControlFlow::Continue(())
        },
        Frontier::push_back,
    )
    .await?;

    let concurrent: Vec<Cid> = heads
        .iter()
        .filter(|head| {
            !ancestors
                .iter()
                .any(|(origin, seen)| origin != *head && seen.contains(*head))
        })
        .copied()
        .collect();

    debug!(
        heads = concurrent.len(),
        ancestor = ?ancestor.map(|cid| cid.short()),
        versions = versions.len(),
        "resolved heads"
    );

    Ok(ResolvedHeads {
        ancestor,
        heads: concurrent,
        versions_count: versions.len(),
    })
}
