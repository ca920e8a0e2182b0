//! Priority order over traversal entries.
//!
//! The same order drives the linearization frontier and, through it, the
//! final version order. `Ordering::Less` means the first entry is visited
//! (and emitted) first.

use crate::config::TieBreakFn;
use crate::frontier::Entry;
use std::cmp::Ordering;
use vdag_merkle::Cid;

/// Compare two entries by priority.
///
/// 1. Same id: equal.
/// 2. Exactly one node without `meta`: that one first.
/// 3. Neither has `meta`: larger id first.
/// 4. Both have `meta`: the tie-breaker, inverted, so the version it ranks
///    highest comes first; ties fall back to rule 3.
pub fn compare<V, M>(tie_breaker: &TieBreakFn<V, M>, a: &Entry<V, M>, b: &Entry<V, M>) -> Ordering {
    if a.cid == b.cid {
        return Ordering::Equal;
    }

    match (a.node.has_meta(), b.node.has_meta()) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (false, false) => compare_cids(&a.cid, &b.cid),
        (true, true) => tie_breaker(&a.node, &b.node)
            .reverse()
            .then_with(|| compare_cids(&a.cid, &b.cid)),
    }
}

/// Larger CIDs rank first.
fn compare_cids(a: &Cid, b: &Cid) -> Ordering {
    b.cmp(a)
}
