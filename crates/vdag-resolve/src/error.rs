//! Error types for head and version resolution.

use thiserror::Error;
use vdag_merkle::{Cid, ShapeError, StoreError};

/// Errors that abort a resolution, `add` or `merge`.
///
/// Store failures are surfaced with the store's own error as the source;
/// nothing is retried at this layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("failed to read node {}", .cid.short())]
    Read {
        cid: Cid,
        #[source]
        source: StoreError,
    },

    #[error("failed to write node")]
    Write {
        #[source]
        source: StoreError,
    },

    #[error("malformed node {}: {reason}", .cid.short())]
    MalformedNode {
        cid: Cid,
        #[source]
        reason: ShapeError,
    },
}

impl ResolveError {
    /// The underlying store error, if the failure came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            ResolveError::Read { source, .. } | ResolveError::Write { source } => Some(source),
            ResolveError::MalformedNode { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
