//! Error types for handle operations.
//!
//! Every failure comes from the resolver layer: a store read or write, or a
//! malformed node. The underlying [`StoreError`] is kept as the source.

pub use vdag_merkle::StoreError;
pub use vdag_resolve::ResolveError;

/// Result type for handle operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
