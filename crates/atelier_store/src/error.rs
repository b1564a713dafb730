//! Error types for document-store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
///
/// A missing document is not an error; reads and subscription deliveries
/// report it as [`crate::SnapshotEvent::Missing`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store rejected or failed a write (network, quota, backend fault).
    #[error("write rejected: {0}")]
    WriteRejected(String),

    /// The live-change channel could not be established.
    #[error("subscription failed: {0}")]
    SubscriptionFailed(String),

    /// The store is not reachable at all.
    #[error("store unavailable")]
    Unavailable,

    /// The caller lacks permission for the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}
