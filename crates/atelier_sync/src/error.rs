//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur when opening a collection.
///
/// These are the only synchronous errors in the crate. Once a handle
/// exists, its mutate/read path never fails; write and subscription
/// failures are logged and counted instead (see [`crate::SyncStats`]).
#[derive(Debug, Error)]
pub enum SyncError {
    /// The collection key was empty.
    #[error("collection key must not be empty")]
    EmptyKey,

    /// The key is already registered with a different value type.
    #[error("collection {key:?} is already open with a different value type")]
    TypeMismatch {
        /// The disputed key.
        key: String,
    },
}
