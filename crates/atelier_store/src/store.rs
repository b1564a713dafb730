//! Document store trait definition.

use crate::document::{Content, SnapshotEvent};
use crate::error::StoreResult;

/// Callback invoked with the current document state and every later change.
pub type SnapshotObserver = Box<dyn Fn(SnapshotEvent) + Send + Sync>;

/// A remote document store holding one JSON-like value per named key.
///
/// Stores are **opaque collaborators**: they hold and deliver content
/// without interpreting it. All document structure belongs to the caller.
///
/// # Invariants
///
/// - `write` replaces the named document's content wholesale and stamps its
///   update time; there is no partial update and no precondition
/// - `subscribe` delivers the current state once immediately, then again
///   after every future write to the key, in store-observed write order
/// - A document that does not exist is delivered as
///   [`SnapshotEvent::Missing`], never as an error
///
/// # Implementors
///
/// - [`super::MemoryStore`] - for tests, demos, and offline mode
pub trait DocumentStore: Send + Sync {
    /// Reads the current state of the named document.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or the caller lacks
    /// permission. A missing document is `Ok(SnapshotEvent::Missing)`.
    fn read_once(&self, key: &str) -> StoreResult<SnapshotEvent>;

    /// Replaces the named document's content wholesale.
    ///
    /// Creates the document if it does not exist. The store stamps the
    /// document's update time as part of the write.
    ///
    /// # Errors
    ///
    /// Returns an error if the write is rejected (network, quota,
    /// permission, backend fault).
    fn write(&self, key: &str, content: Content) -> StoreResult<()>;

    /// Subscribes to the named document.
    ///
    /// The observer is invoked once immediately with the current state,
    /// then again after every future write to the key, until the returned
    /// [`Subscription`] is cancelled or dropped. Delivery order matches
    /// store-observed write order.
    ///
    /// # Errors
    ///
    /// Returns an error if the live-change channel cannot be established.
    fn subscribe(&self, key: &str, observer: SnapshotObserver) -> StoreResult<Subscription>;
}

/// A live registration on a document's change channel.
///
/// Cancelling is idempotent; dropping the handle cancels it.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps a cancellation action.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops delivery to the observer.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
