//! In-memory document store.

use crate::document::{Content, Snapshot, SnapshotEvent};
use crate::error::{StoreError, StoreResult};
use crate::store::{DocumentStore, SnapshotObserver, Subscription};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// A record of one write accepted by a [`MemoryStore`].
///
/// Tests assert debounce behavior by counting and inspecting these.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    /// The key the write targeted.
    pub key: String,
    /// The content the write carried.
    pub content: Content,
}

/// An in-memory document store.
///
/// Suitable for:
/// - Unit and integration tests
/// - Demos
/// - Offline/ephemeral sessions that never reach a real backend
///
/// Subscribers are notified synchronously on the writer's thread, so
/// delivery order always matches write order.
///
/// # Failure Injection
///
/// [`set_fail_writes`](MemoryStore::set_fail_writes) and
/// [`set_fail_subscribe`](MemoryStore::set_fail_subscribe) make the store
/// reject the corresponding operations, for exercising the sync layer's
/// non-fatal failure paths.
///
/// # Example
///
/// ```rust
/// use atelier_store::{DocumentStore, MemoryStore};
/// use serde_json::json;
///
/// let store = MemoryStore::new();
/// store.write("clients", json!([])).unwrap();
/// assert_eq!(store.writes().len(), 1);
/// ```
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Snapshot>>,
    subscribers: Arc<RwLock<HashMap<String, Vec<Subscriber>>>>,
    next_subscriber_id: AtomicU64,
    fail_writes: AtomicBool,
    fail_subscribe: AtomicBool,
    write_log: RwLock<Vec<WriteRecord>>,
}

struct Subscriber {
    id: u64,
    observer: Arc<SnapshotObserver>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preloads a document without recording a write.
    ///
    /// Useful for tests that need a record to exist before the first
    /// subscriber connects. Existing subscribers are still notified, as
    /// they would be for any out-of-band edit.
    pub fn seed(&self, key: impl Into<String>, content: Content) {
        self.apply(key.into(), content, false);
    }

    /// Makes subsequent writes fail with [`StoreError::WriteRejected`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent subscribe calls fail with
    /// [`StoreError::SubscriptionFailed`].
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Returns every write accepted so far, in order.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.write_log.read().clone()
    }

    /// Returns the writes accepted for one key, in order.
    pub fn writes_for(&self, key: &str) -> Vec<Content> {
        self.write_log
            .read()
            .iter()
            .filter(|record| record.key == key)
            .map(|record| record.content.clone())
            .collect()
    }

    /// Returns the number of active subscribers for a key.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.subscribers
            .read()
            .get(key)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Stores the content and fans the new snapshot out to subscribers.
    fn apply(&self, key: String, content: Content, record: bool) {
        let snapshot = Snapshot::new(content);
        self.documents
            .write()
            .insert(key.clone(), snapshot.clone());

        if record {
            self.write_log.write().push(WriteRecord {
                key: key.clone(),
                content: snapshot.content.clone(),
            });
        }

        // Snapshot the observer list, then deliver outside the lock so an
        // observer may call back into the store.
        let observers: Vec<Arc<SnapshotObserver>> = self
            .subscribers
            .read()
            .get(&key)
            .map(|list| list.iter().map(|s| Arc::clone(&s.observer)).collect())
            .unwrap_or_default();

        for observer in observers {
            (observer.as_ref())(SnapshotEvent::Present(snapshot.clone()));
        }
    }
}

impl DocumentStore for MemoryStore {
    fn read_once(&self, key: &str) -> StoreResult<SnapshotEvent> {
        Ok(match self.documents.read().get(key) {
            Some(snapshot) => SnapshotEvent::Present(snapshot.clone()),
            None => SnapshotEvent::Missing,
        })
    }

    fn write(&self, key: &str, content: Content) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected("injected write failure".into()));
        }
        self.apply(key.to_string(), content, true);
        Ok(())
    }

    fn subscribe(&self, key: &str, observer: SnapshotObserver) -> StoreResult<Subscription> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(StoreError::SubscriptionFailed(
                "injected subscription failure".into(),
            ));
        }

        let id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        let observer = Arc::new(observer);

        self.subscribers
            .write()
            .entry(key.to_string())
            .or_default()
            .push(Subscriber {
                id,
                observer: Arc::clone(&observer),
            });

        // Initial delivery happens after registration: a concurrent write
        // can produce a duplicate delivery but never a missed one.
        let initial = match self.documents.read().get(key) {
            Some(snapshot) => SnapshotEvent::Present(snapshot.clone()),
            None => SnapshotEvent::Missing,
        };
        (observer.as_ref())(initial);

        let subscribers = Arc::clone(&self.subscribers);
        let key = key.to_string();
        Ok(Subscription::new(move || {
            if let Some(list) = subscribers.write().get_mut(&key) {
                list.retain(|s| s.id != id);
            }
        }))
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("documents", &self.documents.read().len())
            .field("writes", &self.write_log.read().len())
            .finish()
    }
}
