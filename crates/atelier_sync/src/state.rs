//! The synced state handle.

use crate::scheduler::{Scheduler, TimerHandle};
use atelier_store::{DocumentStore, SnapshotEvent, SnapshotObserver, Subscription};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Counters describing one handle's sync activity.
///
/// Sync failure is non-fatal by design, so these counters (plus logs) are
/// the only place it surfaces.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Local mutations applied.
    pub mutations: u64,
    /// Debounced writes that reached the store.
    pub writes_issued: u64,
    /// Debounced writes the store rejected (or that failed to serialize).
    pub writes_failed: u64,
    /// Remote snapshots applied to the local value.
    pub snapshots_applied: u64,
    /// Update stamp of the most recent applied snapshot.
    pub last_remote_update: Option<SystemTime>,
}

/// A typed value mirroring one remote document.
///
/// The handle behaves like plain local mutable state: [`get`](Self::get)
/// is synchronous, [`set`](Self::set) and [`update`](Self::update) apply
/// immediately. Behind that surface, every mutation (re)schedules one
/// debounced whole-document write, and every inbound remote snapshot
/// replaces the value wholesale - including snapshots caused by this
/// handle's own writes.
///
/// # Consistency
///
/// Last-write-wins, no merge. Two sessions mutating the same key inside
/// one debounce window race; the write that lands last at the store
/// determines the record, and the losing session converges on it at its
/// next inbound snapshot. A mutation made before the first snapshot
/// arrives is likewise overwritten if the record already exists remotely.
///
/// # Failure
///
/// Write and subscription failures are logged and counted, never surfaced
/// through this API and never rolled back. A value that fails to persist
/// survives only in process memory.
///
/// Handles are cheap to clone; clones share one value and one timer.
pub struct SyncedState<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    key: String,
    debounce: Duration,
    store: Option<Arc<dyn DocumentStore>>,
    scheduler: Arc<dyn Scheduler>,
    value: RwLock<T>,
    /// At most one live debounce timer per handle.
    pending: Mutex<Option<TimerHandle>>,
    watchers: Mutex<Vec<Sender<T>>>,
    stats: Mutex<SyncStats>,
    subscription: Mutex<Option<Subscription>>,
}

impl<T> Clone for SyncedState<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> SyncedState<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Builds a handle and wires its store subscription.
    ///
    /// `store: None` is offline mode: the value stays purely local and no
    /// timer is ever scheduled. A subscription that cannot be established
    /// is logged and the handle continues local-only.
    pub(crate) fn connect(
        key: String,
        default: T,
        store: Option<Arc<dyn DocumentStore>>,
        scheduler: Arc<dyn Scheduler>,
        debounce: Duration,
    ) -> Self {
        let shared = Arc::new(Shared {
            key,
            debounce,
            store,
            scheduler,
            value: RwLock::new(default),
            pending: Mutex::new(None),
            watchers: Mutex::new(Vec::new()),
            stats: Mutex::new(SyncStats::default()),
            subscription: Mutex::new(None),
        });

        if let Some(store) = shared.store.clone() {
            let weak = Arc::downgrade(&shared);
            let observer: SnapshotObserver = Box::new(move |event| {
                if let Some(shared) = weak.upgrade() {
                    shared.apply_remote(event);
                }
            });
            match store.subscribe(&shared.key, observer) {
                Ok(subscription) => *shared.subscription.lock() = Some(subscription),
                Err(error) => {
                    warn!(key = %shared.key, %error, "live updates unavailable, continuing local-only");
                }
            }
        }

        Self { shared }
    }

    /// Returns the current value.
    ///
    /// Always the latest known value: a just-applied local mutation or the
    /// most recent remote snapshot, whichever came last.
    pub fn get(&self) -> T {
        self.shared.value.read().clone()
    }

    /// Replaces the value and schedules its debounced write.
    pub fn set(&self, value: T) {
        self.apply_local(|current| *current = value);
    }

    /// Mutates the value in place and schedules its debounced write.
    ///
    /// The closure runs synchronously under the value lock; when this
    /// returns, [`get`](Self::get) already observes the new value.
    pub fn update(&self, mutate: impl FnOnce(&mut T)) {
        self.apply_local(mutate);
    }

    /// Subscribes to value replacements.
    ///
    /// The receiver gets the new value after every local mutation and
    /// every applied remote snapshot. Dead receivers are pruned on the
    /// next emission.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        self.shared.watchers.lock().push(tx);
        rx
    }

    /// Returns the key this handle mirrors.
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// Returns true while a debounced write is still waiting to fire.
    pub fn has_pending_write(&self) -> bool {
        self.shared
            .pending
            .lock()
            .as_ref()
            .map(|handle| handle.is_active())
            .unwrap_or(false)
    }

    /// Returns this handle's sync counters.
    pub fn stats(&self) -> SyncStats {
        self.shared.stats.lock().clone()
    }

    fn apply_local(&self, mutate: impl FnOnce(&mut T)) {
        let value = {
            let mut guard = self.shared.value.write();
            mutate(&mut guard);
            guard.clone()
        };
        self.shared.stats.lock().mutations += 1;
        self.shared.notify_watchers(value);
        self.schedule_write();
    }

    /// Replaces any pending timer with a fresh one at the full debounce
    /// delay, so the write fires only after a quiet period.
    fn schedule_write(&self) {
        let Some(store) = self.shared.store.clone() else {
            return;
        };

        let mut pending = self.shared.pending.lock();
        if let Some(previous) = pending.take() {
            previous.cancel();
        }

        let weak = Arc::downgrade(&self.shared);
        let task = Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.write_now(store.as_ref());
            }
        });
        *pending = Some(self.shared.scheduler.schedule(self.shared.debounce, task));
    }
}

impl<T> Shared<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Applies an inbound remote snapshot: last snapshot wins, wholesale.
    ///
    /// A pending debounced write is left running; when it fires it
    /// persists the then-current value.
    fn apply_remote(&self, event: SnapshotEvent) {
        let snapshot = match event {
            SnapshotEvent::Present(snapshot) => snapshot,
            // Record does not exist: keep the default, write nothing.
            SnapshotEvent::Missing => return,
        };

        let value: T = match serde_json::from_value(snapshot.content) {
            Ok(value) => value,
            Err(error) => {
                warn!(key = %self.key, %error, "dropping undecodable snapshot");
                return;
            }
        };

        *self.value.write() = value.clone();
        {
            let mut stats = self.stats.lock();
            stats.snapshots_applied += 1;
            stats.last_remote_update = Some(snapshot.updated_at);
        }
        self.notify_watchers(value);
    }

    /// Serializes the current value and issues the whole-document write.
    fn write_now(&self, store: &dyn DocumentStore) {
        let content = {
            let value = self.value.read();
            match serde_json::to_value(&*value) {
                Ok(content) => content,
                Err(error) => {
                    self.stats.lock().writes_failed += 1;
                    warn!(key = %self.key, %error, "value failed to serialize, write skipped");
                    return;
                }
            }
        };

        match store.write(&self.key, content) {
            Ok(()) => {
                self.stats.lock().writes_issued += 1;
                debug!(key = %self.key, "debounced write flushed");
            }
            Err(error) => {
                self.stats.lock().writes_failed += 1;
                warn!(key = %self.key, %error, "write failed, keeping local value");
            }
        }
    }

    fn notify_watchers(&self, value: T) {
        let mut watchers = self.watchers.lock();
        watchers.retain(|tx| tx.send(value.clone()).is_ok());
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.cancel();
        }
        // The store subscription cancels via its own Drop.
    }
}

impl<T> std::fmt::Debug for SyncedState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncedState")
            .field("key", &self.shared.key)
            .field("debounce", &self.shared.debounce)
            .field("offline", &self.shared.store.is_none())
            .finish()
    }
}
