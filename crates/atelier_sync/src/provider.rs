//! Provider and per-key registry.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::scheduler::{Scheduler, ThreadScheduler};
use crate::state::SyncedState;
use atelier_store::DocumentStore;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Where a provider's handles persist to.
enum Backend {
    /// Handles mirror documents in this store.
    Remote(Arc<dyn DocumentStore>),
    /// Handles are purely local; nothing is subscribed or written.
    Offline,
}

/// Opens and owns the synced collections of one session.
///
/// The provider is constructed once at application start and injected into
/// every feature. Each named collection gets exactly one [`SyncedState`]
/// per provider: repeated opens of the same key return the same handle, so
/// "one key, one debounced writer" holds structurally instead of by
/// convention. (Two *providers* over one store still race, as two OS
/// processes would - that is the documented last-write-wins model.)
///
/// Offline mode is a constructor choice, not an ambient global: an
/// [`offline`](SyncProvider::offline) provider hands out handles that work
/// exactly like connected ones minus subscription and writes.
///
/// # Example
///
/// ```rust
/// use atelier_store::MemoryStore;
/// use atelier_sync::{SyncConfig, SyncProvider, ThreadScheduler};
/// use std::sync::Arc;
///
/// let provider = SyncProvider::connected(
///     Arc::new(MemoryStore::new()),
///     Arc::new(ThreadScheduler::new()),
///     SyncConfig::default(),
/// );
///
/// let boutiques = provider.collection("boutiques", Vec::<String>::new()).unwrap();
/// boutiques.update(|list| list.push("Centre".to_string()));
/// ```
pub struct SyncProvider {
    backend: Backend,
    scheduler: Arc<dyn Scheduler>,
    config: SyncConfig,
    registry: Mutex<HashMap<String, Box<dyn Any + Send + Sync>>>,
}

impl SyncProvider {
    /// Creates a provider whose handles mirror documents in `store`.
    pub fn connected(
        store: Arc<dyn DocumentStore>,
        scheduler: Arc<dyn Scheduler>,
        config: SyncConfig,
    ) -> Self {
        Self {
            backend: Backend::Remote(store),
            scheduler,
            config,
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a provider whose handles are purely local.
    pub fn offline(config: SyncConfig) -> Self {
        Self {
            backend: Backend::Offline,
            // Never schedules anything; present so handles are uniform.
            scheduler: Arc::new(ThreadScheduler::new()),
            config,
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if this provider never reaches a store.
    pub fn is_offline(&self) -> bool {
        matches!(self.backend, Backend::Offline)
    }

    /// Opens the named collection, creating its handle on first use.
    ///
    /// The first open constructs the handle (wiring the store subscription
    /// when connected) with `default` as its value until a remote record
    /// arrives. Every later open of the same key returns the same handle,
    /// sharing value, timer, and stats; its `default` argument is ignored.
    ///
    /// # Errors
    ///
    /// - [`SyncError::EmptyKey`] if `key` is empty
    /// - [`SyncError::TypeMismatch`] if `key` is already open with a
    ///   different value type
    pub fn collection<T>(&self, key: &str, default: T) -> SyncResult<SyncedState<T>>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        if key.is_empty() {
            return Err(SyncError::EmptyKey);
        }

        let mut registry = self.registry.lock();
        if let Some(entry) = registry.get(key) {
            return entry
                .downcast_ref::<SyncedState<T>>()
                .cloned()
                .ok_or_else(|| SyncError::TypeMismatch {
                    key: key.to_string(),
                });
        }

        let store = match &self.backend {
            Backend::Remote(store) => Some(Arc::clone(store)),
            Backend::Offline => None,
        };
        let state = SyncedState::connect(
            key.to_string(),
            default,
            store,
            Arc::clone(&self.scheduler),
            self.config.debounce,
        );
        registry.insert(key.to_string(), Box::new(state.clone()));
        Ok(state)
    }
}

impl std::fmt::Debug for SyncProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncProvider")
            .field("offline", &self.is_offline())
            .field("collections", &self.registry.lock().len())
            .finish()
    }
}
