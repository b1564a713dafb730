//! # Atelier Store
//!
//! Remote document-store contract for Atelier.
//!
//! This crate defines the lowest-level boundary of the sync stack: a named
//! JSON document per key, with three operations (point read, wholesale
//! write, subscribe-for-changes). The store is an **opaque collaborator** -
//! it does not interpret document content, and the sync layer does not
//! depend on any particular backing service's wire format.
//!
//! ## Design Principles
//!
//! - One JSON-like value per named key; writes replace the whole document
//! - Subscriptions deliver the current state immediately, then every change
//!   in store-observed write order
//! - A missing document is a normal delivery ([`SnapshotEvent::Missing`]),
//!   not an error
//! - Implementations must be `Send + Sync` for shared access
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - in-process store for tests, demos, and offline mode
//!
//! ## Example
//!
//! ```rust
//! use atelier_store::{DocumentStore, MemoryStore, SnapshotEvent};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.write("boutiques", json!([{"nom": "Centre"}])).unwrap();
//!
//! match store.read_once("boutiques").unwrap() {
//!     SnapshotEvent::Present(snapshot) => assert!(snapshot.content.is_array()),
//!     SnapshotEvent::Missing => unreachable!(),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod memory;
mod store;

pub use document::{Content, Snapshot, SnapshotEvent};
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, WriteRecord};
pub use store::{DocumentStore, SnapshotObserver, Subscription};
