//! # Atelier Sync
//!
//! Synced-state core for Atelier.
//!
//! This crate provides:
//! - [`SyncedState`] - a typed value mirroring one remote document
//! - Debounced write scheduling with an injectable timer ([`Scheduler`])
//! - [`SyncProvider`] - dependency-injected registry, one handle per key
//! - Explicit offline mode for demo/ephemeral sessions
//!
//! ## Architecture
//!
//! Every application feature owns one named collection (`"boutiques"`,
//! `"clients"`, `"commandes"`, ...) opened through a [`SyncProvider`]. The
//! handle behaves like plain local mutable state - synchronous reads,
//! immediate mutations - while the crate keeps the remote document
//! eventually consistent with the latest local value and absorbs remote
//! changes from other sessions.
//!
//! ## Key Invariants
//!
//! - A value starts at the caller's default until a remote snapshot or a
//!   local mutation replaces it
//! - At most one debounced write is pending per handle; a burst of
//!   mutations collapses into a single write carrying the final value
//! - An inbound remote snapshot replaces the value wholesale - no field
//!   merge, no suppression of this session's own echoed writes
//! - A failed write is logged and counted, never rolled back or retried
//! - Consistency across sessions is last-write-wins; concurrent writers
//!   inside one debounce window race, and the later write stands
//!
//! The mutate/read path never returns an error and never blocks on the
//! network. All sync failure is observable only through logs and
//! [`SyncStats`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod provider;
mod scheduler;
mod state;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use provider::SyncProvider;
pub use scheduler::{ManualScheduler, Scheduler, ThreadScheduler, TimerHandle};
pub use state::{SyncStats, SyncedState};
