//! Snapshot types delivered by reads and subscriptions.

use std::time::SystemTime;

/// The JSON-like content of a document.
///
/// The store never interprets content; structure is owned entirely by the
/// layer that writes it.
pub type Content = serde_json::Value;

/// A full point-in-time copy of a named document.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The document's content, whole.
    pub content: Content,
    /// When the store last stamped a write of this document.
    ///
    /// Observability only. Nothing in the sync stack resolves conflicts
    /// from this stamp; last write wins regardless of it.
    pub updated_at: SystemTime,
}

impl Snapshot {
    /// Creates a snapshot stamped now.
    pub fn new(content: Content) -> Self {
        Self {
            content,
            updated_at: SystemTime::now(),
        }
    }
}

/// State of a named document, as delivered to readers and subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEvent {
    /// The document exists; carries its current snapshot.
    Present(Snapshot),
    /// The document does not exist (yet).
    Missing,
}

impl SnapshotEvent {
    /// Returns the snapshot, if the document exists.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            SnapshotEvent::Present(snapshot) => Some(snapshot),
            SnapshotEvent::Missing => None,
        }
    }

    /// Returns true if the document exists.
    pub fn is_present(&self) -> bool {
        matches!(self, SnapshotEvent::Present(_))
    }
}
