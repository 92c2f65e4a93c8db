//! Snapshot publication port traits.

use crate::domain::error::FeedError;
use crate::domain::snapshot::Snapshot;

/// Accepts the finished snapshot document.
pub trait Publisher {
    /// Returns a location describing where the document landed (e.g. a raw URL).
    fn publish(&self, snapshot: &Snapshot) -> Result<String, FeedError>;
}

/// Append-only local record of published snapshots.
pub trait SnapshotArchive {
    fn append(&self, snapshot: &Snapshot) -> Result<(), FeedError>;
}
