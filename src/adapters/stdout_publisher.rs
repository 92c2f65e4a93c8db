//! Dry-run publisher: prints the document instead of uploading it.

use crate::domain::error::FeedError;
use crate::domain::snapshot::Snapshot;
use crate::ports::publisher::Publisher;
use std::io::Write;

pub struct StdoutPublisher;

impl Publisher for StdoutPublisher {
    fn publish(&self, snapshot: &Snapshot) -> Result<String, FeedError> {
        let content = snapshot.to_json_pretty()?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{content}")?;
        Ok("stdout".to_string())
    }
}
