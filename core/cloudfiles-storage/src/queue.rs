//! Pending writes and deletes for one attachment.
//!
//! The host queues files per style and paths to remove, then flushes. Taking
//! the pending work empties the queue, so a flush clears it whatever the
//! outcome of the individual uploads and deletes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Work waiting for the next flush.
#[derive(Debug, Default)]
pub struct PendingQueue {
    writes: BTreeMap<String, PathBuf>,
    deletes: Vec<String>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `local` as the new content of `style`.
    ///
    /// Returns the file previously queued for that style, if any.
    pub fn queue_write(
        &mut self,
        style: impl Into<String>,
        local: impl Into<PathBuf>,
    ) -> Option<PathBuf> {
        self.writes.insert(style.into(), local.into())
    }

    /// Queues a remote path for deletion. Order is preserved.
    pub fn queue_delete(&mut self, path: impl Into<String>) {
        self.deletes.push(path.into());
    }

    /// The local file waiting to be written for `style`.
    pub fn pending_write(&self, style: &str) -> Option<&Path> {
        self.writes.get(style).map(PathBuf::as_path)
    }

    pub fn pending_deletes(&self) -> &[String] {
        &self.deletes
    }

    /// Takes all pending writes, leaving none queued.
    pub fn take_writes(&mut self) -> BTreeMap<String, PathBuf> {
        std::mem::take(&mut self.writes)
    }

    /// Takes all pending deletes in queue order, leaving none queued.
    pub fn take_deletes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.deletes)
    }

    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.deletes.is_empty()
    }
}
