//! Durable flat-file work queue.
//!
//! One identifier per line, human-editable. The pipeline only needs
//! dequeue-style iteration; everything else exists for the CLI's queue
//! management commands.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Queue-related errors.
#[derive(Debug, Error)]
pub enum QueueError {
    /// I/O error reading or writing the queue file
    #[error("queue I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// FIFO queue of panorama identifiers backed by a flat file.
///
/// Operations rewrite the file in place; the queue is meant for interactive
/// batch sizes, not high-throughput work distribution.
pub struct QueueManager {
    path: PathBuf,
}

impl QueueManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an identifier unless it is already queued.
    ///
    /// Returns whether the identifier was added.
    pub fn enqueue(&self, identifier: &str) -> Result<bool, QueueError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(false);
        }

        let existing = self.list()?;
        if existing.iter().any(|queued| queued == identifier) {
            debug!(identifier, "Identifier already queued");
            return Ok(false);
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", identifier)?;
        debug!(identifier, "Identifier queued");
        Ok(true)
    }

    /// Remove and return the first queued identifier, if any.
    pub fn dequeue(&self) -> Result<Option<String>, QueueError> {
        let mut entries = self.list()?;
        if entries.is_empty() {
            return Ok(None);
        }

        let first = entries.remove(0);
        self.rewrite(&entries)?;
        Ok(Some(first))
    }

    /// All queued identifiers in order.
    pub fn list(&self) -> Result<Vec<String>, QueueError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    fn rewrite(&self, entries: &[String]) -> Result<(), QueueError> {
        let mut content = entries.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> (tempfile::TempDir, QueueManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = QueueManager::new(dir.path().join("queue.txt"));
        (dir, manager)
    }

    #[test]
    fn test_empty_queue() {
        let (_dir, queue) = queue();
        assert!(queue.list().unwrap().is_empty());
        assert_eq!(queue.dequeue().unwrap(), None);
    }

    #[test]
    fn test_fifo_order() {
        let (_dir, queue) = queue();
        assert!(queue.enqueue("100").unwrap());
        assert!(queue.enqueue("200").unwrap());
        assert!(queue.enqueue("300").unwrap());

        assert_eq!(queue.dequeue().unwrap().as_deref(), Some("100"));
        assert_eq!(queue.dequeue().unwrap().as_deref(), Some("200"));
        assert_eq!(queue.list().unwrap(), vec!["300"]);
    }

    #[test]
    fn test_enqueue_deduplicates() {
        let (_dir, queue) = queue();
        assert!(queue.enqueue("100").unwrap());
        assert!(!queue.enqueue("100").unwrap());
        assert_eq!(queue.list().unwrap().len(), 1);
    }

    #[test]
    fn test_blank_identifiers_rejected() {
        let (_dir, queue) = queue();
        assert!(!queue.enqueue("").unwrap());
        assert!(!queue.enqueue("   ").unwrap());
        assert!(queue.list().unwrap().is_empty());
    }

    #[test]
    fn test_survives_manual_edits() {
        let (_dir, queue) = queue();
        fs::write(queue.path(), "100\n\n  200  \n").unwrap();
        assert_eq!(queue.list().unwrap(), vec!["100", "200"]);
        assert_eq!(queue.dequeue().unwrap().as_deref(), Some("100"));
        assert_eq!(queue.dequeue().unwrap().as_deref(), Some("200"));
        assert_eq!(queue.dequeue().unwrap(), None);
    }
}
