//! Disk cache implementation.

use super::path::tile_path;
use super::stats::CacheStats;
use crate::grid::TileCoordinate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent store of raw tile bytes, keyed by (identifier, coordinate).
///
/// Reads and writes go straight to the filesystem; the unique key per tile
/// makes concurrent writes from multiple workers safe without coordination.
pub struct TileCache {
    root: PathBuf,
    stats: Arc<CacheStats>,
}

impl TileCache {
    /// Create a cache rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Read a tile's cached bytes, if present.
    ///
    /// Whether the bytes still decode is the caller's concern; a corrupt
    /// entry is treated as a miss at the fetch layer and overwritten.
    pub async fn get(&self, identifier: &str, coordinate: TileCoordinate) -> Option<Vec<u8>> {
        let path = tile_path(&self.root, identifier, coordinate);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                self.stats.record_hit();
                Some(bytes)
            }
            Err(_) => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Write a tile's bytes. Overwrites any existing entry for the key.
    pub async fn put(
        &self,
        identifier: &str,
        coordinate: TileCoordinate,
        bytes: &[u8],
    ) -> Result<(), CacheError> {
        let path = tile_path(&self.root, identifier, coordinate);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        self.stats.record_write();
        debug!(identifier, coordinate = %coordinate, bytes = bytes.len(), "Tile cached");
        Ok(())
    }

    /// Whether an entry exists for the key (without reading it).
    pub async fn contains(&self, identifier: &str, coordinate: TileCoordinate) -> bool {
        tokio::fs::try_exists(tile_path(&self.root, identifier, coordinate))
            .await
            .unwrap_or(false)
    }

    /// Remove every cached tile for an identifier.
    pub async fn clear_identifier(&self, identifier: &str) -> Result<(), CacheError> {
        let dir = self.root.join(identifier);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(row: u32, col: u32) -> TileCoordinate {
        TileCoordinate { row, col }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TileCache::new(dir.path());

        cache.put("42", coord(1, 2), b"tile-bytes").await.unwrap();
        let read = cache.get("42", coord(1, 2)).await;

        assert_eq!(read.as_deref(), Some(&b"tile-bytes"[..]));
        assert_eq!(cache.stats().writes(), 1);
        assert_eq!(cache.stats().hits(), 1);
    }

    #[tokio::test]
    async fn test_miss_for_absent_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TileCache::new(dir.path());

        assert!(cache.get("42", coord(0, 0)).await.is_none());
        assert!(!cache.contains("42", coord(0, 0)).await);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[tokio::test]
    async fn test_put_is_idempotent_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TileCache::new(dir.path());

        cache.put("42", coord(0, 0), b"first").await.unwrap();
        cache.put("42", coord(0, 0), b"second").await.unwrap();

        assert_eq!(cache.get("42", coord(0, 0)).await.as_deref(), Some(&b"second"[..]));
    }

    #[tokio::test]
    async fn test_clear_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TileCache::new(dir.path());

        cache.put("42", coord(0, 0), b"x").await.unwrap();
        cache.clear_identifier("42").await.unwrap();

        assert!(cache.get("42", coord(0, 0)).await.is_none());

        // Clearing an identifier that was never cached is fine
        cache.clear_identifier("other").await.unwrap();
    }
}
