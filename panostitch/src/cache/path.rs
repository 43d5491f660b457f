//! Cache path construction.

use crate::grid::TileCoordinate;
use std::path::{Path, PathBuf};

/// Construct the cache path for one tile.
///
/// Layout is a directory per identifier with zero-padded row-column
/// filenames:
/// ```text
/// <cache_root>/<identifier>/<rrrr>-<cccc>.png
/// ```
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use panostitch::cache::tile_path;
/// use panostitch::grid::TileCoordinate;
///
/// let path = tile_path(&PathBuf::from("/cache"), "42", TileCoordinate { row: 3, col: 17 });
/// assert_eq!(path, PathBuf::from("/cache/42/0003-0017.png"));
/// ```
pub fn tile_path(cache_root: &Path, identifier: &str, coordinate: TileCoordinate) -> PathBuf {
    cache_root
        .join(identifier)
        .join(format!("{:04}-{:04}.png", coordinate.row, coordinate.col))
}
