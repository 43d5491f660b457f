//! Concurrent tile acquisition.
//!
//! The [`TileFetcher`] fans a grid's coordinates out over a bounded pool of
//! workers. Each worker claims coordinates through an atomic cursor, checks
//! the disk cache, downloads with retry and per-attempt timeout, decodes,
//! and streams a [`TileResult`] per coordinate to the assembly side.

mod backoff;
mod fetcher;
mod result;

pub use backoff::BackoffPolicy;
pub use fetcher::{FetchConfig, TileFetcher};
pub use result::{TileResult, TileStatus, TileStatusKind};
