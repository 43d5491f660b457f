//! On-disk tile cache.
//!
//! Raw tile bytes are cached per identifier so an interrupted run resumes
//! without refetching, and a finished run can be reassembled offline. Cache
//! keys are unique per (identifier, coordinate), so concurrent writes are
//! idempotent and need no locking.

mod disk;
mod path;
mod stats;

pub use disk::{CacheError, TileCache};
pub use path::tile_path;
pub use stats::CacheStats;
