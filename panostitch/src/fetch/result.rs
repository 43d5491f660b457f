//! Per-tile fetch outcomes.

use crate::decode::PixelBuffer;
use crate::grid::TileCoordinate;

/// Outcome of acquiring one tile.
///
/// Fetch and decode failures are kept distinct so diagnostics can tell
/// "server never answered" from "server answered with garbage".
#[derive(Debug, Clone)]
pub enum TileStatus {
    /// Tile downloaded (or read from cache) and decoded.
    Fetched(PixelBuffer),
    /// All attempts failed or the source reported the tile absent.
    FetchFailed { attempts: u32, error: String },
    /// Bytes arrived but would not decode. Not retried: bad bytes don't
    /// improve on retry without a re-fetch.
    DecodeFailed(String),
}

impl TileStatus {
    pub fn kind(&self) -> TileStatusKind {
        match self {
            TileStatus::Fetched(_) => TileStatusKind::Fetched,
            TileStatus::FetchFailed { .. } => TileStatusKind::FetchFailed,
            TileStatus::DecodeFailed(_) => TileStatusKind::DecodeFailed,
        }
    }
}

/// Status discriminant without the pixel payload, for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStatusKind {
    Fetched,
    FetchFailed,
    DecodeFailed,
}

/// One tile's result, handed exactly once to the assembly engine.
#[derive(Debug, Clone)]
pub struct TileResult {
    pub coordinate: TileCoordinate,
    pub status: TileStatus,
}

impl TileResult {
    pub fn is_fetched(&self) -> bool {
        matches!(self.status, TileStatus::Fetched(_))
    }
}
