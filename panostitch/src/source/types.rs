//! Source types and traits.

use crate::grid::TileCoordinate;
use std::fmt;
use std::future::Future;

/// Errors that can occur talking to a tile source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Server answered with a non-success HTTP status
    HttpStatus { status: u16, url: String },
    /// Request never completed (connect failure, reset, DNS, ...)
    Network(String),
    /// Response arrived but its content is unusable
    InvalidResponse(String),
}

impl SourceError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Transport failures and server-side errors are transient; client
    /// errors are authoritative and retrying them wastes the budget.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Network(_) => true,
            SourceError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            SourceError::InvalidResponse(_) => false,
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::HttpStatus { status, url } => {
                write!(f, "HTTP {} from {}", status, url)
            }
            SourceError::Network(msg) => write!(f, "network error: {}", msg),
            SourceError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// Trait for panoramic tile sources.
///
/// Implementors map an identifier and grid coordinates onto the service's
/// address scheme and download the raw bytes. Consumers stay generic over
/// the trait, so alternative services only need a new implementation.
pub trait TileSource: Send + Sync + 'static {
    /// Downloads the source's size descriptor for a panorama.
    ///
    /// Returns the raw descriptor document. Sources without authoritative
    /// metadata return an error the caller treats as "fall back to probing".
    fn fetch_descriptor(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<Vec<u8>, SourceError>> + Send;

    /// Downloads one tile's raw bytes.
    ///
    /// # Arguments
    ///
    /// * `identifier` - The panorama identifier
    /// * `coordinate` - Tile position in the grid
    /// * `level` - Detail level the grid is addressed at
    fn fetch_tile(
        &self,
        identifier: &str,
        coordinate: TileCoordinate,
        level: u8,
    ) -> impl Future<Output = Result<Vec<u8>, SourceError>> + Send;

    /// Whether an error is the source's authoritative "no such tile" signal.
    ///
    /// Grid boundary detection hangs off this predicate, so implementations
    /// must never classify transient failures as absence. The default treats
    /// HTTP 404 as absent and everything else as inconclusive.
    fn is_absent(&self, error: &SourceError) -> bool {
        matches!(error, SourceError::HttpStatus { status: 404, .. })
    }

    /// Source name for logging and cache attribution.
    fn name(&self) -> &str;

    /// Highest detail level the source serves.
    ///
    /// Used as the probing level when no descriptor is available.
    fn max_level(&self) -> u8;
}
