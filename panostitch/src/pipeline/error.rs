//! Pipeline error types.

use crate::assemble::AssemblyError;
use crate::grid::ResolutionError;
use thiserror::Error;

/// Fatal failures for one identifier's run.
///
/// Per-tile fetch and decode failures never appear here; they degrade the
/// run to partial success and surface as placeholders plus a count in the
/// report.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Grid resolution failed; there is nothing to fetch.
    #[error("resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    /// The composite could not be persisted.
    #[error("assembly failed: {0}")]
    Assembly(#[from] AssemblyError),
}
