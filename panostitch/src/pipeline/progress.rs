//! Progress events for UI consumers.

use super::coordinator::PipelineState;
use crate::fetch::TileStatusKind;
use crate::grid::TileCoordinate;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Events emitted while a run progresses.
///
/// Delivery is unbounded and fire-and-forget: a slow or dropped consumer
/// never stalls the pipeline.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The run moved to a new state.
    StateChanged(PipelineState),
    /// The grid shape is known; fetching is about to start.
    GridResolved {
        identifier: String,
        rows: u32,
        columns: u32,
        total_tiles: u64,
    },
    /// One tile finished (successfully or not).
    TileCompleted {
        coordinate: TileCoordinate,
        status: TileStatusKind,
        completed: u64,
        total: u64,
    },
    /// The run finished and the composite was written.
    RunCompleted {
        identifier: String,
        failed_tiles: u64,
        output_path: PathBuf,
    },
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

/// Create a progress channel to hand to the coordinator.
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}
