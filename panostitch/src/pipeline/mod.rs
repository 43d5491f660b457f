//! Run coordination.
//!
//! The [`PipelineCoordinator`] sequences resolution, fetching, and assembly
//! for one identifier at a time: resolve the grid, fan tile downloads out
//! over the worker pool, and stream results straight into the assembly
//! consumer. There is no barrier between fetching and assembling; the first
//! completed tile starts the assembly side.

mod coordinator;
mod error;
mod progress;

pub use coordinator::{PipelineConfig, PipelineCoordinator, PipelineState};
pub use error::PipelineError;
pub use progress::{progress_channel, ProgressEvent, ProgressReceiver, ProgressSender};
