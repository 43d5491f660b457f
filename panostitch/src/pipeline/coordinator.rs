//! Pipeline coordinator implementation.

use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressSender};
use crate::assemble::{assemble, AssemblyReport};
use crate::cache::TileCache;
use crate::fetch::{FetchConfig, TileFetcher};
use crate::grid::{GridResolver, ProbeConfig};
use crate::queue::QueueManager;
use crate::source::TileSource;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// States a run moves through.
///
/// `Failed` is terminal and reached only on fatal errors (no grid, or the
/// composite could not be persisted); per-tile failures degrade the run to
/// partial success instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Resolving,
    Fetching,
    Assembling,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Resolving => "resolving",
            PipelineState::Fetching => "fetching",
            PipelineState::Assembling => "assembling",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Configuration for a coordinator.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Fetch stage tuning (workers, timeout, backoff).
    pub fetch: FetchConfig,
    /// Probing fallback tuning for grid resolution.
    pub probe: ProbeConfig,
    /// Directory the composite raster is written into.
    pub output_dir: PathBuf,
    /// Output extension; picks the encoder. TIFF and PNG both handle very
    /// large rasters losslessly.
    pub output_extension: String,
    /// Optional wall-clock bound for a whole run; expiry cancels fetching
    /// and assembles whatever arrived.
    pub deadline: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            probe: ProbeConfig::default(),
            output_dir: PathBuf::from("output"),
            output_extension: "tiff".to_string(),
            deadline: None,
        }
    }
}

/// Sequences resolve → fetch → assemble for one identifier at a time.
///
/// Fetching fans out over the worker pool while a single assembly consumer
/// drains results as they complete; the transition to `Assembling` happens
/// on the first received tile, not after the last.
pub struct PipelineCoordinator<S: TileSource> {
    resolver: GridResolver<S>,
    fetcher: TileFetcher<S>,
    output_dir: PathBuf,
    output_extension: String,
    deadline: Option<Duration>,
    progress: Option<ProgressSender>,
}

impl<S: TileSource> PipelineCoordinator<S> {
    pub fn new(source: Arc<S>, config: PipelineConfig) -> Self {
        Self {
            resolver: GridResolver::new(Arc::clone(&source), config.probe),
            fetcher: TileFetcher::new(source, config.fetch),
            output_dir: config.output_dir,
            output_extension: config.output_extension,
            deadline: config.deadline,
            progress: None,
        }
    }

    /// Attach a disk tile cache (shared with the fetcher).
    pub fn with_cache(mut self, cache: Arc<TileCache>) -> Self {
        self.fetcher = self.fetcher.with_cache(cache);
        self
    }

    /// Attach a progress event channel.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Output path for an identifier's composite.
    pub fn output_path(&self, identifier: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_assembled.{}", identifier, self.output_extension))
    }

    /// Process one identifier end to end.
    ///
    /// Cancellation contract: cancelling the token stops new fetches, but
    /// results accepted before cancellation are still assembled and
    /// persisted; coordinates never fetched become placeholders counted as
    /// failed in the report. Only resolution failure and persist failure
    /// return an error, with no partial output.
    pub async fn run(
        &self,
        identifier: &str,
        cancel: CancellationToken,
    ) -> Result<AssemblyReport, PipelineError> {
        info!(identifier, "Run starting");
        self.emit(ProgressEvent::StateChanged(PipelineState::Resolving));

        let spec = match self.resolver.resolve(identifier).await {
            Ok(spec) => spec,
            Err(e) => {
                warn!(identifier, error = %e, "Run failed during resolution");
                self.emit(ProgressEvent::StateChanged(PipelineState::Failed));
                return Err(e.into());
            }
        };

        self.emit(ProgressEvent::GridResolved {
            identifier: identifier.to_string(),
            rows: spec.rows(),
            columns: spec.columns(),
            total_tiles: spec.tile_count(),
        });
        self.emit(ProgressEvent::StateChanged(PipelineState::Fetching));

        // The run token is a child: callers cancel everything, the deadline
        // cancels only this run.
        let run_cancel = cancel.child_token();
        let watchdog = self.deadline.map(|deadline| {
            let token = run_cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                warn!(deadline_secs = deadline.as_secs(), "Run deadline expired");
                token.cancel();
            })
        });

        let results = self.fetcher.fetch_all(&spec, run_cancel.clone());
        let output_path = self.output_path(identifier);
        let outcome = assemble(&spec, results, &output_path, self.progress.as_ref()).await;

        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }

        match outcome {
            Ok(report) => {
                self.emit(ProgressEvent::StateChanged(PipelineState::Done));
                self.emit(ProgressEvent::RunCompleted {
                    identifier: identifier.to_string(),
                    failed_tiles: report.failed_tiles,
                    output_path: report.output_path.clone(),
                });
                info!(
                    identifier,
                    total_tiles = report.total_tiles,
                    failed_tiles = report.failed_tiles,
                    output = %report.output_path.display(),
                    "Run complete"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(identifier, error = %e, "Run failed during assembly");
                self.emit(ProgressEvent::StateChanged(PipelineState::Failed));
                Err(e.into())
            }
        }
    }

    /// Process identifiers from the queue until it is empty or the token is
    /// cancelled.
    ///
    /// A fatal failure for one identifier is recorded and does not stop the
    /// batch.
    pub async fn drain_queue(
        &self,
        queue: &QueueManager,
        cancel: CancellationToken,
    ) -> Vec<(String, Result<AssemblyReport, PipelineError>)> {
        let mut outcomes = Vec::new();

        while !cancel.is_cancelled() {
            let identifier = match queue.dequeue() {
                Ok(Some(identifier)) => identifier,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Queue read failed, stopping batch");
                    break;
                }
            };

            let outcome = self.run(&identifier, cancel.clone()).await;
            if let Err(e) = &outcome {
                warn!(identifier = %identifier, error = %e, "Queued run failed, continuing");
            }
            outcomes.push((identifier, outcome));
        }

        outcomes
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            let _ = progress.send(event);
        }
    }
}
