//! Process command - full pipeline for one or more identifiers.

use crate::error::CliError;
use crate::progress::spawn_renderer;
use panostitch::cache::TileCache;
use panostitch::config::Settings;
use panostitch::pipeline::{progress_channel, PipelineCoordinator};
use panostitch::queue::QueueManager;
use panostitch::source::{AsyncReqwestClient, GigapanSource};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the process command.
///
/// With `use_queue`, identifiers are drained from the work queue instead of
/// the argument list. A fatal failure for one identifier does not stop the
/// rest; the command exits nonzero if any failed.
pub async fn run(
    settings: &Settings,
    identifiers: Vec<String>,
    use_queue: bool,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let client = AsyncReqwestClient::with_timeout(settings.download.request_timeout_secs)
        .map_err(CliError::Client)?;
    let source = Arc::new(GigapanSource::with_base_url(
        client,
        settings.source.base_url.clone(),
    ));
    let cache = Arc::new(TileCache::new(settings.cache.directory.clone()));

    let (progress, events) = progress_channel();
    let renderer = spawn_renderer(events);

    let coordinator = PipelineCoordinator::new(source, settings.pipeline_config())
        .with_cache(cache)
        .with_progress(progress);

    let outcomes = if use_queue {
        let queue = QueueManager::new(settings.queue.file.clone());
        coordinator.drain_queue(&queue, cancel).await
    } else {
        let mut outcomes = Vec::new();
        for identifier in identifiers {
            if cancel.is_cancelled() {
                break;
            }
            let outcome = coordinator.run(&identifier, cancel.clone()).await;
            outcomes.push((identifier, outcome));
        }
        outcomes
    };

    // Dropping the coordinator closes the progress channel and lets the
    // renderer finish.
    drop(coordinator);
    let _ = renderer.await;

    let total = outcomes.len();
    let mut failed = 0;
    for (identifier, outcome) in &outcomes {
        match outcome {
            Ok(report) => {
                info!(
                    identifier = %identifier,
                    failed_tiles = report.failed_tiles,
                    output = %report.output_path.display(),
                    "Identifier processed"
                );
            }
            Err(e) => {
                eprintln!("{}: {}", identifier, e);
                failed += 1;
            }
        }
    }

    if failed == 0 {
        return Ok(());
    }
    if total == 1 {
        // A single requested identifier: surface its error directly.
        if let Some((_, Err(e))) = outcomes.into_iter().next() {
            return Err(e.into());
        }
    }
    Err(CliError::Batch { failed, total })
}
