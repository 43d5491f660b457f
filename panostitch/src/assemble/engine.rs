//! Streaming assembly engine.

use super::canvas::Canvas;
use crate::cache::TileCache;
use crate::decode::decode_tile;
use crate::fetch::{TileResult, TileStatus};
use crate::grid::GridSpec;
use crate::pipeline::{PipelineState, ProgressEvent, ProgressSender};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Errors that can occur during assembly.
///
/// Per-tile failures are not errors here; they become placeholders. Only
/// failing to produce the output artifact is fatal.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// Encoding or writing the final raster failed
    #[error("failed to persist canvas to {path}: {message}")]
    Persist { path: PathBuf, message: String },

    /// Internal error (e.g., the encode task panicked)
    #[error("assembly internal error: {0}")]
    Internal(String),
}

/// Outcome of a completed assembly.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub identifier: String,
    pub total_tiles: u64,
    pub placed_tiles: u64,
    pub failed_tiles: u64,
    pub output_path: PathBuf,
}

/// Drain tile results into a canvas and persist it.
///
/// Consumes results as they arrive; each coordinate is honored exactly once
/// (duplicates are dropped with a warning). Coordinates whose result never
/// arrives (a cancelled fetch stops claiming) are filled with the
/// placeholder and counted as failed. The canvas is encoded off the async
/// runtime once the stream ends, to a format chosen by the output path's
/// extension.
pub async fn assemble(
    spec: &GridSpec,
    mut results: mpsc::Receiver<TileResult>,
    output_path: &Path,
    progress: Option<&ProgressSender>,
) -> Result<AssemblyReport, AssemblyError> {
    let total = spec.tile_count();
    let mut canvas = Canvas::new(spec.canvas_width(), spec.canvas_height());
    let mut seen = vec![false; total as usize];
    let mut placed = 0u64;
    let mut failed = 0u64;
    let mut completed = 0u64;
    let mut streaming = false;

    while let Some(result) = results.recv().await {
        if !streaming {
            streaming = true;
            emit(progress, ProgressEvent::StateChanged(PipelineState::Assembling));
        }

        let index = spec.index_of(result.coordinate);
        if seen[index] {
            warn!(
                identifier = spec.identifier(),
                coordinate = %result.coordinate,
                "Duplicate tile result dropped"
            );
            continue;
        }
        seen[index] = true;
        completed += 1;

        let region = spec.region_of(result.coordinate);
        let status_kind = result.status.kind();
        match result.status {
            TileStatus::Fetched(buffer) => {
                canvas.place(region, &buffer);
                placed += 1;
            }
            TileStatus::FetchFailed { attempts, error } => {
                debug!(
                    identifier = spec.identifier(),
                    coordinate = %result.coordinate,
                    attempts,
                    error = %error,
                    "Tile failed to fetch, placing placeholder"
                );
                canvas.fill_placeholder(region);
                failed += 1;
            }
            TileStatus::DecodeFailed(error) => {
                debug!(
                    identifier = spec.identifier(),
                    coordinate = %result.coordinate,
                    error = %error,
                    "Tile failed to decode, placing placeholder"
                );
                canvas.fill_placeholder(region);
                failed += 1;
            }
        }

        emit(
            progress,
            ProgressEvent::TileCompleted {
                coordinate: result.coordinate,
                status: status_kind,
                completed,
                total,
            },
        );
    }

    // A cancelled fetch leaves unclaimed coordinates with no result.
    for coordinate in spec.coordinates() {
        if !seen[spec.index_of(coordinate)] {
            canvas.fill_placeholder(spec.region_of(coordinate));
            failed += 1;
        }
    }

    persist(canvas, output_path).await?;

    info!(
        identifier = spec.identifier(),
        total_tiles = total,
        placed_tiles = placed,
        failed_tiles = failed,
        output = %output_path.display(),
        "Canvas assembled"
    );

    Ok(AssemblyReport {
        identifier: spec.identifier().to_string(),
        total_tiles: total,
        placed_tiles: placed,
        failed_tiles: failed,
        output_path: output_path.to_path_buf(),
    })
}

/// Assemble entirely from the disk cache, without touching the network.
///
/// Tiles missing from the cache (or cached but undecodable) become
/// placeholders, exactly as failed fetches would.
pub async fn assemble_from_cache(
    spec: &GridSpec,
    cache: Arc<TileCache>,
    output_path: &Path,
    progress: Option<&ProgressSender>,
) -> Result<AssemblyReport, AssemblyError> {
    let (tx, rx) = mpsc::channel(16);
    let reader_spec = spec.clone();

    tokio::spawn(async move {
        for coordinate in reader_spec.coordinates() {
            let status = match cache.get(reader_spec.identifier(), coordinate).await {
                Some(bytes) => match decode_tile(&bytes) {
                    Ok(buffer) => TileStatus::Fetched(buffer),
                    Err(e) => TileStatus::DecodeFailed(e.to_string()),
                },
                None => TileStatus::FetchFailed {
                    attempts: 0,
                    error: "not in cache".to_string(),
                },
            };
            if tx.send(TileResult { coordinate, status }).await.is_err() {
                break;
            }
        }
    });

    assemble(spec, rx, output_path, progress).await
}

/// Encode and write the canvas on the blocking pool.
async fn persist(canvas: Canvas, output_path: &Path) -> Result<(), AssemblyError> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AssemblyError::Persist {
                    path: output_path.to_path_buf(),
                    message: e.to_string(),
                })?;
        }
    }

    let image = canvas.into_image();
    let path = output_path.to_path_buf();
    let save_path = path.clone();

    tokio::task::spawn_blocking(move || image.save(&save_path))
        .await
        .map_err(|e| AssemblyError::Internal(format!("encode task failed: {}", e)))?
        .map_err(|e| AssemblyError::Persist {
            path,
            message: e.to_string(),
        })
}

fn emit(progress: Option<&ProgressSender>, event: ProgressEvent) {
    if let Some(sender) = progress {
        let _ = sender.send(event);
    }
}
