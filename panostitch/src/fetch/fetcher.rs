//! Worker-pool tile fetcher.

use super::backoff::BackoffPolicy;
use super::result::{TileResult, TileStatus};
use crate::cache::TileCache;
use crate::decode::decode_tile;
use crate::grid::{GridSpec, TileCoordinate};
use crate::source::TileSource;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Configuration for the fetch stage.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Number of concurrent fetch workers.
    pub workers: usize,
    /// Per-attempt request timeout. Exceeding it costs an attempt, nothing
    /// more.
    pub request_timeout: Duration,
    /// Retry schedule for transient failures.
    pub backoff: BackoffPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: 12,
            request_timeout: Duration::from_secs(10),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Concurrent tile fetcher over a [`TileSource`].
///
/// `fetch_all` claims coordinates in deterministic row-major order through
/// an atomic cursor, so retry logs are reproducible across runs even though
/// completion order is not. Workers never block on each other; the stream
/// of results is finite and not restartable.
pub struct TileFetcher<S: TileSource> {
    source: Arc<S>,
    cache: Option<Arc<TileCache>>,
    config: FetchConfig,
}

impl<S: TileSource> TileFetcher<S> {
    pub fn new(source: Arc<S>, config: FetchConfig) -> Self {
        Self {
            source,
            cache: None,
            config,
        }
    }

    /// Attach a disk cache. Cached tiles that still decode skip the network
    /// entirely; fetched bytes are written back for idempotent re-runs.
    pub fn with_cache(mut self, cache: Arc<TileCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Fetch every tile in the grid, streaming one result per coordinate.
    ///
    /// Completion order is unspecified. On cancellation workers stop
    /// claiming new coordinates and abandon in-flight waits promptly;
    /// coordinates never claimed produce no result, which the assembly side
    /// treats as failed.
    pub fn fetch_all(
        &self,
        spec: &GridSpec,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<TileResult> {
        let coordinates: Arc<Vec<TileCoordinate>> = Arc::new(spec.coordinates().collect());
        let cursor = Arc::new(AtomicUsize::new(0));
        let workers = self.config.workers.max(1).min(coordinates.len().max(1));
        let (tx, rx) = mpsc::channel(workers * 2);

        debug!(
            identifier = spec.identifier(),
            tiles = coordinates.len(),
            workers,
            "Starting tile fetch"
        );

        for _ in 0..workers {
            let coordinates = Arc::clone(&coordinates);
            let cursor = Arc::clone(&cursor);
            let source = Arc::clone(&self.source);
            let cache = self.cache.clone();
            let config = self.config.clone();
            let cancel = cancel.clone();
            let tx = tx.clone();
            let identifier = spec.identifier().to_string();
            let level = spec.level();

            tokio::spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }

                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(&coordinate) = coordinates.get(index) else {
                        break;
                    };

                    let status = fetch_one(
                        source.as_ref(),
                        cache.as_deref(),
                        &config,
                        &identifier,
                        coordinate,
                        level,
                        &cancel,
                    )
                    .await;

                    let result = TileResult { coordinate, status };
                    if tx.send(result).await.is_err() {
                        // Receiver gone; nothing left to produce for.
                        break;
                    }
                }
            });
        }

        rx
    }
}

/// Acquire a single tile: cache first, then the network with retries.
async fn fetch_one<S: TileSource>(
    source: &S,
    cache: Option<&TileCache>,
    config: &FetchConfig,
    identifier: &str,
    coordinate: TileCoordinate,
    level: u8,
    cancel: &CancellationToken,
) -> TileStatus {
    if let Some(cache) = cache {
        if let Some(bytes) = cache.get(identifier, coordinate).await {
            match decode_tile(&bytes) {
                Ok(buffer) => {
                    trace!(identifier, coordinate = %coordinate, "Tile served from cache");
                    return TileStatus::Fetched(buffer);
                }
                Err(e) => {
                    debug!(
                        identifier,
                        coordinate = %coordinate,
                        error = %e,
                        "Corrupt cache entry, refetching"
                    );
                }
            }
        }
    }

    let mut last_error = String::new();
    for attempt in 1..=config.backoff.max_attempts {
        if cancel.is_cancelled() {
            return TileStatus::FetchFailed {
                attempts: attempt - 1,
                error: "cancelled".to_string(),
            };
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return TileStatus::FetchFailed {
                    attempts: attempt - 1,
                    error: "cancelled".to_string(),
                };
            }
            outcome = tokio::time::timeout(
                config.request_timeout,
                source.fetch_tile(identifier, coordinate, level),
            ) => outcome,
        };

        match outcome {
            Ok(Ok(bytes)) => {
                if let Some(cache) = cache {
                    if let Err(e) = cache.put(identifier, coordinate, &bytes).await {
                        warn!(
                            identifier,
                            coordinate = %coordinate,
                            error = %e,
                            "Cache write failed"
                        );
                    }
                }

                return match decode_tile(&bytes) {
                    Ok(buffer) => TileStatus::Fetched(buffer),
                    Err(e) => {
                        warn!(
                            identifier,
                            coordinate = %coordinate,
                            error = %e,
                            "Tile fetched but undecodable"
                        );
                        TileStatus::DecodeFailed(e.to_string())
                    }
                };
            }
            Ok(Err(e)) => {
                if source.is_absent(&e) {
                    // Authoritative absence; no retry can change it.
                    return TileStatus::FetchFailed {
                        attempts: attempt,
                        error: e.to_string(),
                    };
                }
                last_error = e.to_string();
                if !e.is_retryable() {
                    return TileStatus::FetchFailed {
                        attempts: attempt,
                        error: last_error,
                    };
                }
            }
            Err(_) => {
                last_error = "timeout".to_string();
            }
        }

        if attempt < config.backoff.max_attempts {
            let delay = config.backoff.delay_for(attempt);
            trace!(
                identifier,
                coordinate = %coordinate,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "Retrying tile fetch"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return TileStatus::FetchFailed {
                        attempts: attempt,
                        error: "cancelled".to_string(),
                    };
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    TileStatus::FetchFailed {
        attempts: config.backoff.max_attempts,
        error: last_error,
    }
}
