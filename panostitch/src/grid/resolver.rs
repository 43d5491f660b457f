//! Grid resolution: descriptor fetch with probing fallback.

use super::descriptor::parse_descriptor;
use super::spec::{GridSpec, TileCoordinate};
use crate::decode::decode_tile;
use crate::source::TileSource;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that abort resolution for an identifier.
///
/// Per-tile trouble downstream is recoverable; these are not. A run that
/// cannot establish its grid has nothing to fetch.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The source has no panorama under this identifier.
    #[error("panorama {identifier} not found at source")]
    NotFound { identifier: String },

    /// Probing could not converge on a grid shape within budget.
    #[error("could not determine grid for {identifier}: {reason}")]
    Ambiguous { identifier: String, reason: String },
}

/// Tuning for the probing fallback.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Total request budget across all probes for one identifier.
    pub max_probes: u32,
    /// Consecutive authoritative-absent responses required before an index
    /// is classified as past the boundary. One negative is never enough:
    /// a transient failure must not look like a missing tile.
    pub confirmations: u32,
    /// Transient failures tolerated in a row before giving up on a probe.
    pub transient_retries: u32,
    /// Delay between retries of a transiently failing probe.
    pub retry_delay: Duration,
    /// Largest per-axis extent the doubling phase will consider.
    pub max_extent: u32,
    /// Detail level to probe at; defaults to the source's maximum.
    pub level: Option<u8>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_probes: 96,
            confirmations: 2,
            transient_retries: 3,
            retry_delay: Duration::from_millis(200),
            max_extent: 4096,
            level: None,
        }
    }
}

/// Verdict of a single confirmed probe.
enum ProbeVerdict {
    Present(Vec<u8>),
    Absent,
}

enum Axis {
    Columns,
    Rows,
}

struct ProbeBudget {
    remaining: u32,
}

/// Resolves an identifier to a [`GridSpec`].
///
/// The source's size descriptor is authoritative when available. Without
/// one, the resolver walks each axis outward until the boundary is
/// confirmed, doubling then bisecting, so the probe count stays logarithmic
/// in the grid extent.
pub struct GridResolver<S: TileSource> {
    source: Arc<S>,
    probe: ProbeConfig,
}

impl<S: TileSource> GridResolver<S> {
    pub fn new(source: Arc<S>, probe: ProbeConfig) -> Self {
        Self { source, probe }
    }

    /// Determine the tile grid for an identifier.
    pub async fn resolve(&self, identifier: &str) -> Result<GridSpec, ResolutionError> {
        match self.source.fetch_descriptor(identifier).await {
            Ok(bytes) => match parse_descriptor(&bytes) {
                Ok(d) => {
                    debug!(
                        identifier,
                        width = d.width,
                        height = d.height,
                        tile_size = d.tile_size,
                        "Resolved grid from size descriptor"
                    );
                    return GridSpec::from_dimensions(identifier, d.width, d.height, d.tile_size)
                        .map_err(|e| ResolutionError::Ambiguous {
                            identifier: identifier.to_string(),
                            reason: format!("descriptor yields invalid grid: {}", e),
                        });
                }
                Err(e) => {
                    warn!(identifier, error = %e, "Unusable size descriptor, probing instead");
                }
            },
            // A missing descriptor is not proof the panorama is missing:
            // some sources publish no metadata at all. Probing settles it.
            Err(e) => {
                debug!(identifier, error = %e, "Descriptor unavailable, probing instead");
            }
        }

        self.resolve_by_probing(identifier).await
    }

    async fn resolve_by_probing(&self, identifier: &str) -> Result<GridSpec, ResolutionError> {
        let level = self.probe.level.unwrap_or_else(|| self.source.max_level());
        let mut budget = ProbeBudget {
            remaining: self.probe.max_probes,
        };

        // The origin tile establishes both existence and tile dimensions.
        let origin = TileCoordinate { row: 0, col: 0 };
        let (tile_width, tile_height) =
            match self.probe_tile(identifier, origin, level, &mut budget).await? {
                ProbeVerdict::Absent => {
                    return Err(ResolutionError::NotFound {
                        identifier: identifier.to_string(),
                    })
                }
                ProbeVerdict::Present(bytes) => {
                    let buffer =
                        decode_tile(&bytes).map_err(|e| ResolutionError::Ambiguous {
                            identifier: identifier.to_string(),
                            reason: format!("origin tile undecodable: {}", e),
                        })?;
                    (buffer.width(), buffer.height())
                }
            };

        let columns = self
            .probe_extent(identifier, level, Axis::Columns, &mut budget)
            .await?;
        let rows = self
            .probe_extent(identifier, level, Axis::Rows, &mut budget)
            .await?;

        debug!(
            identifier,
            rows,
            columns,
            tile_width,
            tile_height,
            level,
            probes_spent = self.probe.max_probes - budget.remaining,
            "Resolved grid by probing"
        );

        GridSpec::from_tile_grid(identifier, rows, columns, tile_width, tile_height, level)
            .map_err(|e| ResolutionError::Ambiguous {
                identifier: identifier.to_string(),
                reason: format!("probed shape invalid: {}", e),
            })
    }

    /// Walk one axis outward to find its tile count.
    ///
    /// Doubling phase finds an absent index, then bisection narrows the
    /// boundary. Index 0 is known present on entry.
    async fn probe_extent(
        &self,
        identifier: &str,
        level: u8,
        axis: Axis,
        budget: &mut ProbeBudget,
    ) -> Result<u32, ResolutionError> {
        let coord_at = |index: u32| match axis {
            Axis::Columns => TileCoordinate { row: 0, col: index },
            Axis::Rows => TileCoordinate { row: index, col: 0 },
        };

        let mut lo = 0u32;
        let mut hi = 1u32;
        loop {
            if hi > self.probe.max_extent {
                return Err(ResolutionError::Ambiguous {
                    identifier: identifier.to_string(),
                    reason: format!("no boundary found within {} tiles", self.probe.max_extent),
                });
            }
            match self.probe_tile(identifier, coord_at(hi), level, budget).await? {
                ProbeVerdict::Present(_) => {
                    lo = hi;
                    hi *= 2;
                }
                ProbeVerdict::Absent => break,
            }
        }

        // Boundary lies in (lo, hi]: present at lo, confirmed absent at hi.
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            match self.probe_tile(identifier, coord_at(mid), level, budget).await? {
                ProbeVerdict::Present(_) => lo = mid,
                ProbeVerdict::Absent => hi = mid,
            }
        }

        Ok(hi)
    }

    /// Probe one coordinate until the verdict is trustworthy.
    ///
    /// A success is conclusive immediately. Absence requires
    /// `confirmations` consecutive authoritative-absent responses; any
    /// transient failure resets the streak and is retried after a delay.
    async fn probe_tile(
        &self,
        identifier: &str,
        coordinate: TileCoordinate,
        level: u8,
        budget: &mut ProbeBudget,
    ) -> Result<ProbeVerdict, ResolutionError> {
        let mut absent_streak = 0;
        let mut transient_streak = 0;

        loop {
            if budget.remaining == 0 {
                return Err(ResolutionError::Ambiguous {
                    identifier: identifier.to_string(),
                    reason: format!("probe budget of {} exhausted", self.probe.max_probes),
                });
            }
            budget.remaining -= 1;

            match self.source.fetch_tile(identifier, coordinate, level).await {
                Ok(bytes) => return Ok(ProbeVerdict::Present(bytes)),
                Err(e) if self.source.is_absent(&e) => {
                    absent_streak += 1;
                    if absent_streak >= self.probe.confirmations {
                        return Ok(ProbeVerdict::Absent);
                    }
                }
                Err(e) => {
                    absent_streak = 0;
                    transient_streak += 1;
                    debug!(
                        identifier,
                        coordinate = %coordinate,
                        error = %e,
                        "Transient probe failure"
                    );
                    if transient_streak > self.probe.transient_retries {
                        return Err(ResolutionError::Ambiguous {
                            identifier: identifier.to_string(),
                            reason: format!(
                                "probe at {} kept failing transiently: {}",
                                coordinate, e
                            ),
                        });
                    }
                    tokio::time::sleep(self.probe.retry_delay).await;
                }
            }
        }
    }
}
