//! End-to-end pipeline tests against a programmable mock tile source.
//!
//! These tests exercise the full resolve → fetch → assemble path:
//! - grid resolution from a descriptor
//! - placement correctness for every tile
//! - placeholder substitution for failing tiles
//! - worker-pool order independence
//! - cache transparency across re-runs

use image::{Rgba, RgbaImage};
use panostitch::assemble::PLACEHOLDER;
use panostitch::cache::TileCache;
use panostitch::fetch::{BackoffPolicy, FetchConfig};
use panostitch::grid::TileCoordinate;
use panostitch::pipeline::{PipelineConfig, PipelineCoordinator};
use panostitch::source::{SourceError, TileSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Test Helpers
// =============================================================================

const TILE_SIZE: u32 = 256;

/// Deterministic fill color per coordinate, so placement is checkable.
fn tile_color(coordinate: TileCoordinate) -> Rgba<u8> {
    Rgba([
        10 + (coordinate.row as u8) * 100,
        10 + (coordinate.col as u8) * 100,
        40,
        255,
    ])
}

fn tile_png(coordinate: TileCoordinate) -> Vec<u8> {
    let img = RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, tile_color(coordinate));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn descriptor(width: u32, height: u32, tile_size: u32) -> Vec<u8> {
    format!(
        "<kml><GigapanPhoto><maxWidth>{}</maxWidth><maxHeight>{}</maxHeight>\
         <tileSize>{}</tileSize></GigapanPhoto></kml>",
        width, height, tile_size
    )
    .into_bytes()
}

/// Per-coordinate override of the default "serve the tile" behavior.
#[derive(Clone)]
enum Behavior {
    AlwaysFail,
    ServeGarbage,
    Hang,
}

/// Mock source serving a 2x2 grid of 256x256 tiles for identifier "42".
struct MockSource {
    descriptor: Vec<u8>,
    overrides: HashMap<(u32, u32), Behavior>,
    requests: AtomicU32,
}

impl MockSource {
    fn new() -> Self {
        Self {
            descriptor: descriptor(512, 512, TILE_SIZE),
            overrides: HashMap::new(),
            requests: AtomicU32::new(0),
        }
    }

    fn with(mut self, row: u32, col: u32, behavior: Behavior) -> Self {
        self.overrides.insert((row, col), behavior);
        self
    }

    fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl TileSource for MockSource {
    async fn fetch_descriptor(&self, _identifier: &str) -> Result<Vec<u8>, SourceError> {
        Ok(self.descriptor.clone())
    }

    async fn fetch_tile(
        &self,
        _identifier: &str,
        coordinate: TileCoordinate,
        _level: u8,
    ) -> Result<Vec<u8>, SourceError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.overrides.get(&(coordinate.row, coordinate.col)) {
            Some(Behavior::AlwaysFail) => Err(SourceError::Network("unreachable".into())),
            Some(Behavior::ServeGarbage) => Ok(b"not an image".to_vec()),
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(SourceError::Network("never happens".into()))
            }
            None => Ok(tile_png(coordinate)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn max_level(&self) -> u8 {
        1
    }
}

fn fast_fetch(workers: usize) -> FetchConfig {
    FetchConfig {
        workers,
        request_timeout: Duration::from_secs(5),
        backoff: BackoffPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            jitter: 0.0,
        },
    }
}

fn coordinator(
    source: Arc<MockSource>,
    output_dir: &std::path::Path,
    workers: usize,
) -> PipelineCoordinator<MockSource> {
    let config = PipelineConfig {
        fetch: fast_fetch(workers),
        output_dir: output_dir.to_path_buf(),
        output_extension: "png".to_string(),
        ..PipelineConfig::default()
    };
    PipelineCoordinator::new(source, config)
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn scenario_42_all_tiles_placed() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = coordinator(Arc::new(MockSource::new()), dir.path(), 8);

    let report = coordinator.run("42", CancellationToken::new()).await.unwrap();
    assert_eq!(report.total_tiles, 4);
    assert_eq!(report.failed_tiles, 0);

    let canvas = image::open(&report.output_path).unwrap().to_rgba8();
    assert_eq!(canvas.dimensions(), (512, 512));

    // Each tile sits at its grid-derived offset.
    for (x, y, row, col) in [(0, 0, 0, 0), (256, 0, 0, 1), (0, 256, 1, 0), (256, 256, 1, 1)] {
        assert_eq!(
            *canvas.get_pixel(x, y),
            tile_color(TileCoordinate { row, col }),
            "wrong tile at ({}, {})",
            x,
            y
        );
        // Also check the far corner of the tile's region
        assert_eq!(
            *canvas.get_pixel(x + 255, y + 255),
            tile_color(TileCoordinate { row, col })
        );
    }
}

#[tokio::test]
async fn scenario_42_failed_tile_becomes_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(MockSource::new().with(1, 1, Behavior::AlwaysFail));
    let coordinator = coordinator(source, dir.path(), 8);

    let report = coordinator.run("42", CancellationToken::new()).await.unwrap();
    assert_eq!(report.total_tiles, 4);
    assert_eq!(report.failed_tiles, 1);

    let canvas = image::open(&report.output_path).unwrap().to_rgba8();
    assert_eq!(canvas.dimensions(), (512, 512));

    // Placeholder fills exactly the failed tile's region.
    assert_eq!(*canvas.get_pixel(256, 256), PLACEHOLDER);
    assert_eq!(*canvas.get_pixel(511, 511), PLACEHOLDER);
    assert_eq!(
        *canvas.get_pixel(255, 255),
        tile_color(TileCoordinate { row: 0, col: 0 })
    );
    assert_eq!(
        *canvas.get_pixel(511, 255),
        tile_color(TileCoordinate { row: 0, col: 1 })
    );
}

#[tokio::test]
async fn mixed_failures_yield_exactly_k_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(
        MockSource::new()
            .with(0, 1, Behavior::AlwaysFail)
            .with(1, 0, Behavior::ServeGarbage),
    );
    let coordinator = coordinator(source, dir.path(), 4);

    let report = coordinator.run("42", CancellationToken::new()).await.unwrap();
    assert_eq!(report.failed_tiles, 2);
    assert_eq!(report.placed_tiles, 2);

    let canvas = image::open(&report.output_path).unwrap().to_rgba8();
    // Fetch failure and decode failure both land as placeholders...
    assert_eq!(*canvas.get_pixel(256, 0), PLACEHOLDER);
    assert_eq!(*canvas.get_pixel(0, 256), PLACEHOLDER);
    // ...while the healthy tiles are intact.
    assert_eq!(
        *canvas.get_pixel(0, 0),
        tile_color(TileCoordinate { row: 0, col: 0 })
    );
    assert_eq!(
        *canvas.get_pixel(256, 256),
        tile_color(TileCoordinate { row: 1, col: 1 })
    );
}

// =============================================================================
// Order independence
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_pool_size_does_not_change_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut outputs = Vec::new();

    for workers in [1usize, 8, 64] {
        let out = dir.path().join(format!("w{}", workers));
        let coordinator = coordinator(Arc::new(MockSource::new()), &out, workers);
        let report = coordinator.run("42", CancellationToken::new()).await.unwrap();
        outputs.push(std::fs::read(&report.output_path).unwrap());
    }

    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[1], outputs[2]);
}

// =============================================================================
// Cache behavior
// =============================================================================

#[tokio::test]
async fn cached_rerun_is_byte_identical_and_offline() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(TileCache::new(dir.path().join("cache")));

    // Fresh run with an empty cache.
    let source = Arc::new(MockSource::new());
    let fresh = coordinator(Arc::clone(&source), &dir.path().join("fresh"), 8)
        .with_cache(Arc::clone(&cache));
    let fresh_report = fresh.run("42", CancellationToken::new()).await.unwrap();
    assert_eq!(source.requests(), 4);

    // Re-run against a source that would fail every request: the cache
    // must satisfy everything.
    let offline_source = Arc::new(
        MockSource::new()
            .with(0, 0, Behavior::AlwaysFail)
            .with(0, 1, Behavior::AlwaysFail)
            .with(1, 0, Behavior::AlwaysFail)
            .with(1, 1, Behavior::AlwaysFail),
    );
    let rerun = coordinator(Arc::clone(&offline_source), &dir.path().join("rerun"), 8)
        .with_cache(Arc::clone(&cache));
    let rerun_report = rerun.run("42", CancellationToken::new()).await.unwrap();

    assert_eq!(rerun_report.failed_tiles, 0);
    assert_eq!(offline_source.requests(), 0);
    assert_eq!(
        std::fs::read(&fresh_report.output_path).unwrap(),
        std::fs::read(&rerun_report.output_path).unwrap()
    );
}

// =============================================================================
// Deadlines and cancellation
// =============================================================================

#[tokio::test]
async fn deadline_degrades_to_partial_composite() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(MockSource::new().with(1, 1, Behavior::Hang));
    let config = PipelineConfig {
        fetch: fast_fetch(4),
        output_dir: dir.path().to_path_buf(),
        output_extension: "png".to_string(),
        deadline: Some(Duration::from_millis(500)),
        ..PipelineConfig::default()
    };
    let coordinator = PipelineCoordinator::new(source, config);

    let report = coordinator.run("42", CancellationToken::new()).await.unwrap();

    // The hanging tile was cut off by the deadline; the rest landed.
    assert_eq!(report.failed_tiles, 1);
    assert_eq!(report.placed_tiles, 3);
    assert!(report.output_path.exists());

    let canvas = image::open(&report.output_path).unwrap().to_rgba8();
    assert_eq!(canvas.dimensions(), (512, 512));
    assert_eq!(*canvas.get_pixel(256, 256), PLACEHOLDER);
}
