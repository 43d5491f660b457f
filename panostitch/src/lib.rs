//! Panostitch - panoramic tile retrieval and assembly
//!
//! This library resolves the tile grid behind a hosted panoramic image,
//! fetches the tiles concurrently, and stitches them into one contiguous
//! raster on disk.
//!
//! # High-Level API
//!
//! The [`pipeline::PipelineCoordinator`] sequences the whole run:
//!
//! ```ignore
//! use panostitch::config::Settings;
//! use panostitch::pipeline::PipelineCoordinator;
//! use panostitch::source::{AsyncReqwestClient, GigapanSource};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let settings = Settings::default();
//! let source = Arc::new(GigapanSource::new(AsyncReqwestClient::new()?));
//! let coordinator = PipelineCoordinator::new(source, settings.pipeline_config());
//!
//! let report = coordinator.run("42", CancellationToken::new()).await?;
//! println!("{} tiles, {} failed", report.total_tiles, report.failed_tiles);
//! ```

pub mod assemble;
pub mod cache;
pub mod config;
pub mod decode;
pub mod fetch;
pub mod grid;
pub mod logging;
pub mod pipeline;
pub mod queue;
pub mod source;

/// Version of the panostitch library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
