//! Assemble command - build the composite from cached tiles, offline.

use crate::error::CliError;
use panostitch::assemble::assemble_from_cache;
use panostitch::cache::TileCache;
use panostitch::config::Settings;
use panostitch::grid::{GridResolver, GridSpec, ProbeConfig};
use panostitch::pipeline::PipelineError;
use panostitch::source::{AsyncReqwestClient, GigapanSource};
use std::sync::Arc;

/// Explicit grid dimensions, bypassing descriptor resolution.
///
/// All three must be given together; with none given, the descriptor is
/// fetched instead.
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
}

/// Run the assemble command.
///
/// Tiles missing from the cache become placeholders, so a partial fetch
/// still yields a composite.
pub async fn run(
    settings: &Settings,
    identifier: &str,
    dimensions: Option<Dimensions>,
) -> Result<(), CliError> {
    let spec = match dimensions {
        Some(d) => GridSpec::from_dimensions(identifier, d.width, d.height, d.tile_size)
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?,
        None => {
            let client =
                AsyncReqwestClient::with_timeout(settings.download.request_timeout_secs)
                    .map_err(CliError::Client)?;
            let source = Arc::new(GigapanSource::with_base_url(
                client,
                settings.source.base_url.clone(),
            ));
            GridResolver::new(source, ProbeConfig::default())
                .resolve(identifier)
                .await?
        }
    };

    let cache = Arc::new(TileCache::new(settings.cache.directory.clone()));
    let output_path = settings.output.directory.join(format!(
        "{}_assembled.{}",
        identifier, settings.output.format
    ));

    let report = assemble_from_cache(&spec, cache, &output_path, None)
        .await
        .map_err(PipelineError::from)?;

    if report.failed_tiles > 0 {
        println!(
            "{}: assembled with {} of {} tiles missing -> {}",
            identifier,
            report.failed_tiles,
            report.total_tiles,
            report.output_path.display()
        );
    } else {
        println!(
            "{}: assembled {} tiles -> {}",
            identifier,
            report.total_tiles,
            report.output_path.display()
        );
    }
    Ok(())
}
