//! Fetch command - download tiles into the cache without assembling.

use crate::error::CliError;
use panostitch::cache::TileCache;
use panostitch::config::Settings;
use panostitch::fetch::TileFetcher;
use panostitch::grid::{GridResolver, ProbeConfig};
use panostitch::source::{AsyncReqwestClient, GigapanSource};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Run the fetch command.
///
/// Resolves the grid, then drains the fetch stream so every tile lands in
/// the cache; decoded buffers are discarded. A later `assemble` run builds
/// the composite offline.
pub async fn run(
    settings: &Settings,
    identifier: &str,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let client = AsyncReqwestClient::with_timeout(settings.download.request_timeout_secs)
        .map_err(CliError::Client)?;
    let source = Arc::new(GigapanSource::with_base_url(
        client,
        settings.source.base_url.clone(),
    ));
    let cache = Arc::new(TileCache::new(settings.cache.directory.clone()));

    let resolver = GridResolver::new(Arc::clone(&source), ProbeConfig::default());
    let spec = resolver.resolve(identifier).await?;
    println!(
        "{}: {} rows x {} columns, {} tiles",
        identifier,
        spec.rows(),
        spec.columns(),
        spec.tile_count()
    );

    let fetcher =
        TileFetcher::new(source, settings.fetch_config()).with_cache(Arc::clone(&cache));
    let mut results = fetcher.fetch_all(&spec, cancel);

    let mut fetched = 0u64;
    let mut failed = 0u64;
    while let Some(result) = results.recv().await {
        if result.is_fetched() {
            fetched += 1;
        } else {
            failed += 1;
            eprintln!("tile {} failed", result.coordinate);
        }
    }

    println!(
        "{}: {} tiles cached, {} failed (cache: {})",
        identifier,
        fetched,
        failed,
        cache.root().display()
    );
    Ok(())
}
