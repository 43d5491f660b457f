//! GigaPan tile source.

use super::http::AsyncHttpClient;
use super::types::{SourceError, TileSource};
use crate::grid::TileCoordinate;

const DEFAULT_BASE_URL: &str = "http://www.gigapan.org";

/// GigaPan panorama source.
///
/// Serves a KML size descriptor per panorama and addresses tiles by
/// `(identifier, level, row, column)`.
pub struct GigapanSource<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
}

impl<C: AsyncHttpClient> GigapanSource<C> {
    /// Creates a new source against the public GigaPan service.
    pub fn new(http_client: C) -> Self {
        Self::with_base_url(http_client, DEFAULT_BASE_URL.to_string())
    }

    /// Creates a new source with a custom base URL.
    ///
    /// Useful for testing or mirrors. Trailing slashes are trimmed.
    pub fn with_base_url(http_client: C, base_url: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn descriptor_url(&self, identifier: &str) -> String {
        format!("{}/gigapans/{}.kml", self.base_url, identifier)
    }

    fn tile_url(&self, identifier: &str, coordinate: TileCoordinate, level: u8) -> String {
        format!(
            "{}/get_ge_tile/{}/{}/{}/{}",
            self.base_url, identifier, level, coordinate.row, coordinate.col
        )
    }
}

impl<C: AsyncHttpClient + 'static> TileSource for GigapanSource<C> {
    async fn fetch_descriptor(&self, identifier: &str) -> Result<Vec<u8>, SourceError> {
        self.http_client.get(&self.descriptor_url(identifier)).await
    }

    async fn fetch_tile(
        &self,
        identifier: &str,
        coordinate: TileCoordinate,
        level: u8,
    ) -> Result<Vec<u8>, SourceError> {
        self.http_client
            .get(&self.tile_url(identifier, coordinate, level))
            .await
    }

    fn name(&self) -> &str {
        "gigapan"
    }

    fn max_level(&self) -> u8 {
        // Deepest level observed on the public service
        18
    }
}
