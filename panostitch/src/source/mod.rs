//! Tile source abstraction.
//!
//! A [`TileSource`] knows how a hosting service addresses a panorama's
//! descriptor and tiles, performs the fetches, and classifies which errors
//! mean "past the grid boundary". The exact address scheme is a
//! source-specific detail, so everything downstream (resolver, fetcher,
//! coordinator) is generic over the trait.

mod gigapan;
mod http;
mod types;

pub use gigapan::GigapanSource;
pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use types::{SourceError, TileSource};

#[cfg(test)]
pub use http::tests::MockHttpClient;
