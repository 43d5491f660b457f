//! Tile grid resolution.
//!
//! This module determines the shape of a panorama's tile grid: how many rows
//! and columns exist, how large each tile is, and which detail level the
//! tiles are addressed at. The [`GridResolver`] prefers the source's size
//! descriptor and falls back to boundary probing when no descriptor is
//! available.

mod descriptor;
mod resolver;
mod spec;

pub use descriptor::{parse_descriptor, DescriptorError, SizeDescriptor};
pub use resolver::{GridResolver, ProbeConfig, ResolutionError};
pub use spec::{GridSpec, GridSpecError, TileCoordinate, TileRegion};
