//! Sampling interfaces and level-of-detail selection.
//!
//! - [`RasterSampler`]: produces the raster under a view at its native
//!   resolution (one pyramid level).
//! - [`GeoLayer`]: produces a value for a view at an arbitrary output shape.
//! - [`LeveledRasterSampler`]: picks the pyramid level best matching a
//!   requested sampling density.

mod leveled;
mod sampler;

pub use leveled::{
    LayerError, LeveledRasterSampler, DEFAULT_MAX_DOWNSAMPLE, DEFAULT_MAX_UPSAMPLE,
};
pub use sampler::{GeoLayer, RasterSampler, SharedSampler};
