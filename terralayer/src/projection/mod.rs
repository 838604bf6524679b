//! Map projections and projection-aware resampling.
//!
//! Projected space is measured in blocks. A projection maps longitude to
//! `x` and latitude to `z` independently; `blocks_x` follows from the
//! configured meters per block and the equatorial circumference.
//!
//! ```text
//!   GeoView (blocks) ──lon/lat──► density ──► LeveledRasterSampler::choose
//!                                                  │
//!   ResamplerFactory::create(scale) ◄── raster-space bounds / output shape
//!        │
//!        ▼
//!   extend(view) ──► sampler.get ──► Resampler::resample ──► output raster
//! ```
//!
//! Numeric rasters resample through [`InterpolationMode`]; enum rasters
//! through the jittered [`Voronoi`] resampler.

mod equirectangular;
mod interpolation;
mod layer;
mod mercator;
mod resampler;
mod voronoi;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

pub use equirectangular::Equirectangular;
pub use interpolation::{InterpolationFactory, InterpolationMode};
pub use layer::ResamplingLayer;
pub use mercator::Mercator;
pub use resampler::{ResampleParams, Resampler, ResamplerFactory};
pub use voronoi::{Voronoi, DEFAULT_JITTER_RADIUS, DEFAULT_JITTER_SEED};

use crate::executor::SharedExecutor;
use crate::layer::LeveledRasterSampler;
use crate::raster::{EnumRaster, IntRaster, RasterEnum};

/// Length of the equator in meters.
pub const EQUATOR_CIRCUMFERENCE: f64 = 40_075_017.0;

/// Errors constructing projections and resamplers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("meters per block must be positive and finite, got {0}")]
    InvalidMetersPerBlock(f64),

    #[error("jitter radius must be in range [0, 1), got {0}")]
    InvalidJitterRadius(f32),

    #[error("unknown projection type: {0}")]
    UnknownKind(String),
}

/// A projection whose axes are independent.
pub trait CylindricalProjection: Send + Sync {
    /// Longitude (degrees) to projected x.
    fn block_x(&self, lon: f64) -> f64;

    /// Latitude (degrees) to projected z. North is negative.
    fn block_z(&self, lat: f64) -> f64;

    /// Projected x to longitude (degrees).
    fn lon(&self, block_x: f64) -> f64;

    /// Projected z to latitude (degrees).
    fn lat(&self, block_z: f64) -> f64;

    fn meters_per_block(&self) -> f64;
}

pub(crate) fn blocks_x_for(meters_per_block: f64) -> Result<i64, ProjectionError> {
    if !(meters_per_block.is_finite() && meters_per_block > 0.0) {
        return Err(ProjectionError::InvalidMetersPerBlock(meters_per_block));
    }
    let blocks = (EQUATOR_CIRCUMFERENCE / meters_per_block).floor() as i64;
    if blocks < 2 {
        return Err(ProjectionError::InvalidMetersPerBlock(meters_per_block));
    }
    Ok(blocks)
}

/// Kinds of supported projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProjectionKind {
    #[default]
    Equirectangular,
    Mercator,
}

impl ProjectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectionKind::Equirectangular => "equirectangular",
            ProjectionKind::Mercator => "mercator",
        }
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectionKind {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equirectangular" => Ok(ProjectionKind::Equirectangular),
            "mercator" => Ok(ProjectionKind::Mercator),
            other => Err(ProjectionError::UnknownKind(other.to_string())),
        }
    }
}

/// A configured cylindrical projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Equirectangular(Equirectangular),
    Mercator(Mercator),
}

impl Projection {
    pub fn new(kind: ProjectionKind, meters_per_block: f64) -> Result<Self, ProjectionError> {
        Ok(match kind {
            ProjectionKind::Equirectangular => {
                Projection::Equirectangular(Equirectangular::new(meters_per_block)?)
            }
            ProjectionKind::Mercator => Projection::Mercator(Mercator::new(meters_per_block)?),
        })
    }

    pub fn kind(&self) -> ProjectionKind {
        match self {
            Projection::Equirectangular(_) => ProjectionKind::Equirectangular,
            Projection::Mercator(_) => ProjectionKind::Mercator,
        }
    }

    /// Layer resampling numeric rasters with the interpolation matching the
    /// requested scale.
    pub fn interpolated_layer<R: IntRaster>(
        &self,
        levels: LeveledRasterSampler<R>,
        executor: SharedExecutor,
    ) -> ResamplingLayer<R, InterpolationFactory> {
        ResamplingLayer::new(*self, InterpolationFactory, levels, executor)
    }

    /// Layer resampling enum rasters through `voronoi`.
    pub fn voronoi_layer<E: RasterEnum>(
        &self,
        levels: LeveledRasterSampler<EnumRaster<E>>,
        voronoi: Arc<Voronoi>,
        executor: SharedExecutor,
    ) -> ResamplingLayer<EnumRaster<E>, Arc<Voronoi>> {
        ResamplingLayer::new(*self, voronoi, levels, executor)
    }
}

impl CylindricalProjection for Projection {
    fn block_x(&self, lon: f64) -> f64 {
        match self {
            Projection::Equirectangular(p) => p.block_x(lon),
            Projection::Mercator(p) => p.block_x(lon),
        }
    }

    fn block_z(&self, lat: f64) -> f64 {
        match self {
            Projection::Equirectangular(p) => p.block_z(lat),
            Projection::Mercator(p) => p.block_z(lat),
        }
    }

    fn lon(&self, block_x: f64) -> f64 {
        match self {
            Projection::Equirectangular(p) => p.lon(block_x),
            Projection::Mercator(p) => p.lon(block_x),
        }
    }

    fn lat(&self, block_z: f64) -> f64 {
        match self {
            Projection::Equirectangular(p) => p.lat(block_z),
            Projection::Mercator(p) => p.lat(block_z),
        }
    }

    fn meters_per_block(&self) -> f64 {
        match self {
            Projection::Equirectangular(p) => p.meters_per_block(),
            Projection::Mercator(p) => p.meters_per_block(),
        }
    }
}
