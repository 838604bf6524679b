//! Earth datasets: elevation, land cover, soil and climate.
//!
//! ```text
//!   EarthTiles ──► one LeveledRasterSampler per dataset
//!        │
//!        ▼
//!   EarthLayers ──► one ResamplingLayer per dataset
//!        │              (interpolated, or Voronoi for classes)
//!        ▼
//!   GeoChunk ──► EarthAttachments
//! ```

mod attachments;
mod climate;
mod cover;
mod layers;
mod soil;
mod tiles;

use thiserror::Error;

use crate::geo::AttachmentError;
use crate::layer::LayerError;
use crate::loader::LoaderError;
use crate::projection::ProjectionError;

pub use attachments::{EarthAttachmentKeys, EarthAttachments};
pub use climate::{
    ClimateRasters, ClimateSamplers, ClimateSource, RainfallRaster, TemperatureRaster,
    CLIMATE_HEIGHT, CLIMATE_SHAPE, CLIMATE_WIDTH,
};
pub use cover::Cover;
pub use layers::EarthLayers;
pub use soil::{SoilOrder, SoilSuborder};
pub use tiles::{EarthTiles, CLIMATE_FILE};

/// Errors assembling the earth datasets.
#[derive(Debug, Error)]
pub enum EarthError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error("invalid projection settings: {0}")]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}
