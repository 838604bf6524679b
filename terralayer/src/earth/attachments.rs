//! The attachments making up an earth chunk.

use crate::geo::{Attachment, AttachmentError, AttachmentRegistry, AttachmentSet, GeoChunk};
use crate::raster::{EnumRaster, ShortRaster, UnsignedByteRaster};

use super::{Cover, RainfallRaster, SoilSuborder, TemperatureRaster};

/// Keys of every earth attachment, registered once per registry.
#[derive(Debug, Clone)]
pub struct EarthAttachmentKeys {
    pub elevation: Attachment<ShortRaster>,
    pub land_cover: Attachment<EnumRaster<Cover>>,
    pub cation_exchange_capacity: Attachment<UnsignedByteRaster>,
    pub organic_carbon_content: Attachment<ShortRaster>,
    pub soil_ph: Attachment<UnsignedByteRaster>,
    pub clay_content: Attachment<UnsignedByteRaster>,
    pub silt_content: Attachment<UnsignedByteRaster>,
    pub sand_content: Attachment<UnsignedByteRaster>,
    pub soil_suborder: Attachment<EnumRaster<SoilSuborder>>,
    pub mean_temperature: Attachment<TemperatureRaster>,
    pub min_temperature: Attachment<TemperatureRaster>,
    pub annual_rainfall: Attachment<RainfallRaster>,
}

impl EarthAttachmentKeys {
    /// Registers the earth attachments.
    ///
    /// # Errors
    ///
    /// Fails if any of the names is already taken in `registry`.
    pub fn register(registry: &mut AttachmentRegistry) -> Result<Self, AttachmentError> {
        Ok(Self {
            elevation: registry.register("elevation")?,
            land_cover: registry.register("land_cover")?,
            cation_exchange_capacity: registry.register("cation_exchange_capacity")?,
            organic_carbon_content: registry.register("organic_carbon_content")?,
            soil_ph: registry.register("soil_ph")?,
            clay_content: registry.register("clay_content")?,
            silt_content: registry.register("silt_content")?,
            sand_content: registry.register("sand_content")?,
            soil_suborder: registry.register("soil_suborder")?,
            mean_temperature: registry.register("mean_temperature")?,
            min_temperature: registry.register("min_temperature")?,
            annual_rainfall: registry.register("annual_rainfall")?,
        })
    }

    /// Set of every earth attachment.
    pub fn required_set(&self) -> AttachmentSet {
        AttachmentSet::new()
            .with(&self.elevation)
            .with(&self.land_cover)
            .with(&self.cation_exchange_capacity)
            .with(&self.organic_carbon_content)
            .with(&self.soil_ph)
            .with(&self.clay_content)
            .with(&self.silt_content)
            .with(&self.sand_content)
            .with(&self.soil_suborder)
            .with(&self.mean_temperature)
            .with(&self.min_temperature)
            .with(&self.annual_rainfall)
    }
}

/// A fully populated earth chunk.
#[derive(Debug, Clone)]
pub struct EarthAttachments {
    pub elevation: ShortRaster,
    pub land_cover: EnumRaster<Cover>,
    pub cation_exchange_capacity: UnsignedByteRaster,
    pub organic_carbon_content: ShortRaster,
    pub soil_ph: UnsignedByteRaster,
    pub clay_content: UnsignedByteRaster,
    pub silt_content: UnsignedByteRaster,
    pub sand_content: UnsignedByteRaster,
    pub soil_suborder: EnumRaster<SoilSuborder>,
    pub mean_temperature: TemperatureRaster,
    pub min_temperature: TemperatureRaster,
    pub annual_rainfall: RainfallRaster,
}

impl EarthAttachments {
    /// Extracts every attachment from `chunk`, or `None` if any is missing.
    pub fn from_chunk(chunk: GeoChunk, keys: &EarthAttachmentKeys) -> Option<Self> {
        let mut chunk = chunk.require_all(&keys.required_set())?;
        Some(Self {
            elevation: chunk.take(&keys.elevation)?,
            land_cover: chunk.take(&keys.land_cover)?,
            cation_exchange_capacity: chunk.take(&keys.cation_exchange_capacity)?,
            organic_carbon_content: chunk.take(&keys.organic_carbon_content)?,
            soil_ph: chunk.take(&keys.soil_ph)?,
            clay_content: chunk.take(&keys.clay_content)?,
            silt_content: chunk.take(&keys.silt_content)?,
            sand_content: chunk.take(&keys.sand_content)?,
            soil_suborder: chunk.take(&keys.soil_suborder)?,
            mean_temperature: chunk.take(&keys.mean_temperature)?,
            min_temperature: chunk.take(&keys.min_temperature)?,
            annual_rainfall: chunk.take(&keys.annual_rainfall)?,
        })
    }
}
