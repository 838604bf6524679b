//! Projected earth layers assembled into chunks.

use std::sync::Arc;

use futures::future::FutureExt;
use tracing::info;

use super::{
    Cover, EarthAttachmentKeys, EarthError, EarthTiles, RainfallRaster, SoilSuborder,
    TemperatureRaster,
};
use crate::config::ConfigFile;
use crate::executor::SharedExecutor;
use crate::geo::{GeoChunk, GeoView};
use crate::layer::{GeoLayer, LeveledRasterSampler};
use crate::loader::LoadFuture;
use crate::projection::{Projection, Voronoi};
use crate::raster::{EnumRaster, RasterShape, ShortRaster, UnsignedByteRaster};

type Layer<R> = Arc<dyn GeoLayer<R>>;

/// Every earth dataset resampled into one projection.
///
/// Numeric datasets are interpolated; land cover and soil suborders are
/// resampled through [`Voronoi`] so that no intermediate classes appear.
pub struct EarthLayers {
    keys: EarthAttachmentKeys,
    elevation: Layer<ShortRaster>,
    land_cover: Layer<EnumRaster<Cover>>,
    cation_exchange_capacity: Layer<UnsignedByteRaster>,
    organic_carbon_content: Layer<ShortRaster>,
    soil_ph: Layer<UnsignedByteRaster>,
    clay_content: Layer<UnsignedByteRaster>,
    silt_content: Layer<UnsignedByteRaster>,
    sand_content: Layer<UnsignedByteRaster>,
    soil_suborder: Layer<EnumRaster<SoilSuborder>>,
    mean_temperature: Layer<TemperatureRaster>,
    min_temperature: Layer<TemperatureRaster>,
    annual_rainfall: Layer<RainfallRaster>,
}

impl EarthLayers {
    pub fn new(
        tiles: EarthTiles,
        projection: Projection,
        voronoi: Arc<Voronoi>,
        keys: EarthAttachmentKeys,
        executor: SharedExecutor,
    ) -> Self {
        let EarthTiles {
            elevation,
            land_cover,
            cation_exchange_capacity,
            organic_carbon_content,
            soil_ph,
            clay_content,
            silt_content,
            sand_content,
            soil_suborder,
            climate,
            ..
        } = tiles;

        let interpolated = |levels: LeveledRasterSampler<UnsignedByteRaster>| {
            Arc::new(projection.interpolated_layer(levels, Arc::clone(&executor)))
                as Layer<UnsignedByteRaster>
        };

        Self {
            elevation: Arc::new(projection.interpolated_layer(elevation, Arc::clone(&executor))),
            land_cover: Arc::new(projection.voronoi_layer(
                land_cover,
                Arc::clone(&voronoi),
                Arc::clone(&executor),
            )),
            cation_exchange_capacity: interpolated(cation_exchange_capacity),
            organic_carbon_content: Arc::new(
                projection.interpolated_layer(organic_carbon_content, Arc::clone(&executor)),
            ),
            soil_ph: interpolated(soil_ph),
            clay_content: interpolated(clay_content),
            silt_content: interpolated(silt_content),
            sand_content: interpolated(sand_content),
            soil_suborder: Arc::new(projection.voronoi_layer(
                soil_suborder,
                voronoi,
                Arc::clone(&executor),
            )),
            mean_temperature: Arc::new(
                projection.interpolated_layer(climate.mean_temperature, Arc::clone(&executor)),
            ),
            min_temperature: Arc::new(
                projection.interpolated_layer(climate.min_temperature, Arc::clone(&executor)),
            ),
            annual_rainfall: Arc::new(
                projection.interpolated_layer(climate.annual_rainfall, Arc::clone(&executor)),
            ),
            keys,
        }
    }

    /// Builds the layers with the configured projection and Voronoi jitter.
    ///
    /// # Errors
    ///
    /// Fails if the projection scale or the jitter radius is invalid.
    pub fn from_config(
        config: &ConfigFile,
        tiles: EarthTiles,
        keys: EarthAttachmentKeys,
        executor: SharedExecutor,
    ) -> Result<Self, EarthError> {
        let projection =
            Projection::new(config.projection.kind, config.projection.meters_per_block)?;
        let voronoi = Arc::new(Voronoi::new(config.voronoi.radius, config.voronoi.seed)?);

        info!(
            projection = %config.projection.kind,
            meters_per_block = config.projection.meters_per_block,
            voronoi_radius = config.voronoi.radius,
            "earth layers ready"
        );

        Ok(Self::new(tiles, projection, voronoi, keys, executor))
    }

    pub fn keys(&self) -> &EarthAttachmentKeys {
        &self.keys
    }
}

impl GeoLayer<GeoChunk> for EarthLayers {
    fn get(&self, view: GeoView, output: RasterShape) -> LoadFuture<GeoChunk> {
        let keys = &self.keys;
        let builder = GeoChunk::builder()
            .put(&keys.elevation, self.elevation.get(view, output))
            .put(&keys.land_cover, self.land_cover.get(view, output))
            .put(
                &keys.cation_exchange_capacity,
                self.cation_exchange_capacity.get(view, output),
            )
            .put(
                &keys.organic_carbon_content,
                self.organic_carbon_content.get(view, output),
            )
            .put(&keys.soil_ph, self.soil_ph.get(view, output))
            .put(&keys.clay_content, self.clay_content.get(view, output))
            .put(&keys.silt_content, self.silt_content.get(view, output))
            .put(&keys.sand_content, self.sand_content.get(view, output))
            .put(&keys.soil_suborder, self.soil_suborder.get(view, output))
            .put(&keys.mean_temperature, self.mean_temperature.get(view, output))
            .put(&keys.min_temperature, self.min_temperature.get(view, output))
            .put(&keys.annual_rainfall, self.annual_rainfall.get(view, output));

        async move { Some(builder.build().await) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use crate::format::RasterWriter;
    use crate::geo::AttachmentRegistry;
    use crate::loader::from_fn;
    use crate::projection::{ProjectionKind, EQUATOR_CIRCUMFERENCE};
    use crate::raster::{Raster, RasterEnum};
    use bytes::Bytes;
    use tempfile::TempDir;

    const TILE: usize = 4;

    /// Short tiles everywhere except the categorical routes; the climate
    /// file never decodes.
    fn datasets(cache_root: &TempDir) -> (ConfigFile, EarthTiles) {
        let mut config = ConfigFile::default();
        config.cache.directory = cache_root.path().to_path_buf();
        config.download.endpoint = "http://tiles.test".to_string();
        config.tiles.tile_size = TILE;
        // One block per degree
        config.projection.meters_per_block = EQUATOR_CIRCUMFERENCE / 360.5;

        let shape = RasterShape::new(TILE, TILE);
        let writer = RasterWriter::new();
        let shorts = Bytes::from(
            writer
                .write(&ShortRaster::wrap(shape, vec![42; shape.size()]))
                .unwrap(),
        );
        let ids = Bytes::from(
            writer
                .write(&UnsignedByteRaster::filled(shape, Cover::Water.id()))
                .unwrap(),
        );
        let http = from_fn(move |url: String| {
            if url.contains("/landcover/") || url.contains("/usda/") {
                Some(ids.clone())
            } else {
                Some(shorts.clone())
            }
        });

        let tiles = EarthTiles::with_http_loader(&config, http, InlineExecutor::shared()).unwrap();
        (config, tiles)
    }

    #[tokio::test]
    async fn test_chunk_holds_every_available_attachment() {
        let root = TempDir::new().unwrap();
        let (config, tiles) = datasets(&root);
        let keys = EarthAttachmentKeys::register(&mut AttachmentRegistry::new()).unwrap();
        let layers =
            EarthLayers::from_config(&config, tiles, keys, InlineExecutor::shared()).unwrap();

        let chunk = layers.get_exact(GeoView::new(0, 0, 15, 15)).await.unwrap();
        let keys = layers.keys();

        assert_eq!(chunk.len(), 9);
        assert!(!chunk.contains(&keys.mean_temperature));

        let elevation = chunk.get(&keys.elevation).unwrap();
        assert_eq!(elevation.shape(), RasterShape::new(16, 16));
        assert_eq!(elevation.get(0, 0), 42);
        assert_eq!(elevation.get(15, 15), 42);

        let cover = chunk.get(&keys.land_cover).unwrap();
        assert_eq!(cover.get(7, 7), Cover::Water);
        // 210 is not a suborder id
        let suborder = chunk.get(&keys.soil_suborder).unwrap();
        assert_eq!(suborder.get(0, 0), SoilSuborder::DEFAULT);

        assert_eq!(chunk.get(&keys.clay_content).unwrap().get(3, 3), 42);
    }

    #[tokio::test]
    async fn test_invalid_projection_rejected() {
        let root = TempDir::new().unwrap();
        let (mut config, tiles) = datasets(&root);
        config.projection.kind = ProjectionKind::Mercator;
        config.projection.meters_per_block = EQUATOR_CIRCUMFERENCE;
        let keys = EarthAttachmentKeys::register(&mut AttachmentRegistry::new()).unwrap();

        let result = EarthLayers::from_config(&config, tiles, keys, InlineExecutor::shared());

        assert!(matches!(result, Err(EarthError::Projection(_))));
    }
}
