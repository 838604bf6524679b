//! Wiring of the remote earth datasets into leveled samplers.
//!
//! Every dataset level is a tile grid of `2·3^level × 3^level` tiles. A tile
//! travels through the tiers below; all HTTP requests share one limiter.
//!
//! ```text
//! TileKey ──► TileCache ──► RasterReader ──► FileCacher ──► limiter ──► HTTP
//!             (memory)      (decode)         <root>/<dir>/<level>/<x>/<y>
//! ```

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use super::{ClimateRasters, ClimateSamplers, ClimateSource, Cover, EarthError, SoilSuborder};
use crate::cache::{single_file_path, tile_path, FileCacher, TileCache};
use crate::config::ConfigFile;
use crate::executor::{BlockingExecutorExt, SharedExecutor};
use crate::format::{FormatRaster, RasterReader};
use crate::layer::{LeveledRasterSampler, SharedSampler};
use crate::loader::{
    from_async_fn, CacherExt, ConcurrencyLimiter, HttpLoader, Loader, LoaderExt, SharedLoader,
};
use crate::raster::{EnumRaster, Raster, RasterEnum, RasterShape, ShortRaster, UnsignedByteRaster};
use crate::tile::{TileKey, TileMap, TiledRasterSampler};

/// Name of the single-file climate dataset, both remotely and on disk.
pub const CLIMATE_FILE: &str = "climatic_variables.xz";

const ELEVATION_LEVELS: RangeInclusive<u32> = 0..=6;
const DATASET_LEVELS: RangeInclusive<u32> = 0..=4;

/// Leveled samplers over every earth dataset.
pub struct EarthTiles {
    pub elevation: LeveledRasterSampler<ShortRaster>,
    pub land_cover: LeveledRasterSampler<EnumRaster<Cover>>,
    pub cation_exchange_capacity: LeveledRasterSampler<UnsignedByteRaster>,
    pub organic_carbon_content: LeveledRasterSampler<ShortRaster>,
    pub soil_ph: LeveledRasterSampler<UnsignedByteRaster>,
    pub clay_content: LeveledRasterSampler<UnsignedByteRaster>,
    pub silt_content: LeveledRasterSampler<UnsignedByteRaster>,
    pub sand_content: LeveledRasterSampler<UnsignedByteRaster>,
    pub soil_suborder: LeveledRasterSampler<EnumRaster<SoilSuborder>>,
    pub climate: ClimateSamplers,
    tile_cache: TileCache,
    limiter: Arc<ConcurrencyLimiter>,
}

impl EarthTiles {
    /// Builds the datasets served from the configured endpoint.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be created.
    pub fn from_config(config: &ConfigFile, executor: SharedExecutor) -> Result<Self, EarthError> {
        let http = HttpLoader::new(config.download.timeout(), &config.download.user_agent)?;
        Self::with_http_loader(config, http, executor)
    }

    /// Builds the datasets on top of `http`, a loader from URL to body.
    pub fn with_http_loader<L>(
        config: &ConfigFile,
        http: L,
        executor: SharedExecutor,
    ) -> Result<Self, EarthError>
    where
        L: Loader<String, Bytes>,
    {
        let limiter = Arc::new(ConcurrencyLimiter::new(config.download.concurrency, "http"));
        let tile_cache = TileCache::new(config.cache.tile_expiry(), config.cache.tile_capacity);
        let size = config.tiles.tile_size;

        let sources = DatasetSources {
            http: http.limited(Arc::clone(&limiter)).shared(),
            files: FileCacher::new(),
            cache_root: config.cache.directory.clone(),
            endpoint: config.download.endpoint.clone(),
            tile_cache: tile_cache.clone(),
            tile_shape: RasterShape::new(size, size),
            max_upsample: config.sampling.max_upsample,
            max_downsample: config.sampling.max_downsample,
            executor,
        };

        let tiles = Self {
            elevation: sources.leveled(ELEVATION_LEVELS, |level| {
                sources.raster::<ShortRaster>("elevation2", "elevation", level)
            })?,
            land_cover: sources.leveled(DATASET_LEVELS, |level| {
                sources.enums("landcover", "landcover", level, Cover::by_id)
            })?,
            cation_exchange_capacity: sources.soil_property("cec", "soil/cec")?,
            organic_carbon_content: sources.leveled(DATASET_LEVELS, |level| {
                sources.raster::<ShortRaster>("occ", "soil/occ", level)
            })?,
            soil_ph: sources.soil_property("ph", "soil/ph")?,
            clay_content: sources.soil_property("clay", "soil/clay")?,
            silt_content: sources.soil_property("silt", "soil/silt")?,
            sand_content: sources.soil_property("sand", "soil/sand")?,
            soil_suborder: sources.leveled(DATASET_LEVELS, |level| {
                sources.enums("usda", "soil/usda", level, SoilSuborder::by_id)
            })?,
            climate: sources.climate(),
            tile_cache,
            limiter,
        };

        info!(
            endpoint = %config.download.endpoint,
            cache_root = %config.cache.directory.display(),
            tile_size = size,
            concurrency = tiles.limiter.max_concurrent(),
            "earth datasets ready"
        );

        Ok(tiles)
    }

    /// Memory cache shared by every dataset's tiles.
    pub fn tile_cache(&self) -> &TileCache {
        &self.tile_cache
    }

    /// Limiter shared by every HTTP request.
    pub fn limiter(&self) -> &Arc<ConcurrencyLimiter> {
        &self.limiter
    }
}

/// Everything needed to build the tile loaders of one dataset level.
struct DatasetSources {
    http: SharedLoader<String, Bytes>,
    files: FileCacher,
    cache_root: PathBuf,
    endpoint: String,
    tile_cache: TileCache,
    tile_shape: RasterShape,
    max_upsample: f64,
    max_downsample: f64,
    executor: SharedExecutor,
}

impl DatasetSources {
    /// Raw tile bytes, from disk or else from `<endpoint>/<route>/<level>/<x>/<y>`.
    fn bytes(
        &self,
        route: &'static str,
        dir: &'static str,
        level: u32,
    ) -> impl Loader<TileKey, Bytes> {
        let endpoint = self.endpoint.clone();
        let root = self.cache_root.clone();
        Arc::clone(&self.http)
            .map_key(move |key: TileKey| format!("{}/{}/{}/{}", endpoint, route, level, key.path()))
            .cached(
                self.files
                    .clone()
                    .map_key(move |key: TileKey| tile_path(&root, dir, level, key)),
            )
    }

    fn raster<R: FormatRaster>(
        &self,
        route: &'static str,
        dir: &'static str,
        level: u32,
    ) -> impl Loader<TileKey, Arc<R>> {
        RasterReader::loader::<R>(Arc::clone(&self.executor)).compose(self.bytes(route, dir, level))
    }

    fn enums<E: RasterEnum>(
        &self,
        route: &'static str,
        dir: &'static str,
        level: u32,
        lookup: fn(u8) -> E,
    ) -> impl Loader<TileKey, Arc<EnumRaster<E>>> {
        RasterReader::enum_loader(Arc::clone(&self.executor), lookup)
            .compose(self.bytes(route, dir, level))
    }

    /// Soil properties are published as shorts but fit in a byte.
    fn soil_property(
        &self,
        name: &'static str,
        dir: &'static str,
    ) -> Result<LeveledRasterSampler<UnsignedByteRaster>, EarthError> {
        self.leveled(DATASET_LEVELS, |level| {
            let executor = Arc::clone(&self.executor);
            let narrow = from_async_fn(move |short: Arc<ShortRaster>| {
                let converted = executor.execute(move || UnsignedByteRaster::copy_of(&*short));
                async move {
                    match converted.await {
                        Ok(raster) => Some(Arc::new(raster)),
                        Err(e) => {
                            warn!(dataset = name, error = %e, "soil conversion failed");
                            None
                        }
                    }
                }
            });
            narrow.compose(self.raster::<ShortRaster>(name, dir, level))
        })
    }

    fn leveled<R, L, F>(
        &self,
        levels: RangeInclusive<u32>,
        tiles: F,
    ) -> Result<LeveledRasterSampler<R>, EarthError>
    where
        R: Raster,
        L: Loader<TileKey, Arc<R>>,
        F: Fn(u32) -> L,
    {
        let samplers = levels
            .map(|level| {
                let count_y = 3i32.pow(level);
                let map = TileMap::new(count_y * 2, count_y, self.tile_shape, tiles(level))
                    .cached(&self.tile_cache);
                Arc::new(TiledRasterSampler::new(map, Arc::clone(&self.executor)))
                    as SharedSampler<R>
            })
            .collect();
        Ok(LeveledRasterSampler::with_factors(
            samplers,
            self.max_upsample,
            self.max_downsample,
        )?)
    }

    fn climate(&self) -> ClimateSamplers {
        let url = format!("{}/{}", self.endpoint, CLIMATE_FILE);
        let path = single_file_path(&self.cache_root, CLIMATE_FILE);
        let bytes = Arc::clone(&self.http)
            .map_key(move |_: ()| url.clone())
            .cached(self.files.clone().map_key(move |_: ()| path.clone()));
        let loader = ClimateRasters::loader(Arc::clone(&self.executor))
            .compose(bytes)
            .shared();
        ClimateSource::new(loader).samplers(Arc::clone(&self.executor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use crate::format::RasterWriter;
    use crate::geo::GeoView;
    use crate::layer::RasterSampler;
    use crate::loader::from_fn;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const TILE: usize = 4;

    fn config(cache_root: &TempDir) -> ConfigFile {
        let mut config = ConfigFile::default();
        config.cache.directory = cache_root.path().to_path_buf();
        config.download.endpoint = "http://tiles.test".to_string();
        config.tiles.tile_size = TILE;
        config
    }

    fn short_tile(value: i16) -> Bytes {
        let raster = ShortRaster::wrap(RasterShape::new(TILE, TILE), vec![value; TILE * TILE]);
        Bytes::from(RasterWriter::new().write(&raster).unwrap())
    }

    /// Serves `body` for every URL and records the requests.
    fn recording_http(
        body: Option<Bytes>,
    ) -> (impl Loader<String, Bytes>, Arc<Mutex<Vec<String>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let loader = from_fn(move |url: String| {
            seen.lock().unwrap().push(url);
            body.clone()
        });
        (loader, requests)
    }

    #[tokio::test]
    async fn test_level_grids() {
        let root = TempDir::new().unwrap();
        let (http, _) = recording_http(None);

        let tiles =
            EarthTiles::with_http_loader(&config(&root), http, InlineExecutor::shared()).unwrap();

        assert_eq!(tiles.elevation.levels().len(), 7);
        assert_eq!(tiles.soil_ph.levels().len(), 5);
        assert_eq!(tiles.elevation.levels()[0].width(), 2 * TILE);
        assert_eq!(tiles.elevation.levels()[0].height(), TILE);
        assert_eq!(tiles.elevation.max_level().height(), 729 * TILE);
        assert_eq!(tiles.land_cover.max_level().width(), 2 * 81 * TILE);
    }

    #[tokio::test]
    async fn test_elevation_fetched_and_persisted() {
        let root = TempDir::new().unwrap();
        let (http, requests) = recording_http(Some(short_tile(42)));
        let tiles =
            EarthTiles::with_http_loader(&config(&root), http, InlineExecutor::shared()).unwrap();

        let raster = tiles.elevation.levels()[0]
            .get(GeoView::new(4, 0, 7, 3))
            .await
            .unwrap();

        assert_eq!(raster.get(0, 0), 42);
        assert_eq!(
            *requests.lock().unwrap(),
            vec!["http://tiles.test/elevation2/0/1/0".to_string()]
        );
        assert!(root.path().join("elevation/0/1/0").exists());
    }

    #[tokio::test]
    async fn test_disk_cache_serves_new_instance() {
        let root = TempDir::new().unwrap();
        let (http, _) = recording_http(Some(short_tile(7)));
        let warm =
            EarthTiles::with_http_loader(&config(&root), http, InlineExecutor::shared()).unwrap();
        warm.organic_carbon_content.levels()[0]
            .get(GeoView::new(0, 0, 3, 3))
            .await
            .unwrap();

        let (offline, requests) = recording_http(None);
        let cold =
            EarthTiles::with_http_loader(&config(&root), offline, InlineExecutor::shared())
                .unwrap();
        let raster = cold.organic_carbon_content.levels()[0]
            .get(GeoView::new(0, 0, 3, 3))
            .await
            .unwrap();

        assert_eq!(raster.get(3, 3), 7);
        assert!(requests.lock().unwrap().is_empty());
        assert!(root.path().join("soil/occ/0/0/0").exists());
    }

    #[tokio::test]
    async fn test_soil_property_narrowed_to_bytes() {
        let root = TempDir::new().unwrap();
        let (http, requests) = recording_http(Some(short_tile(300)));
        let tiles =
            EarthTiles::with_http_loader(&config(&root), http, InlineExecutor::shared()).unwrap();

        let raster = tiles.clay_content.levels()[0]
            .get(GeoView::new(0, 0, 1, 1))
            .await
            .unwrap();

        assert_eq!(raster.get(1, 1), 44);
        assert_eq!(
            *requests.lock().unwrap(),
            vec!["http://tiles.test/clay/0/0/0".to_string()]
        );
        assert!(root.path().join("soil/clay/0/0/0").exists());
    }

    #[tokio::test]
    async fn test_land_cover_ids_mapped() {
        let root = TempDir::new().unwrap();
        let ids = UnsignedByteRaster::filled(RasterShape::new(TILE, TILE), 210);
        let body = Bytes::from(RasterWriter::new().write(&ids).unwrap());
        let (http, _) = recording_http(Some(body));
        let tiles =
            EarthTiles::with_http_loader(&config(&root), http, InlineExecutor::shared()).unwrap();

        let raster = tiles.land_cover.levels()[0]
            .get(GeoView::new(0, 0, 3, 3))
            .await
            .unwrap();

        assert_eq!(raster.get(2, 2), Cover::Water);
    }

    #[tokio::test]
    async fn test_missing_tile_is_absent_and_not_persisted() {
        let root = TempDir::new().unwrap();
        let (http, _) = recording_http(None);
        let tiles =
            EarthTiles::with_http_loader(&config(&root), http, InlineExecutor::shared()).unwrap();

        let raster = tiles.elevation.levels()[0].get(GeoView::new(0, 0, 3, 3)).await;

        assert!(raster.is_none());
        assert!(!root.path().join("elevation/0/0/0").exists());
    }
}
