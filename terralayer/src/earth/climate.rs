//! Global climate rasters.
//!
//! A single XZ stream holds three `4320×2160` unsigned byte planes, in
//! order: mean temperature, minimum temperature and annual rainfall. The
//! file is loaded once and every view is cut out of it with a clipped copy.

use std::io::{self, Read};
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use futures::future::FutureExt;
use tokio::sync::OnceCell;
use tracing::{error, info};
use xz2::read::XzDecoder;

use crate::executor::{BlockingExecutorExt, SharedExecutor};
use crate::geo::GeoView;
use crate::layer::{LeveledRasterSampler, RasterSampler};
use crate::loader::{from_async_fn, LoadFuture, Loader, SharedLoader};
use crate::raster::{IntRaster, Raster, RasterShape, UnsignedByteRaster};

pub const CLIMATE_WIDTH: usize = 4320;
pub const CLIMATE_HEIGHT: usize = 2160;
pub const CLIMATE_SHAPE: RasterShape = RasterShape::new(CLIMATE_WIDTH, CLIMATE_HEIGHT);

const MIN_TEMPERATURE: f32 = -40.0;
const MAX_TEMPERATURE: f32 = 45.0;
const DEFAULT_TEMPERATURE: f32 = 14.0;

const MAX_RAINFALL: f32 = 7200.0;
const RAINFALL_CURVE: f32 = 2.3;
const DEFAULT_RAINFALL: u16 = 600;

fn inverse_lerp(min: f32, max: f32, value: f32) -> f32 {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

macro_rules! packed_raster {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(UnsignedByteRaster);

        impl $name {
            pub fn wrap(shape: RasterShape, packed: Vec<u8>) -> Self {
                Self(UnsignedByteRaster::wrap(shape, packed))
            }

            pub fn packed(&self) -> &UnsignedByteRaster {
                &self.0
            }
        }

        impl Raster for $name {
            fn create(shape: RasterShape) -> Self {
                Self(UnsignedByteRaster::filled(shape, Self::default_packed()))
            }

            fn shape(&self) -> RasterShape {
                self.0.shape()
            }

            fn copy_from(&mut self, source: &Self) {
                self.0.copy_from(&source.0);
            }

            fn copy_from_clipped(&mut self, source: &Self, x0: isize, y0: isize) {
                self.0.copy_from_clipped(&source.0, x0, y0);
            }
        }

        impl IntRaster for $name {
            fn get_int(&self, x: usize, y: usize) -> i32 {
                self.0.get_int(x, y)
            }

            fn put_int(&mut self, x: usize, y: usize, value: i32) {
                self.0.put_int(x, y, value);
            }
        }
    };
}

packed_raster! {
    /// Temperatures in °C, packed linearly from -40..45 into a byte.
    TemperatureRaster
}

packed_raster! {
    /// Annual rainfall in mm, packed from 0..7200 along a power curve so
    /// that low rainfall keeps more precision.
    RainfallRaster
}

impl TemperatureRaster {
    pub fn pack(celsius: f32) -> u8 {
        (inverse_lerp(MIN_TEMPERATURE, MAX_TEMPERATURE, celsius) * 255.0).round() as u8
    }

    pub fn unpack(packed: u8) -> f32 {
        static LOOKUP: OnceLock<[f32; 256]> = OnceLock::new();
        LOOKUP.get_or_init(|| {
            std::array::from_fn(|packed| {
                let t = packed as f32 / 255.0;
                MIN_TEMPERATURE + (MAX_TEMPERATURE - MIN_TEMPERATURE) * t
            })
        })[packed as usize]
    }

    fn default_packed() -> u8 {
        Self::pack(DEFAULT_TEMPERATURE)
    }

    pub fn temperature(&self, x: usize, y: usize) -> f32 {
        Self::unpack(self.0.get(x, y))
    }

    pub fn put_temperature(&mut self, x: usize, y: usize, celsius: f32) {
        self.0.put(x, y, Self::pack(celsius));
    }
}

impl RainfallRaster {
    pub fn pack(millimeters: u16) -> u8 {
        let t = inverse_lerp(0.0, MAX_RAINFALL, millimeters as f32);
        (t.powf(1.0 / RAINFALL_CURVE) * 255.0).round() as u8
    }

    pub fn unpack(packed: u8) -> u16 {
        static LOOKUP: OnceLock<[u16; 256]> = OnceLock::new();
        LOOKUP.get_or_init(|| {
            std::array::from_fn(|packed| {
                let t = (packed as f32 / 255.0).powf(RAINFALL_CURVE);
                (MAX_RAINFALL * t) as u16
            })
        })[packed as usize]
    }

    fn default_packed() -> u8 {
        Self::pack(DEFAULT_RAINFALL)
    }

    pub fn rainfall(&self, x: usize, y: usize) -> u16 {
        Self::unpack(self.0.get(x, y))
    }

    pub fn put_rainfall(&mut self, x: usize, y: usize, millimeters: u16) {
        self.0.put(x, y, Self::pack(millimeters));
    }
}

/// The three global climate planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClimateRasters {
    pub mean_temperature: TemperatureRaster,
    pub min_temperature: TemperatureRaster,
    pub annual_rainfall: RainfallRaster,
}

impl ClimateRasters {
    /// Decodes the XZ-compressed planes at the global climate shape.
    pub fn decode(bytes: &[u8]) -> io::Result<Self> {
        Self::decode_with_shape(CLIMATE_SHAPE, bytes)
    }

    pub(crate) fn decode_with_shape(shape: RasterShape, bytes: &[u8]) -> io::Result<Self> {
        let mut input = XzDecoder::new(bytes);
        let mut plane = || -> io::Result<Vec<u8>> {
            let mut buffer = vec![0u8; shape.size()];
            input.read_exact(&mut buffer)?;
            Ok(buffer)
        };

        let mean_temperature = plane()?;
        let min_temperature = plane()?;
        let annual_rainfall = plane()?;

        Ok(Self {
            mean_temperature: TemperatureRaster::wrap(shape, mean_temperature),
            min_temperature: TemperatureRaster::wrap(shape, min_temperature),
            annual_rainfall: RainfallRaster::wrap(shape, annual_rainfall),
        })
    }

    /// Loader decoding the climate file on `executor`.
    pub fn loader(executor: SharedExecutor) -> impl Loader<Bytes, Arc<ClimateRasters>> {
        Self::loader_with_shape(executor, CLIMATE_SHAPE)
    }

    pub(crate) fn loader_with_shape(
        executor: SharedExecutor,
        shape: RasterShape,
    ) -> impl Loader<Bytes, Arc<ClimateRasters>> {
        from_async_fn(move |bytes: Bytes| {
            let decoded = executor.execute(move || Self::decode_with_shape(shape, &bytes));
            async move {
                match decoded.await {
                    Ok(Ok(rasters)) => {
                        info!(shape = %shape, "climate rasters loaded");
                        Some(Arc::new(rasters))
                    }
                    Ok(Err(e)) => {
                        error!(error = %e, "failed to read climate rasters");
                        None
                    }
                    Err(e) => {
                        error!(error = %e, "climate decode task failed");
                        None
                    }
                }
            }
        })
    }
}

/// Memoized single load of the climate rasters.
///
/// The first request triggers the load; its outcome, absent or not, is
/// shared by every later request.
#[derive(Clone)]
pub struct ClimateSource {
    loader: SharedLoader<(), Arc<ClimateRasters>>,
    loaded: Arc<OnceCell<Option<Arc<ClimateRasters>>>>,
    shape: RasterShape,
}

impl ClimateSource {
    pub fn new(loader: SharedLoader<(), Arc<ClimateRasters>>) -> Self {
        Self::with_shape(loader, CLIMATE_SHAPE)
    }

    pub(crate) fn with_shape(
        loader: SharedLoader<(), Arc<ClimateRasters>>,
        shape: RasterShape,
    ) -> Self {
        Self {
            loader,
            loaded: Arc::new(OnceCell::new()),
            shape,
        }
    }

    pub async fn get(&self) -> Option<Arc<ClimateRasters>> {
        let loader = Arc::clone(&self.loader);
        self.loaded
            .get_or_init(|| async move { loader.load(()).await })
            .await
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    pub fn samplers(&self, executor: SharedExecutor) -> ClimateSamplers {
        ClimateSamplers {
            mean_temperature: self.sampler(|c| &c.mean_temperature, &executor),
            min_temperature: self.sampler(|c| &c.min_temperature, &executor),
            annual_rainfall: self.sampler(|c| &c.annual_rainfall, &executor),
        }
    }

    fn sampler<R: Raster>(
        &self,
        select: fn(&ClimateRasters) -> &R,
        executor: &SharedExecutor,
    ) -> LeveledRasterSampler<R> {
        LeveledRasterSampler::single(Arc::new(ClimateSampler {
            source: self.clone(),
            select,
            executor: Arc::clone(executor),
        }))
    }
}

/// Leveled samplers over each climate plane.
pub struct ClimateSamplers {
    pub mean_temperature: LeveledRasterSampler<TemperatureRaster>,
    pub min_temperature: LeveledRasterSampler<TemperatureRaster>,
    pub annual_rainfall: LeveledRasterSampler<RainfallRaster>,
}

struct ClimateSampler<R> {
    source: ClimateSource,
    select: fn(&ClimateRasters) -> &R,
    executor: SharedExecutor,
}

impl<R: Raster> RasterSampler<R> for ClimateSampler<R> {
    fn get(&self, view: GeoView) -> LoadFuture<R> {
        let source = self.source.clone();
        let select = self.select;
        let executor = Arc::clone(&self.executor);
        async move {
            let rasters = source.get().await?;
            executor
                .execute(move || {
                    let mut target = R::create(view.shape());
                    target.copy_from_clipped(
                        select(&rasters),
                        -(view.x0 as isize),
                        -(view.z0 as isize),
                    );
                    target
                })
                .await
                .ok()
        }
        .boxed()
    }

    fn width(&self) -> usize {
        self.source.shape.width()
    }

    fn height(&self) -> usize {
        self.source.shape.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use crate::loader::{from_fn, LoaderExt};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use xz2::write::XzEncoder;

    fn compressed(planes: &[&[u8]]) -> Bytes {
        let mut encoder = XzEncoder::new(Vec::new(), 6);
        for plane in planes {
            encoder.write_all(plane).unwrap();
        }
        Bytes::from(encoder.finish().unwrap())
    }

    #[test]
    fn test_temperature_packing() {
        assert_eq!(TemperatureRaster::pack(-40.0), 0);
        assert_eq!(TemperatureRaster::pack(45.0), 255);
        assert_eq!(TemperatureRaster::pack(100.0), 255);
        assert_eq!(TemperatureRaster::unpack(0), -40.0);
        assert_eq!(TemperatureRaster::unpack(255), 45.0);

        let packed = TemperatureRaster::pack(14.0);
        assert!((TemperatureRaster::unpack(packed) - 14.0).abs() < 0.2);
    }

    #[test]
    fn test_rainfall_packing() {
        assert_eq!(RainfallRaster::pack(0), 0);
        assert_eq!(RainfallRaster::pack(7200), 255);
        assert_eq!(RainfallRaster::unpack(0), 0);

        let packed = RainfallRaster::pack(600);
        let error = RainfallRaster::unpack(packed) as f32 - 600.0;
        assert!(error.abs() < 20.0);

        // The curve spends more codes on low rainfall
        assert!(RainfallRaster::pack(1000) > 100);
    }

    #[test]
    fn test_default_fill() {
        let temperature = TemperatureRaster::create(RasterShape::new(2, 2));
        let rainfall = RainfallRaster::create(RasterShape::new(2, 2));

        assert!((temperature.temperature(1, 1) - 14.0).abs() < 0.2);
        assert!((rainfall.rainfall(0, 1) as f32 - 600.0).abs() < 20.0);
    }

    #[test]
    fn test_decode_three_planes() {
        let shape = RasterShape::new(3, 2);
        let bytes = compressed(&[&[1; 6], &[2; 6], &[3; 6]]);

        let rasters = ClimateRasters::decode_with_shape(shape, &bytes).unwrap();

        assert_eq!(rasters.mean_temperature.packed().as_slice(), &[1; 6]);
        assert_eq!(rasters.min_temperature.packed().as_slice(), &[2; 6]);
        assert_eq!(rasters.annual_rainfall.packed().as_slice(), &[3; 6]);
    }

    #[test]
    fn test_decode_truncated_fails() {
        let shape = RasterShape::new(3, 2);
        let bytes = compressed(&[&[1; 6], &[2; 6]]);

        assert!(ClimateRasters::decode_with_shape(shape, &bytes).is_err());
    }

    #[tokio::test]
    async fn test_loader_folds_errors() {
        let shape = RasterShape::new(2, 2);
        let loader = ClimateRasters::loader_with_shape(InlineExecutor::shared(), shape);

        assert!(loader.load(Bytes::from_static(b"not xz")).await.is_none());
        assert!(loader
            .load(compressed(&[&[0; 4], &[0; 4], &[0; 4]]))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_source_loads_once_and_clips() {
        let shape = RasterShape::new(4, 2);
        let mean: Vec<u8> = (0..8).collect();
        let bytes = compressed(&[&mean, &[9; 8], &[7; 8]]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);

        let loader = ClimateRasters::loader_with_shape(InlineExecutor::shared(), shape)
            .compose(from_fn(move |_: ()| {
                counted.fetch_add(1, Ordering::SeqCst);
                Some(bytes.clone())
            }))
            .shared();
        let source = ClimateSource::with_shape(loader, shape);
        let samplers = source.samplers(InlineExecutor::shared());
        let mean_sampler = samplers.mean_temperature.max_level();

        assert_eq!(mean_sampler.width(), 4);

        let inside = mean_sampler.get(GeoView::new(1, 0, 2, 1)).await.unwrap();
        assert_eq!(inside.packed().as_slice(), &[1, 2, 5, 6]);

        // Outside the plane keeps the default fill
        let edge = mean_sampler.get(GeoView::new(3, 1, 4, 1)).await.unwrap();
        assert_eq!(edge.packed().get(0, 0), 7);
        assert_eq!(edge.packed().get(1, 0), TemperatureRaster::pack(14.0));

        let rainfall = samplers
            .annual_rainfall
            .max_level()
            .get(GeoView::new(0, 0, 0, 0))
            .await
            .unwrap();
        assert_eq!(rainfall.packed().get(0, 0), 7);

        assert!(source.is_loaded());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
