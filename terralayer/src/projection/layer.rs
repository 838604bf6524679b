use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use super::resampler::{ResampleParams, ResamplerFactory};
use super::{CylindricalProjection, Projection};
use crate::executor::{BlockingExecutorExt, SharedExecutor};
use crate::geo::GeoView;
use crate::layer::{GeoLayer, LeveledRasterSampler};
use crate::loader::LoadFuture;
use crate::raster::{Raster, RasterShape};

/// Serves a projected view by resampling a global equirectangular raster
/// pyramid.
///
/// The requested view is converted into a longitude/latitude box, which
/// picks the pyramid level and the window of that level to load. The window
/// is grown by the resampler's halo before sampling.
pub struct ResamplingLayer<R, F> {
    projection: Projection,
    factory: F,
    levels: LeveledRasterSampler<R>,
    executor: SharedExecutor,
}

impl<R, F> ResamplingLayer<R, F>
where
    R: Raster,
    F: ResamplerFactory<R>,
{
    pub fn new(
        projection: Projection,
        factory: F,
        levels: LeveledRasterSampler<R>,
        executor: SharedExecutor,
    ) -> Self {
        Self {
            projection,
            factory,
            levels,
            executor,
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn levels(&self) -> &LeveledRasterSampler<R> {
        &self.levels
    }
}

impl<R, F> GeoLayer<R> for ResamplingLayer<R, F>
where
    R: Raster,
    F: ResamplerFactory<R>,
{
    fn get(&self, view: GeoView, output: RasterShape) -> LoadFuture<R> {
        if output.size() == 0 {
            return futures::future::ready(Some(R::create(output))).boxed();
        }

        let projection = &self.projection;
        let lon0 = projection.lon(view.x0 as f64);
        let lon1 = projection.lon(view.x1 as f64 + 0.5);
        let lat0 = projection.lat(view.z1 as f64 + 0.5);
        let lat1 = projection.lat(view.z0 as f64);

        let density_x = output.width() as f64 / (lon1 - lon0);
        let density_y = output.height() as f64 / (lat1 - lat0);
        let sampler = self.levels.choose(density_x, density_y).clone();

        let width = sampler.width() as f64;
        let height = sampler.height() as f64;
        let x0 = (lon0 + 180.0) / 360.0 * width;
        let z0 = (90.0 - lat1) / 180.0 * height;
        let x1 = (lon1 + 180.0) / 360.0 * width;
        let z1 = (90.0 - lat0) / 180.0 * height;

        let scale_x = (x1 - x0) / output.width() as f64;
        let scale_z = (z1 - z0) / output.height() as f64;
        let resampler = self.factory.create(scale_x.min(scale_z));

        let source_view = resampler.extend(GeoView::new(
            x0.floor() as i32,
            z0.floor() as i32,
            x1.floor() as i32,
            z1.floor() as i32,
        ));

        let params = ResampleParams {
            scale_x: scale_x as f32,
            scale_z: scale_z as f32,
            offset_x: (x0 - source_view.x0 as f64) as f32,
            offset_z: (z0 - source_view.z0 as f64) as f32,
            seed_x: source_view.x0,
            seed_z: source_view.z0,
        };

        debug!(
            view = %view,
            source_view = %source_view,
            level_width = sampler.width(),
            level_height = sampler.height(),
            scale_x,
            scale_z,
            "resampling view"
        );

        let source = sampler.get(source_view);
        let executor = Arc::clone(&self.executor);
        async move {
            let source = source.await?;
            let result = executor
                .execute(move || {
                    let mut target = R::create(output);
                    resampler.resample(&source, &mut target, &params);
                    target
                })
                .await;
            match result {
                Ok(target) => Some(target),
                Err(e) => {
                    warn!(view = %view, error = %e, "resampling failed");
                    None
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use crate::layer::RasterSampler;
    use crate::layer::SharedSampler;
    use crate::projection::{InterpolationFactory, ProjectionKind, Voronoi, EQUATOR_CIRCUMFERENCE};
    use crate::raster::{EnumRaster, ShortRaster};
    use std::sync::Mutex;

    /// Global raster whose value at (x, y) is `x`, recording requested views.
    struct RampSampler {
        width: usize,
        height: usize,
        requests: Mutex<Vec<GeoView>>,
    }

    impl RampSampler {
        fn new(width: usize, height: usize) -> Arc<Self> {
            Arc::new(Self {
                width,
                height,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    impl RasterSampler<ShortRaster> for RampSampler {
        fn get(&self, view: GeoView) -> LoadFuture<ShortRaster> {
            self.requests.lock().unwrap().push(view);
            let shape = view.shape();
            let mut raster = ShortRaster::create(shape);
            for y in 0..shape.height() {
                for x in 0..shape.width() {
                    raster.put(x, y, (view.x0 + x as i32) as i16);
                }
            }
            futures::future::ready(Some(raster)).boxed()
        }

        fn width(&self) -> usize {
            self.width
        }

        fn height(&self) -> usize {
            self.height
        }
    }

    struct EmptySampler;

    impl RasterSampler<ShortRaster> for EmptySampler {
        fn get(&self, _view: GeoView) -> LoadFuture<ShortRaster> {
            futures::future::ready(None).boxed()
        }

        fn width(&self) -> usize {
            360
        }

        fn height(&self) -> usize {
            180
        }
    }

    fn projection() -> Projection {
        // One degree per block
        Projection::new(ProjectionKind::Equirectangular, EQUATOR_CIRCUMFERENCE / 360.5).unwrap()
    }

    #[tokio::test]
    async fn test_exact_view_at_native_resolution() {
        let ramp = RampSampler::new(360, 180);
        let levels =
            LeveledRasterSampler::new(vec![ramp.clone() as SharedSampler<ShortRaster>]).unwrap();
        let layer = projection().interpolated_layer(levels, InlineExecutor::shared());

        let raster = layer.get_exact(GeoView::new(0, 0, 9, 9)).await.unwrap();

        assert_eq!(raster.shape(), RasterShape::new(10, 10));
        // Longitude 0 sits at column 180 of a global 360 wide raster. The
        // view spans 9.5 degrees, so the step is slightly under one column.
        assert_eq!(raster.get(0, 0), 180);
        assert_eq!(raster.get(4, 7), 183);
        assert_eq!(raster.get(9, 0), 188);
    }

    #[tokio::test]
    async fn test_upsampling_requests_halo() {
        let ramp = RampSampler::new(360, 180);
        let levels =
            LeveledRasterSampler::new(vec![ramp.clone() as SharedSampler<ShortRaster>]).unwrap();
        let layer = projection().interpolated_layer(levels, InlineExecutor::shared());

        let raster = layer
            .get(GeoView::new(0, 0, 9, 9), RasterShape::new(80, 80))
            .await
            .unwrap();

        assert_eq!(raster.shape(), RasterShape::new(80, 80));
        let requested = ramp.requests.lock().unwrap()[0];
        // Cubic reaches one element before and two after
        assert_eq!(requested.x0, 179);
        assert_eq!(requested.x1, 191);

        for x in 1..80 {
            assert!(raster.get(x, 0) >= raster.get(x - 1, 0));
        }
    }

    #[tokio::test]
    async fn test_missing_source_yields_none() {
        let levels: LeveledRasterSampler<ShortRaster> =
            LeveledRasterSampler::new(vec![Arc::new(EmptySampler) as _]).unwrap();
        let layer = projection().interpolated_layer(levels, InlineExecutor::shared());

        assert!(layer.get_exact(GeoView::new(0, 0, 3, 3)).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_output_short_circuits() {
        let ramp = RampSampler::new(360, 180);
        let levels =
            LeveledRasterSampler::new(vec![ramp.clone() as SharedSampler<ShortRaster>]).unwrap();
        let layer = ResamplingLayer::new(
            projection(),
            InterpolationFactory,
            levels,
            InlineExecutor::shared(),
        );

        let raster = layer
            .get(GeoView::new(0, 0, 3, 3), RasterShape::new(0, 4))
            .await
            .unwrap();

        assert_eq!(raster.shape(), RasterShape::new(0, 4));
        assert!(ramp.requests.lock().unwrap().is_empty());
    }

    crate::raster_enum! {
        enum Ground: default Rock {
            Rock = (0, "rock"),
            Sand = (1, "sand"),
        }
    }

    struct SandSampler;

    impl RasterSampler<EnumRaster<Ground>> for SandSampler {
        fn get(&self, view: GeoView) -> LoadFuture<EnumRaster<Ground>> {
            futures::future::ready(Some(EnumRaster::filled(view.shape(), Ground::Sand))).boxed()
        }

        fn width(&self) -> usize {
            360
        }

        fn height(&self) -> usize {
            180
        }
    }

    #[tokio::test]
    async fn test_voronoi_layer() {
        let levels: LeveledRasterSampler<EnumRaster<Ground>> =
            LeveledRasterSampler::new(vec![Arc::new(SandSampler) as _]).unwrap();
        let layer = projection().voronoi_layer(
            levels,
            Arc::new(Voronoi::default()),
            InlineExecutor::shared(),
        );

        let raster = layer
            .get(GeoView::new(-4, -4, 3, 3), RasterShape::new(32, 32))
            .await
            .unwrap();

        assert!(raster.values().all(|value| value == Ground::Sand));
    }
}
