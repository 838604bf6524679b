use std::sync::Arc;

use crate::geo::GeoView;
use crate::loader::LoadFuture;
use crate::raster::RasterShape;

/// Shared handle to a sampler.
pub type SharedSampler<R> = Arc<dyn RasterSampler<R>>;

/// Produces rasters at a fixed native resolution.
pub trait RasterSampler<R>: Send + Sync + 'static {
    /// Loads the raster covering `view`, in this sampler's raster space.
    fn get(&self, view: GeoView) -> LoadFuture<R>;

    /// Width of the sampled raster space.
    fn width(&self) -> usize;

    /// Height of the sampled raster space.
    fn height(&self) -> usize;
}

impl<R, S> RasterSampler<R> for Arc<S>
where
    S: RasterSampler<R> + ?Sized,
{
    fn get(&self, view: GeoView) -> LoadFuture<R> {
        (**self).get(view)
    }

    fn width(&self) -> usize {
        (**self).width()
    }

    fn height(&self) -> usize {
        (**self).height()
    }
}

/// A data source queried in projected coordinates.
pub trait GeoLayer<V>: Send + Sync + 'static {
    /// Loads the value of `view` resampled to `output`.
    fn get(&self, view: GeoView, output: RasterShape) -> LoadFuture<V>;

    /// Loads the value of `view` at one output element per block.
    fn get_exact(&self, view: GeoView) -> LoadFuture<V> {
        self.get(view, view.shape())
    }
}

impl<V, L> GeoLayer<V> for Arc<L>
where
    L: GeoLayer<V> + ?Sized,
{
    fn get(&self, view: GeoView, output: RasterShape) -> LoadFuture<V> {
        (**self).get(view, output)
    }
}
