use std::sync::Arc;

use crate::geo::GeoView;

/// Mapping from target raster coordinates into source raster coordinates.
///
/// A target element `(tx, ty)` reads the source at
/// `(tx * scale_x + offset_x, ty * scale_z + offset_z)`. The seeds are the
/// world position of the source origin, so position-dependent resamplers
/// stay stable across requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleParams {
    pub scale_x: f32,
    pub scale_z: f32,
    pub offset_x: f32,
    pub offset_z: f32,
    pub seed_x: i32,
    pub seed_z: i32,
}

/// Resamples a source raster into a target raster of another shape.
pub trait Resampler<R>: Send + Sync {
    /// Grows `view` by the halo of source data this resampler reads.
    fn extend(&self, view: GeoView) -> GeoView;

    fn resample(&self, source: &R, target: &mut R, params: &ResampleParams);
}

/// Picks a resampler for a given scale (source elements per target
/// element, the smaller of both axes).
pub trait ResamplerFactory<R>: Send + Sync + 'static {
    fn create(&self, scale: f64) -> Arc<dyn Resampler<R>>;
}

/// Clamps a signed source coordinate into `0..len`.
#[inline]
pub(crate) fn clamp_index(index: i64, len: usize) -> usize {
    index.clamp(0, len as i64 - 1) as usize
}
