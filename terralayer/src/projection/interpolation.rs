//! Separable interpolation for numeric rasters.
//!
//! Non-nearest modes run in two passes: every source row is first
//! resampled horizontally into an intermediate `target_width × source_height`
//! buffer, which is then resampled vertically. Source reads past the edges
//! are clamped to the nearest edge element.

use std::f32::consts::PI;
use std::sync::Arc;

use super::resampler::{clamp_index, ResampleParams, Resampler, ResamplerFactory};
use crate::geo::GeoView;
use crate::raster::IntRaster;

/// Interpolation kernels, from sharpest to smoothest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterpolationMode {
    Nearest,
    Linear,
    Cosine,
    Cubic,
}

impl InterpolationMode {
    /// Picks a kernel for `scale` source elements per target element.
    ///
    /// Heavier upsampling gets smoother kernels; any downsampling uses
    /// nearest-neighbour.
    pub fn choose(scale: f64) -> Self {
        if scale < 0.3 {
            InterpolationMode::Cubic
        } else if scale < 0.5 {
            InterpolationMode::Cosine
        } else if scale < 1.0 {
            InterpolationMode::Linear
        } else {
            InterpolationMode::Nearest
        }
    }

    /// Evaluates the kernel at `origin + t`, reading samples through `read`.
    #[inline]
    fn evaluate(self, read: impl Fn(i64) -> f32, origin: i64, t: f32) -> f32 {
        match self {
            InterpolationMode::Nearest => read(origin),
            InterpolationMode::Linear => lerp(read(origin), read(origin + 1), t),
            InterpolationMode::Cosine => cosine(read(origin), read(origin + 1), t),
            InterpolationMode::Cubic => cubic(
                read(origin - 1),
                read(origin),
                read(origin + 1),
                read(origin + 2),
                t,
            ),
        }
    }

    fn resample_nearest<R: IntRaster>(source: &R, target: &mut R, params: &ResampleParams) {
        let (sw, sh) = (source.width(), source.height());
        for ty in 0..target.height() {
            let sy = (ty as f32 * params.scale_z + params.offset_z).floor() as i64;
            let sy = clamp_index(sy, sh);
            for tx in 0..target.width() {
                let sx = (tx as f32 * params.scale_x + params.offset_x).floor() as i64;
                target.put_int(tx, ty, source.get_int(clamp_index(sx, sw), sy));
            }
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn cosine(a: f32, b: f32, t: f32) -> f32 {
    lerp(a, b, (1.0 - (t * PI).cos()) / 2.0)
}

/// Catmull-Rom through `b` and `c`.
#[inline]
fn cubic(a: f32, b: f32, c: f32, d: f32, t: f32) -> f32 {
    b + 0.5 * t * (c - a + t * (2.0 * a - 5.0 * b + 4.0 * c - d + t * (3.0 * (b - c) + d - a)))
}

impl<R: IntRaster> Resampler<R> for InterpolationMode {
    fn extend(&self, view: GeoView) -> GeoView {
        match self {
            InterpolationMode::Nearest => view,
            InterpolationMode::Linear | InterpolationMode::Cosine => view.expand(0, 1),
            InterpolationMode::Cubic => view.expand(1, 2),
        }
    }

    fn resample(&self, source: &R, target: &mut R, params: &ResampleParams) {
        let (sw, sh) = (source.width(), source.height());
        let (tw, th) = (target.width(), target.height());
        if sw == 0 || sh == 0 || tw == 0 || th == 0 {
            return;
        }

        if *self == InterpolationMode::Nearest {
            Self::resample_nearest(source, target, params);
            return;
        }

        let mut intermediate = vec![0.0f32; tw * sh];
        for sy in 0..sh {
            let row = &mut intermediate[sy * tw..(sy + 1) * tw];
            for (tx, value) in row.iter_mut().enumerate() {
                let source_x = tx as f32 * params.scale_x + params.offset_x;
                let origin = source_x.floor();
                *value = self.evaluate(
                    |x| source.get_int(clamp_index(x, sw), sy) as f32,
                    origin as i64,
                    source_x - origin,
                );
            }
        }

        for ty in 0..th {
            let source_y = ty as f32 * params.scale_z + params.offset_z;
            let origin = source_y.floor();
            let t = source_y - origin;
            for tx in 0..tw {
                let value = self.evaluate(
                    |y| intermediate[clamp_index(y, sh) * tw + tx],
                    origin as i64,
                    t,
                );
                target.put_int(tx, ty, value.floor() as i32);
            }
        }
    }
}

/// Chooses an [`InterpolationMode`] from the requested scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolationFactory;

impl<R: IntRaster> ResamplerFactory<R> for InterpolationFactory {
    fn create(&self, scale: f64) -> Arc<dyn Resampler<R>> {
        Arc::new(InterpolationMode::choose(scale))
    }
}
