//! Jittered nearest-cell resampling for categorical rasters.
//!
//! Each source element owns a feature point placed at a pseudo-random
//! offset inside its cell. A target element takes the value of the source
//! element whose feature point is closest, searching the 3×3 cells around
//! it. Jitter is looked up by world position, so adjacent requests agree on
//! their shared boundary.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::resampler::{clamp_index, ResampleParams, Resampler, ResamplerFactory};
use super::ProjectionError;
use crate::geo::GeoView;
use crate::raster::{EnumRaster, Raster, RasterEnum};

const JITTER_SIZE: i32 = 32;
const JITTER_MASK: i32 = JITTER_SIZE - 1;

pub const DEFAULT_JITTER_RADIUS: f32 = 0.45;
pub const DEFAULT_JITTER_SEED: u64 = 2016969737595986194;

/// Voronoi resampler with a fixed jitter table.
#[derive(Debug, Clone)]
pub struct Voronoi {
    jitter: Vec<f32>,
    radius: f32,
}

impl Voronoi {
    /// Builds a resampler whose feature points are offset by up to
    /// `2 * radius` on each axis.
    pub fn new(radius: f32, seed: u64) -> Result<Self, ProjectionError> {
        if !(0.0..1.0).contains(&radius) {
            return Err(ProjectionError::InvalidJitterRadius(radius));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let jitter = (0..JITTER_SIZE * JITTER_SIZE * 2)
            .map(|_| rng.gen::<f32>() * 2.0 * radius)
            .collect();

        Ok(Self { jitter, radius })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    fn jitter_at(&self, cell_x: i32, cell_z: i32, seed_x: i32, seed_z: i32) -> (f32, f32) {
        let jx = cell_x.wrapping_add(seed_x) & JITTER_MASK;
        let jz = cell_z.wrapping_add(seed_z) & JITTER_MASK;
        let index = ((jx + jz * JITTER_SIZE) * 2) as usize;
        (self.jitter[index], self.jitter[index + 1])
    }

    /// Finds the cell whose feature point is nearest to `(x, z)`.
    fn nearest_cell(&self, x: f32, z: f32, seed_x: i32, seed_z: i32) -> (i32, i32) {
        let origin_x = x.floor() as i32;
        let origin_z = z.floor() as i32;

        let mut picked = (origin_x, origin_z);
        let mut picked_distance = f32::MAX;

        for cell_z in origin_z - 1..=origin_z + 1 {
            for cell_x in origin_x - 1..=origin_x + 1 {
                let (jx, jz) = self.jitter_at(cell_x, cell_z, seed_x, seed_z);
                let dx = cell_x as f32 + jx - x;
                let dz = cell_z as f32 + jz - z;
                let distance = dx * dx + dz * dz;
                if distance < picked_distance {
                    picked_distance = distance;
                    picked = (cell_x, cell_z);
                }
            }
        }

        picked
    }
}

impl Default for Voronoi {
    fn default() -> Self {
        Self::new(DEFAULT_JITTER_RADIUS, DEFAULT_JITTER_SEED)
            .unwrap_or_else(|_| unreachable!("default jitter radius is in range"))
    }
}

impl<E: RasterEnum> Resampler<EnumRaster<E>> for Voronoi {
    fn extend(&self, view: GeoView) -> GeoView {
        view.expand(1, 1)
    }

    fn resample(
        &self,
        source: &EnumRaster<E>,
        target: &mut EnumRaster<E>,
        params: &ResampleParams,
    ) {
        let (sw, sh) = (source.width(), source.height());
        let (tw, th) = (target.width(), target.height());
        if sw == 0 || sh == 0 {
            return;
        }

        let downsampling = tw <= sw && th <= sh;

        for ty in 0..th {
            let source_z = ty as f32 * params.scale_z + params.offset_z;
            for tx in 0..tw {
                let source_x = tx as f32 * params.scale_x + params.offset_x;
                let (cell_x, cell_z) = if downsampling {
                    (source_x.floor() as i32, source_z.floor() as i32)
                } else {
                    self.nearest_cell(source_x, source_z, params.seed_x, params.seed_z)
                };
                let ordinal = source.ordinal_at(
                    clamp_index(cell_x as i64, sw),
                    clamp_index(cell_z as i64, sh),
                );
                target.put_ordinal(tx, ty, ordinal);
            }
        }
    }
}

impl<E: RasterEnum> ResamplerFactory<EnumRaster<E>> for Arc<Voronoi> {
    fn create(&self, _scale: f64) -> Arc<dyn Resampler<EnumRaster<E>>> {
        self.clone()
    }
}
