use thiserror::Error;

use super::{RasterSampler, SharedSampler};

/// Default factor by which a level may be stretched before the next level
/// up is preferred.
pub const DEFAULT_MAX_UPSAMPLE: f64 = 2.0;

/// Default factor by which a level may exceed the requested density before
/// it is considered wasteful.
pub const DEFAULT_MAX_DOWNSAMPLE: f64 = 4.0;

/// Errors constructing a layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("cannot create a leveled sampler with no levels")]
    NoLevels,
}

/// Pyramid of samplers over the same data at different resolutions.
///
/// Levels are ordered ascending by pixel count. Densities are expressed in
/// output pixels per degree; a level's native density is `width / 360`
/// horizontally and `height / 180` vertically.
pub struct LeveledRasterSampler<R> {
    levels: Vec<SharedSampler<R>>,
    max_upsample: f64,
    max_downsample: f64,
}

impl<R: 'static> LeveledRasterSampler<R> {
    pub fn new(levels: Vec<SharedSampler<R>>) -> Result<Self, LayerError> {
        Self::with_factors(levels, DEFAULT_MAX_UPSAMPLE, DEFAULT_MAX_DOWNSAMPLE)
    }

    /// Wraps a single sampler, which is then chosen for every density.
    pub fn single(level: SharedSampler<R>) -> Self {
        Self {
            levels: vec![level],
            max_upsample: DEFAULT_MAX_UPSAMPLE,
            max_downsample: DEFAULT_MAX_DOWNSAMPLE,
        }
    }

    pub fn with_factors(
        mut levels: Vec<SharedSampler<R>>,
        max_upsample: f64,
        max_downsample: f64,
    ) -> Result<Self, LayerError> {
        if levels.is_empty() {
            return Err(LayerError::NoLevels);
        }
        levels.sort_by_key(|level| level.width() as u64 * level.height() as u64);
        Ok(Self {
            levels,
            max_upsample,
            max_downsample,
        })
    }

    /// Picks the level to sample for the given densities.
    ///
    /// Walking up from the coarsest level, the first level that would be
    /// downsampled beyond `max_downsample` is returned immediately, a level
    /// that would be upsampled beyond `max_upsample` is skipped, and any
    /// other level is returned. Falls back to the finest level.
    pub fn choose(&self, density_x: f64, density_y: f64) -> &SharedSampler<R> {
        for level in &self.levels {
            if self.would_oversample(level, density_x, density_y) {
                return level;
            }
            if self.would_undersample(level, density_x, density_y) {
                continue;
            }
            return level;
        }
        self.max_level()
    }

    /// The finest level.
    pub fn max_level(&self) -> &SharedSampler<R> {
        // Non-empty by construction
        &self.levels[self.levels.len() - 1]
    }

    pub fn levels(&self) -> &[SharedSampler<R>] {
        &self.levels
    }

    fn would_undersample(&self, level: &SharedSampler<R>, density_x: f64, density_y: f64) -> bool {
        let (native_x, native_y) = native_density(level);
        density_x > native_x * self.max_upsample || density_y > native_y * self.max_upsample
    }

    fn would_oversample(&self, level: &SharedSampler<R>, density_x: f64, density_y: f64) -> bool {
        let (native_x, native_y) = native_density(level);
        density_x <= native_x / self.max_downsample || density_y <= native_y / self.max_downsample
    }
}

fn native_density<R: 'static>(level: &SharedSampler<R>) -> (f64, f64) {
    (level.width() as f64 / 360.0, level.height() as f64 / 180.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoView;
    use crate::loader::LoadFuture;
    use futures::FutureExt;
    use proptest::prelude::*;
    use std::sync::Arc;

    struct FixedSampler {
        width: usize,
        height: usize,
    }

    impl RasterSampler<()> for FixedSampler {
        fn get(&self, _view: GeoView) -> LoadFuture<()> {
            futures::future::ready(None).boxed()
        }

        fn width(&self) -> usize {
            self.width
        }

        fn height(&self) -> usize {
            self.height
        }
    }

    fn level(width: usize, height: usize) -> SharedSampler<()> {
        Arc::new(FixedSampler { width, height })
    }

    fn pyramid() -> LeveledRasterSampler<()> {
        // Deliberately out of order
        LeveledRasterSampler::new(vec![level(400, 200), level(100, 50)]).unwrap()
    }

    #[test]
    fn test_empty_is_rejected() {
        assert_eq!(
            LeveledRasterSampler::<()>::new(Vec::new()).err(),
            Some(LayerError::NoLevels)
        );
    }

    #[test]
    fn test_levels_sorted_by_size() {
        let sampler = pyramid();

        assert_eq!(sampler.levels()[0].width(), 100);
        assert_eq!(sampler.max_level().width(), 400);
    }

    #[test]
    fn test_native_density_selects_fine_level() {
        let sampler = pyramid();
        let native = 400.0 / 360.0;

        assert_eq!(sampler.choose(native, native).width(), 400);
    }

    #[test]
    fn test_low_density_selects_coarse_level() {
        let sampler = pyramid();
        let density = 400.0 / 360.0 / 8.0;

        assert_eq!(sampler.choose(density, density).width(), 100);
    }

    #[test]
    fn test_excessive_density_falls_back_to_finest() {
        let sampler = pyramid();

        assert_eq!(sampler.choose(1000.0, 1000.0).width(), 400);
    }

    #[test]
    fn test_tiny_density_returns_coarsest() {
        let sampler = pyramid();

        assert_eq!(sampler.choose(0.0001, 0.0001).width(), 100);
    }

    proptest! {
        #[test]
        fn prop_choice_is_monotonic(a in 0.001f64..10.0, b in 0.001f64..10.0) {
            let sampler = pyramid();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };

            let coarse = sampler.choose(low, low).width();
            let fine = sampler.choose(high, high).width();

            prop_assert!(fine >= coarse);
        }
    }
}
