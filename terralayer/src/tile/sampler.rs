use std::sync::Arc;

use futures::future::{join_all, FutureExt};
use tracing::{error, trace};

use super::{TileKey, TileMap};
use crate::executor::{BlockingExecutorExt, SharedExecutor};
use crate::geo::GeoView;
use crate::layer::RasterSampler;
use crate::loader::{LoadFuture, Loader};
use crate::raster::Raster;

/// Composites the tiles of a [`TileMap`] covering a view into one raster.
///
/// A view touching any tile outside the grid, or any tile that fails to
/// load, yields no raster at all.
pub struct TiledRasterSampler<R> {
    map: TileMap<Arc<R>>,
    executor: SharedExecutor,
}

impl<R: Raster> TiledRasterSampler<R> {
    pub fn new(map: TileMap<Arc<R>>, executor: SharedExecutor) -> Self {
        Self { map, executor }
    }

    pub fn map(&self) -> &TileMap<Arc<R>> {
        &self.map
    }
}

impl<R: Raster> RasterSampler<R> for TiledRasterSampler<R> {
    fn get(&self, view: GeoView) -> LoadFuture<R> {
        let tile_shape = self.map.tile_shape();
        let tiles = view.floor_div(tile_shape);
        if !self.map.contains(tiles) {
            trace!(view = %view, "view outside of tile grid");
            return futures::future::ready(None).boxed();
        }

        let keys: Vec<TileKey> = (tiles.z0..=tiles.z1)
            .flat_map(|y| (tiles.x0..=tiles.x1).map(move |x| TileKey::new(x, y)))
            .collect();
        let loads = join_all(keys.iter().map(|&key| self.map.load(key)));
        let executor = Arc::clone(&self.executor);

        async move {
            let rasters: Vec<Arc<R>> = loads.await.into_iter().collect::<Option<_>>()?;

            let composite = executor.execute(move || {
                let tile_width = tile_shape.width() as i64;
                let tile_height = tile_shape.height() as i64;
                let mut output = R::create(view.shape());
                for (key, tile) in keys.iter().zip(&rasters) {
                    let x = key.x as i64 * tile_width - view.x0 as i64;
                    let y = key.y as i64 * tile_height - view.z0 as i64;
                    output.copy_from_clipped(tile, x as isize, y as isize);
                }
                output
            });

            match composite.await {
                Ok(raster) => Some(raster),
                Err(e) => {
                    error!(view = %view, error = %e, "failed to composite tiles");
                    None
                }
            }
        }
        .boxed()
    }

    fn width(&self) -> usize {
        self.map.width()
    }

    fn height(&self) -> usize {
        self.map.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use crate::loader::from_fn;
    use crate::raster::{RasterShape, ShortRaster};

    /// 2×1 grid of 3×2 tiles, each filled with `10 * (x + 1) + index`.
    fn sampler() -> TiledRasterSampler<ShortRaster> {
        let shape = RasterShape::new(3, 2);
        let map = TileMap::new(
            2,
            1,
            shape,
            from_fn(move |key: TileKey| {
                let values = (0..shape.size())
                    .map(|i| (10 * (key.x + 1)) as i16 + i as i16)
                    .collect();
                Some(Arc::new(ShortRaster::wrap(shape, values)))
            }),
        );
        TiledRasterSampler::new(map, InlineExecutor::shared())
    }

    #[tokio::test]
    async fn test_composites_across_tiles() {
        let sampler = sampler();

        let raster = sampler.get(GeoView::new(1, 0, 4, 1)).await.unwrap();

        assert_eq!(raster.shape(), RasterShape::new(4, 2));
        assert_eq!(raster.as_slice(), &[11, 12, 20, 21, 14, 15, 23, 24]);
    }

    #[tokio::test]
    async fn test_full_grid_width() {
        let sampler = sampler();

        let raster = sampler.get(GeoView::new(0, 0, 5, 1)).await.unwrap();

        assert_eq!(raster.width(), sampler.width());
        assert_eq!(raster.get(5, 1), 25);
    }

    #[tokio::test]
    async fn test_view_outside_grid_is_absent() {
        let sampler = sampler();

        assert!(sampler.get(GeoView::new(4, 0, 6, 1)).await.is_none());
        assert!(sampler.get(GeoView::new(-1, 0, 1, 1)).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_tile_makes_result_absent() {
        let shape = RasterShape::new(2, 2);
        let map = TileMap::new(
            2,
            1,
            shape,
            from_fn(move |key: TileKey| (key.x == 0).then(|| Arc::new(ShortRaster::create(shape)))),
        );
        let sampler = TiledRasterSampler::new(map, InlineExecutor::shared());

        assert!(sampler.get(GeoView::new(0, 0, 1, 1)).await.is_some());
        assert!(sampler.get(GeoView::new(0, 0, 3, 1)).await.is_none());
    }
}
