use std::sync::Arc;

use futures::future::FutureExt;

use super::TileKey;
use crate::cache::{TileCache, TileMapId};
use crate::geo::GeoView;
use crate::loader::{LoadFuture, Loader, LoaderExt, SharedLoader};
use crate::raster::RasterShape;

/// A bounded grid of equally-shaped tiles.
///
/// Keys outside `[0, count_x) × [0, count_y)` load as absent without
/// reaching the inner loader.
pub struct TileMap<V> {
    id: TileMapId,
    count_x: i32,
    count_y: i32,
    tile_shape: RasterShape,
    loader: SharedLoader<TileKey, V>,
}

impl<V: Send + 'static> TileMap<V> {
    pub fn new<L>(count_x: i32, count_y: i32, tile_shape: RasterShape, loader: L) -> Self
    where
        L: Loader<TileKey, V>,
    {
        Self {
            id: TileMapId::next(),
            count_x,
            count_y,
            tile_shape,
            loader: Arc::new(loader),
        }
    }

    /// Interposes `cache` in front of this map's loader.
    ///
    /// The map keeps its identity, so its tiles stay distinct from those of
    /// every other map sharing the cache.
    pub fn cached(self, cache: &TileCache) -> Self
    where
        V: Clone + Sync,
    {
        let cacher = cache.cacher_for::<V>(self.id);
        Self {
            loader: self.loader.cached(cacher).shared(),
            ..self
        }
    }
}

impl<V> TileMap<V> {
    pub fn id(&self) -> TileMapId {
        self.id
    }

    pub fn count_x(&self) -> i32 {
        self.count_x
    }

    pub fn count_y(&self) -> i32 {
        self.count_y
    }

    pub fn tile_shape(&self) -> RasterShape {
        self.tile_shape
    }

    /// Width of the whole grid in raster units.
    pub fn width(&self) -> usize {
        self.count_x.max(0) as usize * self.tile_shape.width()
    }

    /// Height of the whole grid in raster units.
    pub fn height(&self) -> usize {
        self.count_y.max(0) as usize * self.tile_shape.height()
    }

    pub fn contains_tile(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.count_x && y < self.count_y
    }

    /// Whether every tile of `tiles` (in tile coordinates) is inside the grid.
    pub fn contains(&self, tiles: GeoView) -> bool {
        tiles.x0 >= 0 && tiles.z0 >= 0 && tiles.x1 < self.count_x && tiles.z1 < self.count_y
    }
}

impl<V> Clone for TileMap<V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            count_x: self.count_x,
            count_y: self.count_y,
            tile_shape: self.tile_shape,
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<V> std::fmt::Debug for TileMap<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileMap")
            .field("id", &self.id)
            .field("count_x", &self.count_x)
            .field("count_y", &self.count_y)
            .field("tile_shape", &self.tile_shape)
            .finish()
    }
}

impl<V: Send + 'static> Loader<TileKey, V> for TileMap<V> {
    fn load(&self, key: TileKey) -> LoadFuture<V> {
        if self.contains_tile(key.x, key.y) {
            self.loader.load(key)
        } else {
            futures::future::ready(None).boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::from_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_out_of_grid_is_absent() {
        let map = TileMap::new(2, 1, RasterShape::new(4, 4), from_fn(|key: TileKey| Some(key.x)));

        assert_eq!(map.load(TileKey::new(1, 0)).await, Some(1));
        assert_eq!(map.load(TileKey::new(2, 0)).await, None);
        assert_eq!(map.load(TileKey::new(0, 1)).await, None);
        assert_eq!(map.load(TileKey::new(-1, 0)).await, None);
    }

    #[test]
    fn test_dimensions() {
        let map = TileMap::new(6, 3, RasterShape::new(10, 20), from_fn(|_: TileKey| Some(())));

        assert_eq!(map.width(), 60);
        assert_eq!(map.height(), 60);
        assert!(map.contains(GeoView::new(0, 0, 5, 2)));
        assert!(!map.contains(GeoView::new(0, 0, 6, 2)));
    }

    #[tokio::test]
    async fn test_cached_keeps_identity_and_coalesces() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let map = TileMap::new(
            1,
            1,
            RasterShape::new(2, 2),
            from_fn(move |_: TileKey| {
                counted.fetch_add(1, Ordering::SeqCst);
                Some(Arc::new(5u8))
            }),
        );
        let id = map.id();
        let cache = TileCache::new(Duration::from_secs(30), 8);

        let cached = map.cached(&cache);
        cached.load(TileKey::new(0, 0)).await;
        cached.load(TileKey::new(0, 0)).await;

        assert_eq!(cached.id(), id);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
