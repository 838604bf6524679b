//! Shared memory cache for the tiles of every tile map.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::FutureExt;

use super::MemoryCacher;
use crate::loader::{Cacher, LoadFn, LoadFuture};
use crate::tile::TileKey;

type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Identity of a tile map within a [`TileCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileMapId(u64);

impl TileMapId {
    /// Allocates a process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// One bounded memory cache shared by every tile map.
///
/// Entries are keyed by `(map, tile)`, so eviction pressure is global rather
/// than per dataset.
#[derive(Clone)]
pub struct TileCache {
    inner: Arc<MemoryCacher<(TileMapId, TileKey), ErasedValue>>,
}

impl TileCache {
    pub fn new(time_to_idle: Duration, max_tiles: u64) -> Self {
        Self {
            inner: Arc::new(MemoryCacher::new(time_to_idle, max_tiles)),
        }
    }

    /// Returns a typed view of this cache for one tile map.
    pub fn cacher_for<V>(&self, map_id: TileMapId) -> TileCacher<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        TileCacher {
            inner: Arc::clone(&self.inner),
            map_id,
            _value: PhantomData,
        }
    }

    /// Approximate number of tiles held across all maps.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache").field("inner", &self.inner).finish()
    }
}

/// Typed [`Cacher`] over a [`TileCache`] for a single tile map.
pub struct TileCacher<V> {
    inner: Arc<MemoryCacher<(TileMapId, TileKey), ErasedValue>>,
    map_id: TileMapId,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for TileCacher<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            map_id: self.map_id,
            _value: PhantomData,
        }
    }
}

impl<V> Cacher<TileKey, V> for TileCacher<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get_or_load(&self, key: TileKey, load: LoadFn<V>) -> LoadFuture<V> {
        let erased: LoadFn<ErasedValue> = Box::new(move || {
            let fut = load();
            async move { fut.await.map(|value| Arc::new(value) as ErasedValue) }.boxed()
        });
        let fut = self.inner.get_or_load((self.map_id, key), erased);
        async move { fut.await.and_then(|value| value.downcast_ref::<V>().cloned()) }.boxed()
    }
}
