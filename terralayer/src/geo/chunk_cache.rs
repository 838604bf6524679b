use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use super::{GeoChunk, GeoView};
use crate::cache::MemoryCacher;
use crate::layer::GeoLayer;
use crate::loader::Cacher;

/// Memory cache of exact-resolution chunks keyed by view.
///
/// Views that fail to load resolve to an empty chunk rather than nothing.
pub struct GeoChunkCache {
    layer: Arc<dyn GeoLayer<GeoChunk>>,
    cacher: MemoryCacher<GeoView, GeoChunk>,
}

impl GeoChunkCache {
    pub fn new(
        layer: Arc<dyn GeoLayer<GeoChunk>>,
        time_to_idle: Duration,
        max_chunks: u64,
    ) -> Self {
        Self {
            layer,
            cacher: MemoryCacher::new(time_to_idle, max_chunks),
        }
    }

    pub fn get(&self, view: GeoView) -> BoxFuture<'static, GeoChunk> {
        let layer = Arc::clone(&self.layer);
        let load = self
            .cacher
            .get_or_load(view, Box::new(move || layer.get_exact(view)));
        async move {
            load.await.unwrap_or_else(|| {
                debug!(view = %view, "chunk unavailable");
                GeoChunk::empty()
            })
        }
        .boxed()
    }

    pub fn entry_count(&self) -> u64 {
        self.cacher.entry_count()
    }
}
