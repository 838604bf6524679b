//! Integration tests for the tile pipeline.
//!
//! These tests drive the full stack over an in-memory "network":
//! - HTTP bodies through the limiter and the disk cache
//! - Container decoding and tile compositing
//! - Level selection and projected resampling
//! - Chunk assembly and the chunk cache

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::{join_all, FutureExt};
use tempfile::TempDir;
use terralayer::cache::{tile_path, FileCacher, TileCache};
use terralayer::executor::{SharedExecutor, TokioExecutor};
use terralayer::format::{RasterReader, RasterWriter};
use terralayer::geo::{Attachment, AttachmentRegistry, GeoChunk, GeoChunkCache, GeoView};
use terralayer::layer::{GeoLayer, LeveledRasterSampler, RasterSampler, SharedSampler};
use terralayer::loader::{from_fn, CacherExt, ConcurrencyLimiter, LoadFuture, Loader, LoaderExt};
use terralayer::projection::{Projection, ProjectionKind, EQUATOR_CIRCUMFERENCE};
use terralayer::raster::{Raster, RasterShape, ShortRaster};
use terralayer::tile::{TileKey, TileMap, TiledRasterSampler};

// =============================================================================
// Test Helpers
// =============================================================================

const TILE: usize = 90;

/// Serves ramp tiles whose values are the global column index.
fn ramp_server(requests: Arc<AtomicUsize>) -> impl Loader<String, Bytes> {
    from_fn(move |url: String| {
        requests.fetch_add(1, Ordering::SeqCst);
        let mut parts = url.rsplit('/');
        let _y = parts.next()?;
        let x: usize = parts.next()?.parse().ok()?;

        let shape = RasterShape::new(TILE, TILE);
        let mut raster = ShortRaster::create(shape);
        for row in 0..TILE {
            for col in 0..TILE {
                raster.put(col, row, (x * TILE + col) as i16);
            }
        }
        Some(Bytes::from(RasterWriter::new().write(&raster).ok()?))
    })
}

/// A 4×2 grid of ramp tiles, cached on disk under `root` and in `cache`.
fn ramp_sampler(
    root: PathBuf,
    cache: &TileCache,
    requests: Arc<AtomicUsize>,
    executor: SharedExecutor,
) -> TiledRasterSampler<ShortRaster> {
    let limiter = Arc::new(ConcurrencyLimiter::new(2, "http"));
    let bytes = ramp_server(requests)
        .limited(limiter)
        .map_key(|key: TileKey| format!("mem://ramp/{}", key.path()))
        .cached(
            FileCacher::new().map_key(move |key: TileKey| tile_path(&root, "ramp", 0, key)),
        );
    let tiles = RasterReader::loader::<ShortRaster>(Arc::clone(&executor)).compose(bytes);
    let map = TileMap::new(4, 2, RasterShape::new(TILE, TILE), tiles).cached(cache);
    TiledRasterSampler::new(map, executor)
}

fn one_block_per_degree() -> Projection {
    Projection::new(ProjectionKind::Equirectangular, EQUATOR_CIRCUMFERENCE / 360.5).unwrap()
}

// =============================================================================
// Tile loading
// =============================================================================

#[tokio::test]
async fn test_view_across_tiles_is_composited() {
    let root = TempDir::new().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let cache = TileCache::new(Duration::from_secs(30), 64);
    let sampler = ramp_sampler(
        root.path().to_path_buf(),
        &cache,
        Arc::clone(&requests),
        TokioExecutor::shared(),
    );

    let raster = sampler.get(GeoView::new(88, 10, 91, 11)).await.unwrap();

    assert_eq!(raster.shape(), RasterShape::new(4, 2));
    assert_eq!(raster.get(0, 0), 88);
    assert_eq!(raster.get(3, 1), 91);
    assert_eq!(requests.load(Ordering::SeqCst), 2);
    assert!(root.path().join("ramp/0/0/0").exists());
    assert!(root.path().join("ramp/0/1/0").exists());
}

#[tokio::test]
async fn test_concurrent_views_fetch_each_tile_once() {
    let root = TempDir::new().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let cache = TileCache::new(Duration::from_secs(30), 64);
    let sampler = ramp_sampler(
        root.path().to_path_buf(),
        &cache,
        Arc::clone(&requests),
        TokioExecutor::shared(),
    );

    let views = (0..10).map(|i| sampler.get(GeoView::new(i, 0, 100 + i, 5)));
    let rasters = join_all(views).await;

    assert!(rasters.iter().all(Option::is_some));
    assert_eq!(requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_disk_cache_survives_memory_cache() {
    let root = TempDir::new().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let view = GeoView::new(0, 0, 9, 9);

    let warm = ramp_sampler(
        root.path().to_path_buf(),
        &TileCache::new(Duration::from_secs(30), 64),
        Arc::clone(&requests),
        TokioExecutor::shared(),
    );
    warm.get(view).await.unwrap();

    let cold = ramp_sampler(
        root.path().to_path_buf(),
        &TileCache::new(Duration::from_secs(30), 64),
        Arc::clone(&requests),
        TokioExecutor::shared(),
    );
    let raster = cold.get(view).await.unwrap();

    assert_eq!(raster.get(9, 0), 9);
    assert_eq!(requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_view_outside_grid_is_absent() {
    let root = TempDir::new().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let sampler = ramp_sampler(
        root.path().to_path_buf(),
        &TileCache::new(Duration::from_secs(30), 64),
        Arc::clone(&requests),
        TokioExecutor::shared(),
    );

    assert!(sampler.get(GeoView::new(-5, 0, 3, 3)).await.is_none());
    assert!(sampler.get(GeoView::new(350, 170, 365, 179)).await.is_none());
    assert_eq!(requests.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Projection
// =============================================================================

#[tokio::test]
async fn test_projected_view_follows_ramp() {
    let root = TempDir::new().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let executor = TokioExecutor::shared();
    let sampler = ramp_sampler(
        root.path().to_path_buf(),
        &TileCache::new(Duration::from_secs(30), 64),
        requests,
        Arc::clone(&executor),
    );
    let levels = LeveledRasterSampler::new(vec![Arc::new(sampler) as SharedSampler<ShortRaster>])
        .unwrap();
    let layer = one_block_per_degree().interpolated_layer(levels, executor);

    let raster = layer.get_exact(GeoView::new(0, 0, 9, 9)).await.unwrap();

    assert_eq!(raster.shape(), RasterShape::new(10, 10));
    assert_eq!(raster.get(0, 0), 180);
    for x in 1..10 {
        assert!(raster.get(x, 4) >= raster.get(x - 1, 4));
    }
    assert!(raster.get(9, 9) <= 190);
}

// =============================================================================
// Chunks
// =============================================================================

/// Chunk layer with one projected attachment and one that never loads.
struct RampChunks {
    ramp: Arc<dyn GeoLayer<ShortRaster>>,
    elevation: Attachment<ShortRaster>,
    rainfall: Attachment<ShortRaster>,
}

impl GeoLayer<GeoChunk> for RampChunks {
    fn get(&self, view: GeoView, output: RasterShape) -> LoadFuture<GeoChunk> {
        let builder = GeoChunk::builder()
            .put(&self.elevation, self.ramp.get(view, output))
            .put(&self.rainfall, futures::future::ready(None));
        async move { Some(builder.build().await) }.boxed()
    }
}

#[tokio::test]
async fn test_chunk_cache_assembles_partial_chunks_once() {
    let root = TempDir::new().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let executor = TokioExecutor::shared();
    let sampler = ramp_sampler(
        root.path().to_path_buf(),
        &TileCache::new(Duration::from_secs(30), 64),
        Arc::clone(&requests),
        Arc::clone(&executor),
    );
    let levels = LeveledRasterSampler::new(vec![Arc::new(sampler) as SharedSampler<ShortRaster>])
        .unwrap();

    let mut registry = AttachmentRegistry::new();
    let layer = RampChunks {
        ramp: Arc::new(one_block_per_degree().interpolated_layer(levels, executor)),
        elevation: registry.register("elevation").unwrap(),
        rainfall: registry.register("annual_rainfall").unwrap(),
    };
    let elevation = layer.elevation.clone();
    let rainfall = layer.rainfall.clone();
    let chunks = GeoChunkCache::new(Arc::new(layer), Duration::from_secs(10), 16);

    let first = chunks.get(GeoView::new(0, 0, 15, 15)).await;
    let second = chunks.get(GeoView::new(0, 0, 15, 15)).await;

    assert_eq!(first.len(), 1);
    assert_eq!(first.get(&elevation).unwrap().get(0, 0), 180);
    assert!(first.get(&rainfall).is_none());
    assert!(first.get_or_err(&rainfall).is_err());
    assert_eq!(second.len(), 1);
    assert_eq!(requests.load(Ordering::SeqCst), 1);
}
