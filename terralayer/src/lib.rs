//! terralayer - Tiled geographic raster streaming
//!
//! This library turns sparse, tiled, multi-resolution remote raster datasets
//! (elevation, land cover, soil, climate) into on-demand pixel windows in a
//! projected coordinate space. Tiles are fetched over HTTP, persisted on disk,
//! held in memory, composited and resampled into the requested shape.
//!
//! # Architecture
//!
//! ```text
//!   GeoLayer::get(view, shape)
//!            │
//!            ▼
//!   ResamplingLayer ──► LeveledRasterSampler::choose
//!            │
//!            ▼
//!   TiledRasterSampler ──► TileMap ──► TileCache (memory)
//!                                          │
//!                                          ▼
//!                              RasterReader ◄── FileCacher (disk)
//!                                                   │
//!                                                   ▼
//!                                 ConcurrencyLimiter ──► HttpLoader
//! ```
//!
//! # High-Level API
//!
//! ```ignore
//! use terralayer::config::ConfigFile;
//! use terralayer::earth::{EarthAttachmentKeys, EarthAttachments, EarthLayers, EarthTiles};
//! use terralayer::executor::TokioExecutor;
//! use terralayer::geo::{AttachmentRegistry, GeoView};
//! use terralayer::layer::GeoLayer;
//!
//! let config = ConfigFile::load()?;
//! let executor = TokioExecutor::shared();
//!
//! let mut registry = AttachmentRegistry::new();
//! let keys = EarthAttachmentKeys::register(&mut registry)?;
//! let tiles = EarthTiles::from_config(&config, executor.clone())?;
//! let layers = EarthLayers::from_config(&config, tiles, keys.clone(), executor)?;
//!
//! let chunk = layers.get_exact(GeoView::new(0, 0, 15, 15)).await;
//! let earth = chunk.and_then(|chunk| EarthAttachments::from_chunk(chunk, &keys));
//! ```

pub mod cache;
pub mod config;
pub mod earth;
pub mod executor;
pub mod format;
pub mod geo;
pub mod layer;
pub mod loader;
pub mod logging;
pub mod projection;
pub mod raster;
pub mod tile;

/// Version of the terralayer library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
