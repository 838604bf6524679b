//! Bounded tile grids and tile compositing.
//!
//! A [`TileMap`] addresses fixed-shape tiles in a `count_x × count_y` grid;
//! a [`TiledRasterSampler`] stitches the tiles covering a [`GeoView`] into a
//! single raster.
//!
//! ```text
//!   view ──floor_div(tile_shape)──► tile bounds
//!                                      │
//!            ┌───────────┬─────────────┤ join_all(map.load(key))
//!            ▼           ▼             ▼
//!         (0, 0)      (1, 0)   ...  (x, y)
//!            └───────────┴──────┬──────┘
//!                               ▼
//!            copy_from_clipped(tile, x*tw - view.x0, y*th - view.z0)
//! ```
//!
//! [`GeoView`]: crate::geo::GeoView

mod key;
mod map;
mod sampler;

pub use key::TileKey;
pub use map::TileMap;
pub use sampler::TiledRasterSampler;
