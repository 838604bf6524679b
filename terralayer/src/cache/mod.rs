//! Cache tiers interposed between loaders.
//!
//! | Tier | Type | Key | Holds |
//! |------|------|-----|-------|
//! | Memory | [`MemoryCacher`] | any | shared pending/complete futures |
//! | Disk | [`FileCacher`] | `PathBuf` | raw response bytes |
//! | Tile | [`TileCache`] | `(TileMapId, TileKey)` | decoded tiles of every map |
//!
//! All tiers implement [`Cacher`](crate::loader::Cacher) and coalesce
//! concurrent requests for the same key into a single underlying load.

mod file;
mod memory;
mod path;
mod tile;

pub use file::FileCacher;
pub use memory::MemoryCacher;
pub use path::{single_file_path, temporary_path, tile_path};
pub use tile::{TileCache, TileCacher, TileMapId};
