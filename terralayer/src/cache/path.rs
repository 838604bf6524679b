//! Cache path construction.

use std::path::{Path, PathBuf};

use crate::tile::TileKey;

/// Path of a cached tile.
///
/// ```text
/// <cache_root>/<dataset>/<level>/<x>/<y>
/// ```
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use terralayer::cache::tile_path;
/// use terralayer::tile::TileKey;
///
/// let path = tile_path(&PathBuf::from("/cache"), "soil/clay", 3, TileKey::new(12, 4));
/// assert_eq!(path, PathBuf::from("/cache/soil/clay/3/12/4"));
/// ```
pub fn tile_path(cache_root: &Path, dataset: &str, level: u32, key: TileKey) -> PathBuf {
    cache_root
        .join(dataset)
        .join(level.to_string())
        .join(key.x.to_string())
        .join(key.y.to_string())
}

/// Path of a single-file dataset cached at the root.
pub fn single_file_path(cache_root: &Path, file_name: &str) -> PathBuf {
    cache_root.join(file_name)
}

/// Sibling path used while a cache file is being written.
///
/// The `.tmp` suffix is appended to the full file name, so `12` becomes
/// `12.tmp` and `data.xz` becomes `data.xz.tmp`.
pub fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
