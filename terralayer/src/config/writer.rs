//! INI serialization logic for converting `ConfigFile` → INI string.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[cache]
; Root directory of the disk cache. Datasets are stored as
; <directory>/<dataset>/<level>/<x>/<y>
directory = {}
; Seconds an unused tile stays in memory (default: 30)
tile_expiry_secs = {}
; Maximum number of tiles in memory, across all datasets (default: 256)
tile_capacity = {}
; Seconds an unused chunk stays in memory (default: 10)
chunk_expiry_secs = {}
; Maximum number of chunks in memory (default: 1024)
chunk_capacity = {}

[download]
; Base URL of the dataset server
endpoint = {}
; Request timeout in seconds (default: 60)
timeout_secs = {}
; Maximum concurrent requests, 1-256 (default: 16)
concurrency = {}
user_agent = {}

[tiles]
; Width and height of dataset tiles (default: 1000)
tile_size = {}

[sampling]
; How far a level may be stretched before a finer one is used (default: 2)
max_upsample = {}
; How far a level may exceed the requested density (default: 4)
max_downsample = {}

[voronoi]
; Jitter radius of categorical resampling, in [0, 1) (default: 0.45)
radius = {}
seed = {}

[projection]
; equirectangular or mercator (default: equirectangular)
type = {}
; Meters covered by one block at the equator (default: 30)
meters_per_block = {}
"#,
        config.cache.directory.to_string_lossy(),
        config.cache.tile_expiry_secs,
        config.cache.tile_capacity,
        config.cache.chunk_expiry_secs,
        config.cache.chunk_capacity,
        config.download.endpoint,
        config.download.timeout_secs,
        config.download.concurrency,
        config.download.user_agent,
        config.tiles.tile_size,
        config.sampling.max_upsample,
        config.sampling.max_downsample,
        config.voronoi.radius,
        config.voronoi.seed,
        config.projection.kind,
        config.projection.meters_per_block,
    )
}
