//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::settings::*;
use crate::projection::ProjectionKind;

// =============================================================================
// Cache defaults
// =============================================================================

/// Seconds an unused tile stays in memory.
pub const DEFAULT_TILE_EXPIRY_SECS: u64 = 30;

/// Maximum number of tiles held in memory across all datasets.
pub const DEFAULT_TILE_CAPACITY: u64 = 256;

/// Seconds an unused chunk stays in memory.
pub const DEFAULT_CHUNK_EXPIRY_SECS: u64 = 10;

/// Maximum number of chunks held in memory.
pub const DEFAULT_CHUNK_CAPACITY: u64 = 1024;

// =============================================================================
// Download defaults
// =============================================================================

/// Base URL of the dataset server.
pub const DEFAULT_ENDPOINT: &str = "https://terrarium.gegy.dev/geo3";

/// Request timeout in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = crate::loader::DEFAULT_TIMEOUT_SECS;

/// Maximum concurrent downloads.
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 16;

pub const MIN_DOWNLOAD_CONCURRENCY: usize = 1;

pub const MAX_DOWNLOAD_CONCURRENCY: usize = 256;

pub const DEFAULT_USER_AGENT: &str = crate::loader::DEFAULT_USER_AGENT;

// =============================================================================
// Tile defaults
// =============================================================================

/// Width and height of a dataset tile.
pub const DEFAULT_TILE_SIZE: usize = 1000;

// =============================================================================
// Sampling defaults
// =============================================================================

pub const DEFAULT_MAX_UPSAMPLE: f64 = crate::layer::DEFAULT_MAX_UPSAMPLE;

pub const DEFAULT_MAX_DOWNSAMPLE: f64 = crate::layer::DEFAULT_MAX_DOWNSAMPLE;

// =============================================================================
// Voronoi defaults
// =============================================================================

pub const DEFAULT_VORONOI_RADIUS: f32 = crate::projection::DEFAULT_JITTER_RADIUS;

pub const DEFAULT_VORONOI_SEED: u64 = crate::projection::DEFAULT_JITTER_SEED;

// =============================================================================
// Projection defaults
// =============================================================================

pub const DEFAULT_PROJECTION: ProjectionKind = ProjectionKind::Equirectangular;

pub const DEFAULT_METERS_PER_BLOCK: f64 = 30.0;

/// Default disk cache directory: the platform cache directory, or
/// `./terralayer-cache` when none is known.
pub fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("terralayer"))
        .unwrap_or_else(|| PathBuf::from("terralayer-cache"))
}

/// Clamps download concurrency into range, logging when it had to.
pub(super) fn clamp_download_concurrency(value: usize) -> usize {
    let clamped = value.clamp(MIN_DOWNLOAD_CONCURRENCY, MAX_DOWNLOAD_CONCURRENCY);
    if clamped != value {
        tracing::warn!(
            requested = value,
            min = MIN_DOWNLOAD_CONCURRENCY,
            max = MAX_DOWNLOAD_CONCURRENCY,
            "download concurrency out of range, clamping to {}",
            clamped
        );
    }
    clamped
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                directory: default_cache_directory(),
                tile_expiry_secs: DEFAULT_TILE_EXPIRY_SECS,
                tile_capacity: DEFAULT_TILE_CAPACITY,
                chunk_expiry_secs: DEFAULT_CHUNK_EXPIRY_SECS,
                chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            },
            download: DownloadSettings {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
                concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            tiles: TileSettings {
                tile_size: DEFAULT_TILE_SIZE,
            },
            sampling: SamplingSettings {
                max_upsample: DEFAULT_MAX_UPSAMPLE,
                max_downsample: DEFAULT_MAX_DOWNSAMPLE,
            },
            voronoi: VoronoiSettings {
                radius: DEFAULT_VORONOI_RADIUS,
                seed: DEFAULT_VORONOI_SEED,
            },
            projection: ProjectionSettings {
                kind: DEFAULT_PROJECTION,
                meters_per_block: DEFAULT_METERS_PER_BLOCK,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_download_concurrency() {
        assert_eq!(clamp_download_concurrency(0), 1);
        assert_eq!(clamp_download_concurrency(16), 16);
        assert_eq!(clamp_download_concurrency(10_000), 256);
    }
}
