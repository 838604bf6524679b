//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::projection::ProjectionKind;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub download: DownloadSettings,
    pub tiles: TileSettings,
    pub sampling: SamplingSettings,
    pub voronoi: VoronoiSettings,
    pub projection: ProjectionSettings,
}

/// Memory and disk cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Root of the disk cache
    pub directory: PathBuf,
    /// Seconds an unused tile stays in memory
    pub tile_expiry_secs: u64,
    /// Maximum tiles in memory
    pub tile_capacity: u64,
    /// Seconds an unused chunk stays in memory
    pub chunk_expiry_secs: u64,
    /// Maximum chunks in memory
    pub chunk_capacity: u64,
}

impl CacheSettings {
    pub fn tile_expiry(&self) -> Duration {
        Duration::from_secs(self.tile_expiry_secs)
    }

    pub fn chunk_expiry(&self) -> Duration {
        Duration::from_secs(self.chunk_expiry_secs)
    }
}

/// Download configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    /// Base URL, without a trailing slash
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Maximum concurrent requests, shared by every dataset.
    ///
    /// Hard limits: 1-256 (values outside this range are clamped).
    pub concurrency: usize,
    pub user_agent: String,
}

impl DownloadSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileSettings {
    pub tile_size: usize,
}

/// Level selection factors.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSettings {
    pub max_upsample: f64,
    pub max_downsample: f64,
}

/// Categorical resampling.
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiSettings {
    /// Jitter radius, in [0, 1)
    pub radius: f32,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionSettings {
    pub kind: ProjectionKind,
    pub meters_per_block: f64,
}
