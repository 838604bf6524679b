//! Configuration for terralayer components.
//!
//! User configuration lives in `~/.terralayer/config.ini`. The module is
//! split by concern:
//!
//! - [`settings`]: one plain struct per `[section]`
//! - [`defaults`]: `DEFAULT_*` constants and `ConfigFile::default()`
//! - `parser`: INI to [`ConfigFile`], the single place key names are mapped
//! - `writer`: [`ConfigFile`] to a commented INI string
//! - [`file`]: loading, saving and path resolution
//!
//! # Example
//!
//! ```
//! use terralayer::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.tiles.tile_size, 1000);
//! ```

pub mod defaults;
pub mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheSettings, ConfigFile, DownloadSettings, ProjectionSettings, SamplingSettings,
    TileSettings, VoronoiSettings,
};
