//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::defaults::clamp_download_concurrency;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::projection::ProjectionKind;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("tile_expiry_secs") {
            config.cache.tile_expiry_secs = parse_value(
                "cache",
                "tile_expiry_secs",
                v,
                "must be a whole number of seconds",
            )?;
        }
        if let Some(v) = section.get("tile_capacity") {
            config.cache.tile_capacity = parse_value(
                "cache",
                "tile_capacity",
                v,
                "must be a positive integer",
            )?;
        }
        if let Some(v) = section.get("chunk_expiry_secs") {
            config.cache.chunk_expiry_secs = parse_value(
                "cache",
                "chunk_expiry_secs",
                v,
                "must be a whole number of seconds",
            )?;
        }
        if let Some(v) = section.get("chunk_capacity") {
            config.cache.chunk_capacity = parse_value(
                "cache",
                "chunk_capacity",
                v,
                "must be a positive integer",
            )?;
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("endpoint") {
            let v = v.trim().trim_end_matches('/');
            if !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(invalid("download", "endpoint", v, "must be an http(s) URL"));
            }
            config.download.endpoint = v.to_string();
        }
        if let Some(v) = section.get("timeout_secs") {
            let timeout: u64 = parse_value(
                "download",
                "timeout_secs",
                v,
                "must be a whole number of seconds",
            )?;
            if timeout == 0 {
                return Err(invalid(
                    "download",
                    "timeout_secs",
                    v,
                    "must be greater than 0",
                ));
            }
            config.download.timeout_secs = timeout;
        }
        if let Some(v) = section.get("concurrency") {
            let parsed: usize = parse_value(
                "download",
                "concurrency",
                v,
                "must be a positive integer",
            )?;
            config.download.concurrency = clamp_download_concurrency(parsed);
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.download.user_agent = v.to_string();
            }
        }
    }

    // [tiles] section
    if let Some(section) = ini.section(Some("tiles")) {
        if let Some(v) = section.get("tile_size") {
            let size: usize = parse_value("tiles", "tile_size", v, "must be a positive integer")?;
            if size == 0 {
                return Err(invalid("tiles", "tile_size", v, "must be greater than 0"));
            }
            config.tiles.tile_size = size;
        }
    }

    // [sampling] section
    if let Some(section) = ini.section(Some("sampling")) {
        if let Some(v) = section.get("max_upsample") {
            config.sampling.max_upsample = parse_factor("max_upsample", v)?;
        }
        if let Some(v) = section.get("max_downsample") {
            config.sampling.max_downsample = parse_factor("max_downsample", v)?;
        }
    }

    // [voronoi] section
    if let Some(section) = ini.section(Some("voronoi")) {
        if let Some(v) = section.get("radius") {
            let radius: f32 = parse_value("voronoi", "radius", v, "must be a number")?;
            if !(0.0..1.0).contains(&radius) {
                return Err(invalid("voronoi", "radius", v, "must be in range [0, 1)"));
            }
            config.voronoi.radius = radius;
        }
        if let Some(v) = section.get("seed") {
            config.voronoi.seed = parse_value(
                "voronoi",
                "seed",
                v,
                "must be an unsigned 64-bit integer",
            )?;
        }
    }

    // [projection] section
    if let Some(section) = ini.section(Some("projection")) {
        if let Some(v) = section.get("type") {
            config.projection.kind = ProjectionKind::from_str(v).map_err(|_| {
                invalid(
                    "projection",
                    "type",
                    v,
                    "must be one of: equirectangular, mercator",
                )
            })?;
        }
        if let Some(v) = section.get("meters_per_block") {
            let meters: f64 = parse_value("projection", "meters_per_block", v, "must be a number")?;
            if !(meters.is_finite() && meters > 0.0) {
                return Err(invalid(
                    "projection",
                    "meters_per_block",
                    v,
                    "must be greater than 0",
                ));
            }
            config.projection.meters_per_block = meters;
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_factor(key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let factor: f64 = parse_value("sampling", key, value, "must be a number")?;
    if !(factor.is_finite() && factor >= 1.0) {
        return Err(invalid("sampling", key, value, "must be at least 1.0"));
    }
    Ok(factor)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
