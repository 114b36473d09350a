//! INI parsing logic for converting `Ini` → `ScrapeConfig`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ScrapeConfig;
use super::size::parse_size;

/// Parse an `Ini` object into a `ScrapeConfig`.
///
/// Starts from `ScrapeConfig::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ScrapeConfig, ConfigFileError> {
    let mut config = ScrapeConfig::default();

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        if let Some(v) = non_empty(section, "url") {
            config.source.url = Some(v.to_string());
        }
        if let Some(v) = section.get("max_level") {
            config.source.max_level =
                parse_number("source", "max_level", v, "must be an integer between 0 and 30")?;
            if config.source.max_level > 30 {
                return Err(ConfigFileError::invalid(
                    "source",
                    "max_level",
                    v,
                    "must be an integer between 0 and 30",
                ));
            }
        }
        if let Some(v) = section.get("timeout") {
            config.source.timeout =
                parse_number("source", "timeout", v, "must be a positive integer (seconds)")?;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section, "directory") {
            config.cache.directory = expand_tilde(v);
        }
        if let Some(v) = section.get("expire_days") {
            config.cache.expire_days =
                parse_number("cache", "expire_days", v, "must be a non-negative integer (days)")?;
        }
        if let Some(v) = section.get("skip_unexpired") {
            config.cache.skip_unexpired = parse_bool("cache", "skip_unexpired", v)?;
        }
    }

    // [scrape] section
    if let Some(section) = ini.section(Some("scrape")) {
        if let Some(v) = section.get("threads") {
            config.scrape.threads = parse_number("scrape", "threads", v, "must be a positive integer")?;
            if config.scrape.threads == 0 {
                return Err(ConfigFileError::invalid(
                    "scrape",
                    "threads",
                    v,
                    "must be a positive integer",
                ));
            }
        }
        if let Some(v) = section.get("min_zoom") {
            config.scrape.min_zoom = parse_number("scrape", "min_zoom", v, "must be a zoom level")?;
        }
        if let Some(v) = section.get("max_zoom") {
            config.scrape.max_zoom = parse_number("scrape", "max_zoom", v, "must be a zoom level")?;
        }
        if let Some(v) = section.get("max_bytes") {
            config.scrape.max_bytes = parse_size(v).map_err(|_| {
                ConfigFileError::invalid(
                    "scrape",
                    "max_bytes",
                    v,
                    "expected format like '2GB', '500MB', or '1024KB'",
                )
            })?;
        }
        if let Some(v) = section.get("debug_tint") {
            config.scrape.debug_tint = parse_bool("scrape", "debug_tint", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "level") {
            config.logging.level = v.to_string();
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = Some(expand_tilde(v));
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::invalid(section, key, value, reason))
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigFileError::invalid(
            section,
            key,
            value,
            "must be true or false",
        )),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
