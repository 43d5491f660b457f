//! INI file loading and validation.
//!
//! This is the single place where INI key names map to [`Settings`] fields.
//! Parsing starts from defaults and overlays any values found in the file.

use super::settings::Settings;
use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file is not valid INI: {0}")]
    Parse(String),

    #[error("invalid config value [{section}] {key} = {value:?}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Load settings from an INI file.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ini = Ini::load_from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))?;
    parse_ini(&ini)
}

/// Load settings from an INI file, falling back to defaults when the file
/// does not exist. Other errors (unreadable file, bad values) still fail.
pub fn load_settings_or_default(path: &Path) -> Result<Settings, ConfigFileError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    load_settings(path)
}

fn parse_ini(ini: &Ini) -> Result<Settings, ConfigFileError> {
    let mut settings = Settings::default();

    if let Some(section) = ini.section(Some("source")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim().trim_end_matches('/');
            if v.is_empty() {
                return Err(invalid("source", "base_url", v, "must not be empty"));
            }
            settings.source.base_url = v.to_string();
        }
    }

    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("workers") {
            settings.download.workers = parse_number(v, "download", "workers", 1, 256)? as usize;
        }
        if let Some(v) = section.get("max_attempts") {
            settings.download.max_attempts = parse_number(v, "download", "max_attempts", 1, 32)?;
        }
        if let Some(v) = section.get("request_timeout_secs") {
            settings.download.request_timeout_secs =
                parse_number(v, "download", "request_timeout_secs", 1, 600)? as u64;
        }
        if let Some(v) = section.get("base_backoff_ms") {
            settings.download.base_backoff_ms =
                parse_number(v, "download", "base_backoff_ms", 1, 60_000)? as u64;
        }
        if let Some(v) = section.get("max_backoff_ms") {
            settings.download.max_backoff_ms =
                parse_number(v, "download", "max_backoff_ms", 1, 600_000)? as u64;
        }
        if let Some(v) = section.get("jitter") {
            let jitter: f64 = v.trim().parse().map_err(|_| {
                invalid("download", "jitter", v, "expected a number between 0 and 1")
            })?;
            if !(0.0..=1.0).contains(&jitter) {
                return Err(invalid(
                    "download",
                    "jitter",
                    v,
                    "expected a number between 0 and 1",
                ));
            }
            settings.download.jitter = jitter;
        }
    }

    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                settings.cache.directory = PathBuf::from(v);
            }
        }
    }

    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                settings.output.directory = PathBuf::from(v);
            }
        }
        if let Some(v) = section.get("format") {
            let v = v.trim().to_lowercase();
            if v != "tiff" && v != "png" {
                return Err(invalid("output", "format", &v, "must be 'tiff' or 'png'"));
            }
            settings.output.format = v;
        }
    }

    if let Some(section) = ini.section(Some("queue")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                settings.queue.file = PathBuf::from(v);
            }
        }
    }

    Ok(settings)
}

fn parse_number(
    value: &str,
    section: &str,
    key: &str,
    min: u32,
    max: u32,
) -> Result<u32, ConfigFileError> {
    let reason = format!("expected an integer between {} and {}", min, max);
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| (min..=max).contains(n))
        .ok_or_else(|| invalid(section, key, value, &reason))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
