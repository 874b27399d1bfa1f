// Configuration loading and validation (config/hoopstats.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::season::Season;

/// Name of the configuration file inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "hoopstats.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("{config} is missing and there is no default at {default} to copy; run from the project root")]
    NoDefault { config: PathBuf, default: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub seasons: SeasonsConfig,
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

/// Inclusive range of season start years, fetched newest first.
#[derive(Debug, Clone, Deserialize)]
pub struct SeasonsConfig {
    pub start_year: u16,
    pub end_year: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub request_delay_secs: u64,
    pub user_agent: String,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub dir: String,
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub title: String,
    pub export_filename: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/hoopstats.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` for normal startup.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_path(base_dir);
    let text = std::fs::read_to_string(&path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound { path: path.clone() },
        _ => ConfigError::Io {
            path: path.clone(),
            source,
        },
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/hoopstats.toml` to `config/hoopstats.toml` unless a config
/// file is already there. Returns the path written, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = config_path(base_dir);
    if target.exists() {
        return Ok(None);
    }

    let default = base_dir.join("defaults").join(CONFIG_FILE);
    if !default.is_file() {
        return Err(ConfigError::NoDefault {
            config: target,
            default,
        });
    }

    let config_dir = base_dir.join("config");
    std::fs::create_dir_all(&config_dir).map_err(|source| ConfigError::Io {
        path: config_dir,
        source,
    })?;
    std::fs::copy(&default, &target).map_err(|source| ConfigError::Io {
        path: target.clone(),
        source,
    })?;

    Ok(Some(target))
}

/// Load config relative to the current working directory, seeding it from
/// the shipped default on first run.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config_path(base_dir: &Path) -> PathBuf {
    base_dir.join("config").join(CONFIG_FILE)
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let seasons = &config.seasons;
    for (field, year) in [
        ("seasons.start_year", seasons.start_year),
        ("seasons.end_year", seasons.end_year),
    ] {
        if Season::new(year).is_err() {
            return Err(invalid(
                field,
                format!(
                    "must be a four-digit year between {} and {}, got {year}",
                    Season::MIN_YEAR,
                    Season::MAX_YEAR
                ),
            ));
        }
    }
    if seasons.start_year < seasons.end_year {
        return Err(invalid(
            "seasons.start_year",
            format!(
                "must not be earlier than seasons.end_year ({}), got {}",
                seasons.end_year, seasons.start_year
            ),
        ));
    }

    let provider = &config.provider;
    if !(provider.base_url.starts_with("http://") || provider.base_url.starts_with("https://")) {
        return Err(invalid(
            "provider.base_url",
            format!("must be an http(s) URL, got `{}`", provider.base_url),
        ));
    }
    if provider.timeout_secs == 0 {
        return Err(invalid("provider.timeout_secs", "must be > 0"));
    }

    if config.cache.enabled {
        if config.cache.dir.trim().is_empty() {
            return Err(invalid("cache.dir", "must not be empty when the cache is enabled"));
        }
        if config.cache.ttl_secs == 0 {
            return Err(invalid("cache.ttl_secs", "must be > 0 when the cache is enabled"));
        }
    }

    if config.server.port == 0 {
        return Err(invalid("server.port", "must be > 0"));
    }
    if config.server.export_filename.trim().is_empty() {
        return Err(invalid("server.export_filename", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
