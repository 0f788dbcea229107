//! Editor configuration module.
//!
//! Handles loading, validating, and merging `inpage.toml`. Stock defaults
//! are overridden by the user's file, which only needs the keys it changes.
//!
//! ## Config File Location
//!
//! `inpage.toml` in the working directory, or in the directory passed with
//! `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [api]
//! base_url = "http://localhost:3000"  # Scheme + host (+ port) of the site
//! base_path = "/demo-web"             # Path the site is mounted under
//! timeout_secs = 30                   # Per-request timeout
//! # token = "..."                     # CMS API token (or --token / INPAGE_TOKEN)
//!
//! [preview]
//! output = "preview.html"             # Where `inpage preview` writes
//!
//! [log]
//! level = "info"                      # trace, debug, info, warn, error
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the config directory.
pub const CONFIG_FILENAME: &str = "inpage.toml";

/// Accepted `[log] level` values.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `inpage.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// CMS connection settings.
    pub api: ApiConfig,
    /// HTML preview settings.
    pub preview: PreviewConfig,
    /// Logging settings.
    pub log: LogConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }
        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(ConfigError::Validation(format!(
                "api.base_url is not a valid URL: {}",
                self.api.base_url
            )));
        }
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "log.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        if self.preview.output.is_empty() {
            return Err(ConfigError::Validation(
                "preview.output must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// CMS connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Scheme, host and optional port of the site.
    pub base_url: String,
    /// Path prefix the site (and its `/api`) is mounted under.
    pub base_path: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// API token, sent as `Authorization: JWT <token>`.
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            base_path: "/demo-web".to_string(),
            timeout_secs: 30,
            token: None,
        }
    }
}

/// HTML preview settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Output file for `inpage preview`.
    pub output: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            output: "preview.html".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Default log filter when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(EditorConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `inpage.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EditorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EditorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `inpage.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<EditorConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `inpage.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# inpage configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# CMS API
# ---------------------------------------------------------------------------
[api]
# Scheme, host and optional port of the site.
base_url = "http://localhost:3000"

# Path the site is mounted under. The REST API lives at <base_path>/api.
base_path = "/demo-web"

# Per-request timeout in seconds.
timeout_secs = 30

# API token of an admin or owner user. Prefer --token or INPAGE_TOKEN
# over storing it here.
# token = ""

# ---------------------------------------------------------------------------
# Preview
# ---------------------------------------------------------------------------
[preview]
# File written by `inpage preview`.
output = "preview.html"

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[log]
# Used when RUST_LOG is not set: trace, debug, info, warn or error.
level = "info"
"##
}
