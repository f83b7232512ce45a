//! Configuration loading
//!
//! Bootstrap configuration comes from a TOML file. Resolution order for the
//! file itself:
//! 1. Command-line argument (highest priority)
//! 2. `MATHOPS_CONFIG` environment variable
//! 3. `~/.config/mathops/config.toml`, then `/etc/mathops/config.toml`
//! 4. Compiled defaults (no file)
//!
//! A file missing from the default locations only logs a warning and falls
//! back to compiled defaults. A file named on the command line or in
//! `MATHOPS_CONFIG` must exist; if it does not, loading fails with
//! `Error::Config`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "MATHOPS_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Database file locations for each context
    #[serde(default)]
    pub databases: DatabasePaths,

    /// When true, jobs report intended changes without writing them
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            databases: DatabasePaths::default(),
            dry_run: default_dry_run(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Database file for each of the three contexts a job may touch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabasePaths {
    /// Local application schema
    #[serde(default = "default_primary_path")]
    pub primary: PathBuf,

    /// Operational data store (read-only warehouse)
    #[serde(default = "default_ods_path")]
    pub ods: PathBuf,

    /// Banner live system
    #[serde(default = "default_live_path")]
    pub live: PathBuf,
}

impl Default for DatabasePaths {
    fn default() -> Self {
        Self {
            primary: default_primary_path(),
            ods: default_ods_path(),
            live: default_live_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_dry_run() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_primary_path() -> PathBuf {
    default_data_folder().join("primary.db")
}

fn default_ods_path() -> PathBuf {
    default_data_folder().join("ods.db")
}

fn default_live_path() -> PathBuf {
    default_data_folder().join("live.db")
}

/// OS-dependent default folder holding the database files
pub fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("mathops"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\mathops"))
    } else {
        // ~/.local/share/mathops (Linux), ~/Library/Application Support/mathops (macOS)
        dirs::data_local_dir()
            .map(|d| d.join("mathops"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/mathops"))
    }
}

/// Locate the configuration file following the priority order above
///
/// Returns `None` when no file was named and none exists in the standard
/// locations.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("mathops").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/mathops/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Parse configuration text
pub fn parse_config(text: &str) -> Result<TomlConfig> {
    toml::from_str(text).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
}

/// Load configuration, falling back to compiled defaults
///
/// # Errors
///
/// Returns `Error::Config` if an explicitly named file is missing or if any
/// file found cannot be parsed.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let explicit = cli_arg.is_some() || std::env::var(CONFIG_ENV_VAR).is_ok();

    let Some(path) = resolve_config_path(cli_arg) else {
        warn!("No configuration file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        if explicit {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        warn!("Config file {} not found, using compiled defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let text = std::fs::read_to_string(&path)?;
    let config = parse_config(&text)?;
    info!("Loaded configuration from {}", path.display());

    Ok(config)
}
