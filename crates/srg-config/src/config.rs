//! Configuration structs and loading.

use crate::resolve::{resolve_config, ConfigSource};
use crate::validate::{validate_config, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default location of the pids cgroup hierarchy.
pub const DEFAULT_PIDS_CGROUP_DIR: &str = "/sys/fs/cgroup/pids";

/// Default directory holding per-snap lock files.
pub const DEFAULT_LOCK_DIR: &str = "/run/snapd/lock";

/// Default directory holding run-inhibition hint files.
pub const DEFAULT_INHIBIT_DIR: &str = "/run/snapd/inhibit";

/// Default interval between inhibition hint polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default interval between helper liveness checks while waiting for a tick.
pub const DEFAULT_HELPER_CHECK_INTERVAL_MS: u64 = 50;

/// Default graphical progress helper.
pub const DEFAULT_HELPER_PROGRAM: &str = "zenity";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

/// Filesystem locations of the external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the per-security-tag pids cgroups.
    pub pids_cgroup_dir: PathBuf,
    /// Directory of per-snap lock files.
    pub lock_dir: PathBuf,
    /// Directory of run-inhibition hint files.
    pub inhibit_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pids_cgroup_dir: PathBuf::from(DEFAULT_PIDS_CGROUP_DIR),
            lock_dir: PathBuf::from(DEFAULT_LOCK_DIR),
            inhibit_dir: PathBuf::from(DEFAULT_INHIBIT_DIR),
        }
    }
}

/// Wait coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub poll_interval_ms: u64,
    pub helper_check_interval_ms: u64,
    /// Program used for the graphical progress indicator.
    pub helper_program: String,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            helper_check_interval_ms: DEFAULT_HELPER_CHECK_INTERVAL_MS,
            helper_program: DEFAULT_HELPER_PROGRAM.to_string(),
        }
    }
}

impl WaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn helper_check_interval(&self) -> Duration {
        Duration::from_millis(self.helper_check_interval_ms)
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub wait: WaitConfig,
}

impl Config {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        validate_config(&config)?;
        Ok(config)
    }
}

/// Configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    /// Path to the config file (None if using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Load configuration with the standard resolution order.
///
/// An explicit CLI path that does not exist is an error; every other
/// location is optional and falls through to the built-in defaults.
pub fn load_config(cli_path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }

    let (path, source) = resolve_config(cli_path);
    let config = match &path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    Ok(ResolvedConfig {
        config,
        path,
        source,
    })
}
