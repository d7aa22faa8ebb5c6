//! bindkit configuration (`bindkit.toml`).
//!
//! Defines the typed configuration for `bindkit.toml` in the working
//! directory: history depth and default output format. Missing fields use
//! sensible defaults. Missing file → all defaults (no error).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::format::OutputFormat;

/// Config file name, looked up in the working directory.
const CONFIG_FILE: &str = "bindkit.toml";

/// Default bound on the undo stack.
const DEFAULT_MAX_HISTORY: usize = 100;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level bindkit configuration.
///
/// ```toml
/// [history]
/// max_history = 250
///
/// [output]
/// format = "json"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct BindkitConfig {
    /// Undo/redo history settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl BindkitConfig {
    /// Load config from `bindkit.toml` in `dir`.
    ///
    /// A missing file yields all defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }
}

// ---------------------------------------------------------------------------
// HistoryConfig
// ---------------------------------------------------------------------------

/// Undo/redo history settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Maximum number of undoable commands kept in memory (default: 100).
    ///
    /// The oldest command is evicted when the bound is exceeded; its
    /// provenance entry survives eviction.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

const fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Output settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Default output format when `--format` is not given.
    #[serde(default)]
    pub format: OutputFormat,
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// A configuration file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// Path to the config file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file could not be parsed as TOML.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        /// Path to the config file.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
