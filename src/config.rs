//! Search configuration.
//!
//! A [`SearchConfig`] is loaded once per request (from `config.json` in the
//! app data directory, then overridden by CLI flags) and frozen into the
//! [`SearchRequest`](crate::search::SearchRequest). Nothing mutates it while a
//! search is running.

use crate::error::ConfigError;
use crate::utils::app_data::get_config_path;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Values consumed by the search core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Candidate encodings, tried in order (WHATWG labels, e.g. "utf-8", "windows-1252")
    #[serde(default = "default_encodings")]
    pub encodings: Vec<String>,

    /// Maximum number of characters shown per result line
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Directory names that are never descended into (case-insensitive)
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,

    /// File extensions that are never read (case-insensitive, no leading dot)
    #[serde(default)]
    pub excluded_extensions: Vec<String>,

    /// Files larger than this many bytes are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Search stops once this many hits are recorded (0 disables the ceiling)
    #[serde(default = "default_max_hit_count")]
    pub max_hit_count: usize,

    /// Case-sensitive matching in plain mode
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    /// Skip files whose decoded text contains a NUL character
    #[serde(default = "default_skip_binary")]
    pub skip_binary: bool,

    /// Follow symbolic links while walking
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Walk hidden files and directories
    #[serde(default = "default_include_hidden")]
    pub include_hidden: bool,

    /// Honour .gitignore / .ignore files
    #[serde(default)]
    pub respect_ignore_files: bool,
}

fn default_encodings() -> Vec<String> {
    vec!["utf-8".to_string()]
}

fn default_max_line_length() -> usize {
    100
}

fn default_excluded_dirs() -> Vec<String> {
    [".git", "node_modules", "target", "__pycache__", ".venv", "venv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_file_size() -> u64 {
    20 * 1_000_000 // 20 MB
}

fn default_max_hit_count() -> usize {
    5000
}

fn default_case_sensitive() -> bool {
    true
}

fn default_skip_binary() -> bool {
    true
}

fn default_include_hidden() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            encodings: default_encodings(),
            max_line_length: default_max_line_length(),
            excluded_dirs: default_excluded_dirs(),
            excluded_extensions: Vec::new(),
            max_file_size: default_max_file_size(),
            max_hit_count: default_max_hit_count(),
            case_sensitive: default_case_sensitive(),
            skip_binary: default_skip_binary(),
            follow_symlinks: false,
            include_hidden: default_include_hidden(),
            respect_ignore_files: false,
        }
    }
}

impl SearchConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> anyhow::Result<Self> {
        let config_path = match get_config_path() {
            Ok(path) => path,
            Err(err) => {
                warn!(error = %err, "no app data directory, using default config");
                return Ok(Self::default());
            }
        };
        Ok(Self::load_from(&config_path)?)
    }

    /// Load config from an explicit file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SearchConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, content).map_err(io_err)
    }

    /// Check value ranges and encoding labels
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_line_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_line_length",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.encodings.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "encodings",
                reason: "at least one encoding is required".to_string(),
            });
        }
        self.resolved_encodings().map(|_| ())
    }

    /// Resolve the configured labels to `encoding_rs` encodings, in order
    pub fn resolved_encodings(&self) -> Result<Vec<&'static Encoding>, ConfigError> {
        self.encodings
            .iter()
            .map(|label| {
                Encoding::for_label(label.trim().as_bytes())
                    .ok_or_else(|| ConfigError::UnknownEncoding(label.clone()))
            })
            .collect()
    }

    /// Whether a hit-count ceiling is in effect
    pub fn hit_limit(&self) -> Option<usize> {
        (self.max_hit_count > 0).then_some(self.max_hit_count)
    }
}
