use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stderr
  pub file: Option<String>,
  /// Log level, default is "info"
  #[serde(default = "default_log_level")]
  pub level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: default_log_level(),
    }
  }
}

/// What `add` does when a name is already registered under another type
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
  /// Fail with a type mismatch and leave the existing value alone
  #[default]
  Reject,
  /// Delete the existing value and create a fresh one of the new type
  Replace,
}

/// Registry configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RegistryConfig {
  #[serde(default)]
  pub mismatch_policy: MismatchPolicy,

  /// Capacity reserved up front for the name bookkeeping maps
  #[serde(default = "default_initial_capacity")]
  pub initial_capacity: usize,
}

fn default_initial_capacity() -> usize {
  64
}

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      mismatch_policy: MismatchPolicy::default(),
      initial_capacity: default_initial_capacity(),
    }
  }
}

/// Top level configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
  #[serde(default)]
  pub registry: RegistryConfig,

  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },

  #[error("failed to parse config file '{}': {source}", path.display())]
  Parse {
    path: PathBuf,
    source: serde_json::Error,
  },
}

impl Config {
  /// Load configuration from a JSON file
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    serde_json::from_str(&config_str).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }
}
