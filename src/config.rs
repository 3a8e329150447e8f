use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors, separate from the data-access taxonomy since they
/// occur before any store or client exists.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(PathBuf),
  #[error("failed to read config file {path}: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    source: serde_yaml::Error,
  },
  #[error("could not determine data directory")]
  NoDataDir,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Base URL of the remote catalog API.
  pub base_url: String,
  /// Items per catalog page. The remote serves fixed-size slices.
  pub page_size: u32,
  /// Ceiling on the full request (connect + response), in seconds.
  pub request_timeout_secs: u64,
  /// Ceiling on connection establishment, in seconds.
  pub connect_timeout_secs: u64,
  /// Override for the cache database location (default: data dir).
  pub cache_path: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      base_url: "https://catalog.example.com/api".to_string(),
      page_size: 20,
      request_timeout_secs: 15,
      connect_timeout_secs: 5,
      cache_path: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./specidex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/specidex/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(ConfigError::NotFound(p.to_path_buf()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      // No file is fine for an embedded library consumer
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Current directory first, then the XDG config directory
    std::iter::once(PathBuf::from("specidex.yaml"))
      .chain(dirs::config_dir().map(|dir| dir.join("specidex").join("config.yaml")))
      .find(|p| p.exists())
  }

  fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
      path: path.to_path_buf(),
      source: e,
    })?;

    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: e,
    })
  }

  /// Resolve the cache database path, creating nothing.
  ///
  /// Uses the configured override when present, otherwise the platform data
  /// directory.
  pub fn cache_path(&self) -> Result<PathBuf, ConfigError> {
    if let Some(p) = &self.cache_path {
      return Ok(p.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(ConfigError::NoDataDir)?;

    Ok(data_dir.join("specidex").join("cache.db"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.page_size, 20);
    assert_eq!(config.request_timeout_secs, 15);
  }

  #[test]
  fn test_parse_partial_yaml_fills_defaults() {
    let config: Config =
      serde_yaml::from_str("base_url: https://catalog.test/api\npage_size: 50\n").unwrap();
    assert_eq!(config.base_url, "https://catalog.test/api");
    assert_eq!(config.page_size, 50);
    assert_eq!(config.connect_timeout_secs, 5);
  }

  #[test]
  fn test_explicit_missing_path_is_error() {
    let result = Config::load(Some(Path::new("/nonexistent/specidex.yaml")));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
  }
}
