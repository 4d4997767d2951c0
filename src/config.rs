use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub forum: ForumConfig,
  /// Username this session is signed in as; liked status is partitioned by it
  pub username: String,
  /// Posts per rendered page (defaults to 10)
  pub page_size: Option<usize>,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
  /// Base URL of the forum API, e.g. https://forum.nosh.app/api/
  pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Minutes before a cached post goes stale (defaults to 5)
  pub ttl_minutes: Option<i64>,
  /// Keep liked status in memory only instead of the on-disk store
  #[serde(default)]
  pub ephemeral: bool,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./nosh.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/nosh/config.yaml
  /// 4. ~/.config/nosh/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/nosh/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("nosh.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("nosh").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the forum API token from the environment.
  pub fn get_api_token() -> Result<String> {
    std::env::var("NOSH_API_TOKEN")
      .map_err(|_| eyre!("Forum API token not found. Set the NOSH_API_TOKEN environment variable."))
  }
}
