use crate::store::CaseFolding;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_NAME: &str = "vidq";
const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "media.db";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Library database. `None` means `media.db` in the app data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Records shown by `search` when no `--limit` is given
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Case folding for substring matches
    #[serde(default)]
    pub case_folding: CaseFolding,

    /// Replaces the library root in exported playlists
    #[serde(default)]
    pub path_prefix: Option<String>,
}

fn default_limit() -> usize {
    50
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            default_limit: default_limit(),
            case_folding: CaseFolding::default(),
            path_prefix: None,
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load config from an explicit file, or return default if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            let config: AppConfig = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
            debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Database to open: the configured path, else `media.db` in the app data directory
    pub fn effective_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_app_data_dir()?.join(DATABASE_FILE)),
        }
    }

    /// Default page size, treating 0 as unlimited
    pub fn effective_limit(&self) -> Option<usize> {
        if self.default_limit == 0 {
            warn!("default_limit is 0, showing all records");
            None
        } else {
            Some(self.default_limit)
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create {}", app_dir.display()))?;
    Ok(app_dir)
}
