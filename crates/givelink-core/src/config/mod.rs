//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::domain::search::suggest::DEFAULT_SUGGESTION_LIMIT;
use crate::domain::search::{DEFAULT_LIMIT, DEFAULT_WINDOW_DAYS, MAX_LIMIT};
use crate::storage::default_database_path;

/// GiveLink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file; `None` uses the platform data dir
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Page size used when a request carries none
    pub default_limit: i64,
    /// Suggestions returned when a request carries no limit
    pub suggestion_limit: i64,
    /// Trailing window for popular terms and analytics, in days
    pub popular_window_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseSettings { path: None },
            search: SearchSettings {
                default_limit: DEFAULT_LIMIT,
                suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
                popular_window_days: DEFAULT_WINDOW_DAYS,
            },
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("GIVELINK_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("givelink")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            // Return default config without creating file
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.search.default_limit < 1 || self.search.default_limit > MAX_LIMIT {
            return Err(anyhow!(
                "search.default_limit must be between 1 and {}",
                MAX_LIMIT
            ));
        }
        if self.search.suggestion_limit < 1 {
            return Err(anyhow!("search.suggestion_limit must be positive"));
        }
        if self.search.popular_window_days < 1 {
            return Err(anyhow!("search.popular_window_days must be positive"));
        }
        Ok(())
    }

    /// Resolve the database path, falling back to the platform default
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}
