//! Configuration Management
//!
//! Handles persistent configuration storage for gcporg and resolves it into
//! runtime [`Settings`].

use crate::gcp::client::Endpoints;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Organization search page size when nothing else is configured
pub const DEFAULT_ORGANIZATION_PAGE_SIZE: u32 = 1000;

/// Asset search page size when nothing else is configured
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 500;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// API base URLs (defaults to the public Google endpoints)
    #[serde(default)]
    pub endpoints: Option<Endpoints>,
    /// Page size for organization discovery
    #[serde(default)]
    pub organization_page_size: Option<u32>,
    /// Page size for per-organization asset searches
    #[serde(default)]
    pub search_page_size: Option<u32>,
    /// How many organizations to list at once
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Default output format name
    #[serde(default)]
    pub output: Option<String>,
}

/// Resolved runtime settings for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoints: Endpoints,
    pub organization_page_size: u32,
    pub search_page_size: u32,
    pub concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            organization_page_size: DEFAULT_ORGANIZATION_PAGE_SIZE,
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
            concurrency: 1,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcporg").join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// is missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Could not read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective settings (config > defaults); CLI flags are applied on top by the caller
    pub fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            endpoints: self.endpoints.clone().unwrap_or(defaults.endpoints),
            organization_page_size: self
                .organization_page_size
                .unwrap_or(defaults.organization_page_size),
            search_page_size: self.search_page_size.unwrap_or(defaults.search_page_size),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json"));
        assert_eq!(config, Config::default());
        assert_eq!(config.settings(), Settings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            endpoints: Some(Endpoints::single("http://127.0.0.1:9999")),
            search_page_size: Some(100),
            concurrency: Some(4),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded, config);

        let settings = loaded.settings();
        assert_eq!(settings.search_page_size, 100);
        assert_eq!(settings.organization_page_size, DEFAULT_ORGANIZATION_PAGE_SIZE);
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.endpoints.cloudasset, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_zero_concurrency_is_raised_to_one() {
        let config = Config {
            concurrency: Some(0),
            ..Default::default()
        };
        assert_eq!(config.settings().concurrency, 1);
    }
}
