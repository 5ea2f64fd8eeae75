//! Configuration file discovery and parsing

use super::LaunchConfig;
use crate::error::{DockyardError, Result};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "dockyard.yaml";

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from this file
    File(PathBuf),
    /// No file found; built-in defaults
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

impl LaunchConfig {
    /// Load the configuration
    ///
    /// An explicit path must exist. Otherwise `dockyard.yaml` in the working
    /// directory is tried, then `dockyard/dockyard.yaml` in the user's config
    /// directory, and finally the built-in defaults are used.
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(DockyardError::ConfigNotFound(path.to_path_buf()));
            }
            return Ok((Self::from_file(path)?, ConfigSource::File(path.to_path_buf())));
        }

        for candidate in Self::search_paths(working_dir) {
            if candidate.is_file() {
                tracing::debug!("Using configuration file {}", candidate.display());
                let config = Self::from_file(&candidate)?;
                return Ok((config, ConfigSource::File(candidate)));
            }
        }

        Ok((Self::default(), ConfigSource::Defaults))
    }

    /// Candidate configuration files, most specific first
    pub fn search_paths(working_dir: &Path) -> Vec<PathBuf> {
        let mut paths = vec![working_dir.join(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("dockyard").join(CONFIG_FILE_NAME));
        }
        paths
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content).map_err(|e| DockyardError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse configuration YAML; an empty document yields the defaults
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let blank = content
            .lines()
            .map(str::trim)
            .all(|l| l.is_empty() || l.starts_with('#') || l == "---");
        if blank {
            return Ok(Self::default());
        }

        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_value(value)?)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
