//! Launch configuration
//!
//! Everything the launch sequence needs to know (project identity, container
//! names, compose files, the external repository and which optional stages
//! run) lives in [`LaunchConfig`]. Every field has a default, so an empty or
//! missing configuration file starts the primary stack under the `localai`
//! project.

pub mod loader;

use crate::compose::StackConfig;
use crate::error::{DockyardError, Result};
use crate::git::RepositoryConfig;
use crate::lifecycle::StageToggles;
use crate::storage::EnvFileConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

static PROJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").unwrap());

static CONTAINER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").unwrap());

pub use loader::{ConfigSource, CONFIG_FILE_NAME};

/// Full launch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchConfig {
    /// Compose project name shared by every compose call
    pub project: String,
    /// External programs
    pub tools: ToolsConfig,
    /// Teardown settings
    pub teardown: TeardownConfig,
    /// Repository holding the dependency stack
    pub repository: RepositoryConfig,
    /// Environment file handed to the dependency stack
    pub env_file: EnvFileConfig,
    /// Stack started in the background first
    pub dependency_stack: StackConfig,
    /// Stack started in the foreground last
    pub primary_stack: StackConfig,
    /// Seconds to wait after starting the dependency stack
    pub initialization_delay_secs: u64,
    /// Optional stages
    pub stages: StageToggles,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            project: "localai".to_string(),
            tools: ToolsConfig::default(),
            teardown: TeardownConfig::default(),
            repository: RepositoryConfig::default(),
            env_file: EnvFileConfig::default(),
            dependency_stack: StackConfig::dependency(),
            primary_stack: StackConfig::primary(),
            initialization_delay_secs: 10,
            stages: StageToggles::default(),
        }
    }
}

/// Program names for the external tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub git: String,
    pub docker: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            docker: "docker".to_string(),
        }
    }
}

/// What teardown removes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeardownConfig {
    /// Containers force-removed before the compose teardown
    pub containers: Vec<String>,
    /// Compose files passed together to a single `down`
    pub compose_files: Vec<PathBuf>,
    /// Pass `--remove-orphans` to `down`
    pub remove_orphans: bool,
    /// Leave out compose files that do not exist yet, such as the dependency
    /// stack's file before its repository is cloned. When off, every file
    /// is passed and compose fails on any that is missing.
    pub skip_missing_files: bool,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        // Both stacks' files, so containers declared in either go down together
        let mut compose_files = StackConfig::primary().compose_files;
        compose_files.extend(StackConfig::dependency().compose_files);

        Self {
            containers: vec!["mongodb".to_string(), "open-webui".to_string()],
            compose_files,
            remove_orphans: true,
            skip_missing_files: true,
        }
    }
}

impl LaunchConfig {
    /// Wait applied after the dependency stack starts
    pub fn initialization_delay(&self) -> Duration {
        Duration::from_secs(self.initialization_delay_secs)
    }

    /// Check the configuration for values the external tools would reject
    pub fn validate(&self) -> Result<()> {
        if !PROJECT_NAME.is_match(&self.project) {
            return Err(DockyardError::InvalidConfig(format!(
                "project name '{}' must be lowercase alphanumerics, '-' or '_', \
                 starting with a letter or digit",
                self.project
            )));
        }

        if self.tools.git.trim().is_empty() || self.tools.docker.trim().is_empty() {
            return Err(DockyardError::InvalidConfig(
                "tool program names must not be empty".to_string(),
            ));
        }

        if let Some(bad) = self
            .teardown
            .containers
            .iter()
            .find(|name| !CONTAINER_NAME.is_match(name))
        {
            return Err(DockyardError::InvalidConfig(format!(
                "invalid container name '{}'",
                bad
            )));
        }

        if self.teardown.compose_files.is_empty() {
            return Err(DockyardError::InvalidConfig(
                "teardown needs at least one compose file".to_string(),
            ));
        }

        if self.primary_stack.compose_files.is_empty() {
            return Err(DockyardError::InvalidConfig(format!(
                "stack '{}' has no compose files",
                self.primary_stack.name
            )));
        }

        if self.stages.dependency_stack && self.dependency_stack.compose_files.is_empty() {
            return Err(DockyardError::InvalidConfig(format!(
                "stack '{}' has no compose files",
                self.dependency_stack.name
            )));
        }

        if self.stages.external_repository {
            let repo = &self.repository;
            if repo.url.trim().is_empty() || repo.branch.trim().is_empty() {
                return Err(DockyardError::InvalidConfig(
                    "repository url and branch must be set".to_string(),
                ));
            }
            if repo.sparse_paths.is_empty() {
                return Err(DockyardError::InvalidConfig(
                    "repository needs at least one sparse checkout path".to_string(),
                ));
            }
        }

        if self.stages.initialization_delay && !self.stages.dependency_stack {
            return Err(DockyardError::InvalidConfig(
                "initialization delay requires the dependency stack stage".to_string(),
            ));
        }

        Ok(())
    }
}
