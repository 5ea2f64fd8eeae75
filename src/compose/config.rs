//! Compose stack descriptors

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a stack is brought up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackMode {
    /// Start containers and return
    Detached,
    /// Stay attached to the containers' output until they stop
    #[default]
    Attached,
}

impl StackMode {
    /// Whether `up` should pass `-d`
    pub fn is_detached(self) -> bool {
        matches!(self, StackMode::Detached)
    }
}

impl std::fmt::Display for StackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackMode::Detached => write!(f, "detached"),
            StackMode::Attached => write!(f, "attached"),
        }
    }
}

/// A named compose stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    /// Human-readable stack name, used in log output only
    pub name: String,
    /// Compose files, in `-f` order
    pub compose_files: Vec<PathBuf>,
    /// Bring-up mode
    #[serde(default)]
    pub mode: StackMode,
}

impl StackConfig {
    /// Create a stack from a single compose file
    pub fn new(name: &str, compose_file: impl Into<PathBuf>, mode: StackMode) -> Self {
        Self {
            name: name.to_string(),
            compose_files: vec![compose_file.into()],
            mode,
        }
    }

    /// The supporting stack started in the background before the primary one
    pub fn dependency() -> Self {
        Self::new(
            "supabase",
            PathBuf::from("supabase").join("docker").join("docker-compose.yml"),
            StackMode::Detached,
        )
    }

    /// The foreground stack whose lifetime is the run's lifetime
    pub fn primary() -> Self {
        Self::new("localai", "docker-compose.yml", StackMode::Attached)
    }
}
