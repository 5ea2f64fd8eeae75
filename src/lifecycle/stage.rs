//! The ordered stages of a launch

use serde::{Deserialize, Serialize};

/// One step of the launch sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Remove stuck containers and bring the whole project down
    Teardown,
    /// Clone or update the repository holding the dependency stack
    ExternalRepository,
    /// Copy the environment file into the dependency stack's directory
    EnvironmentConfig,
    /// Start the dependency stack in the background
    DependencyStack,
    /// Give the dependency stack time to initialize
    InitializationDelay,
    /// Start the primary stack in the foreground
    PrimaryStack,
}

impl Stage {
    /// Every stage, in execution order
    pub const ALL: [Stage; 6] = [
        Stage::Teardown,
        Stage::ExternalRepository,
        Stage::EnvironmentConfig,
        Stage::DependencyStack,
        Stage::InitializationDelay,
        Stage::PrimaryStack,
    ];

    /// Whether the stage can be switched off
    pub fn is_optional(self) -> bool {
        !matches!(self, Stage::Teardown | Stage::PrimaryStack)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Teardown => write!(f, "teardown"),
            Stage::ExternalRepository => write!(f, "external-repository"),
            Stage::EnvironmentConfig => write!(f, "environment-config"),
            Stage::DependencyStack => write!(f, "dependency-stack"),
            Stage::InitializationDelay => write!(f, "initialization-delay"),
            Stage::PrimaryStack => write!(f, "primary-stack"),
        }
    }
}

/// Enable flags for the optional stages
///
/// Teardown and the primary stack always run. Everything else defaults to
/// off, which starts only the primary stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    pub external_repository: bool,
    pub environment_config: bool,
    pub dependency_stack: bool,
    pub initialization_delay: bool,
}

impl StageToggles {
    /// Every optional stage switched on
    pub fn all() -> Self {
        Self {
            external_repository: true,
            environment_config: true,
            dependency_stack: true,
            initialization_delay: true,
        }
    }

    /// Whether `stage` runs under these toggles
    ///
    /// The initialization delay only runs after the dependency stack, so it
    /// is off whenever the dependency stack is.
    pub fn is_enabled(&self, stage: Stage) -> bool {
        if !stage.is_optional() {
            return true;
        }
        match stage {
            Stage::ExternalRepository => self.external_repository,
            Stage::EnvironmentConfig => self.environment_config,
            Stage::DependencyStack => self.dependency_stack,
            Stage::InitializationDelay => self.dependency_stack && self.initialization_delay,
            Stage::Teardown | Stage::PrimaryStack => true,
        }
    }

    /// Stages that will run, in order
    pub fn stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| self.is_enabled(*s))
            .collect()
    }
}
