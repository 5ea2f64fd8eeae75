//! Error types for Dockyard

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Dockyard operations
pub type Result<T> = std::result::Result<T, DockyardError>;

/// Dockyard error types
#[derive(Error, Debug)]
pub enum DockyardError {
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` failed with {}", describe_exit(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Interrupted before the launch sequence finished")]
    Interrupted,

    #[error("Failed to install interrupt handler: {0}")]
    SignalHandler(#[from] ctrlc::Error),

    #[error("Environment file not found: {0}")]
    EnvFileMissing(PathBuf),

    #[error("Failed to copy {from} to {to}: {source}")]
    EnvFileCopy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Repository path exists but is not a directory: {0}")]
    RepositoryPath(PathBuf),

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Configuration parse error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DockyardError {
    /// Exit code of the child process behind this error, if there was one
    ///
    /// An interrupt between stages reports the shell convention for SIGINT.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            DockyardError::CommandFailed { code, .. } => *code,
            DockyardError::Interrupted => Some(130),
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
