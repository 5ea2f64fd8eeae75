//! External process descriptions
//!
//! An [`Invocation`] is a fully resolved command line: the program, its
//! arguments and the directory it runs in. Nothing here spawns anything;
//! see [`super::runner`] for execution.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single external command to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Program to execute, looked up on `PATH`
    pub program: String,
    /// Arguments, not including the program
    pub args: Vec<String>,
    /// Working directory (inherits the current one when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Create a new invocation of the given program
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run inside the given directory
    pub fn cwd(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Command line without the working directory
    pub fn command_line(&self) -> String {
        let mut line = quote(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&quote(arg));
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())?;
        if let Some(ref cwd) = self.cwd {
            write!(f, " (in {})", cwd.display())?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// A successful, silent result
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    /// Whether the process exited with status zero
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}
