//! Docker engine and compose commands

use super::config::StackConfig;
use crate::error::{DockyardError, Result};
use crate::runtime::{CommandRunner, Invocation};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static NO_SUCH_CONTAINER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)no such container:?\s*(\S*)").unwrap());

/// Result of a best-effort container removal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Containers the engine reported as not existing
    pub absent: Vec<String>,
}

/// Thin wrapper around the `docker` and `docker compose` CLIs
pub struct ComposeCli<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    docker: String,
    root: PathBuf,
}

impl<'a, R: CommandRunner + ?Sized> ComposeCli<'a, R> {
    /// Create a wrapper running `docker` from `root`
    pub fn new(runner: &'a R, docker: &str, root: &Path) -> Self {
        Self {
            runner,
            docker: docker.to_string(),
            root: root.to_path_buf(),
        }
    }

    /// `docker rm -f <names...>`
    pub fn remove_invocation(&self, names: &[String]) -> Invocation {
        Invocation::new(&self.docker)
            .args(["rm", "-f"])
            .args(names.iter().cloned())
            .cwd(&self.root)
    }

    /// `docker compose -p <project> -f <file>... down [--remove-orphans]`
    pub fn down_invocation(
        &self,
        project: &str,
        files: &[PathBuf],
        remove_orphans: bool,
    ) -> Invocation {
        let mut inv = self.compose(project, files).arg("down");
        if remove_orphans {
            inv = inv.arg("--remove-orphans");
        }
        inv
    }

    /// `docker compose -p <project> -f <file>... up [-d]`
    pub fn up_invocation(&self, project: &str, stack: &StackConfig) -> Invocation {
        let mut inv = self.compose(project, &stack.compose_files).arg("up");
        if stack.mode.is_detached() {
            inv = inv.arg("-d");
        }
        inv
    }

    fn compose(&self, project: &str, files: &[PathBuf]) -> Invocation {
        let mut inv = Invocation::new(&self.docker).args(["compose", "-p", project]);
        for file in files {
            inv = inv.arg("-f").arg(file.to_string_lossy());
        }
        inv.cwd(&self.root)
    }

    /// Force-remove containers by name, tolerating ones that do not exist
    ///
    /// All names go to the engine in one call. A failure whose every error
    /// line is a "no such container" report is tolerated; any other failure
    /// is returned as fatal.
    pub fn remove_containers(&self, names: &[String]) -> Result<RemovalReport> {
        if names.is_empty() {
            return Ok(RemovalReport::default());
        }

        let inv = self.remove_invocation(names);
        let output = self.runner.output(&inv)?;

        if output.is_success() {
            for removed in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
                tracing::debug!("Removed container {}", removed.trim());
            }
            return Ok(RemovalReport::default());
        }

        match absent_containers(&output.stderr) {
            Some(absent) => {
                tracing::debug!("Containers already absent: {}", absent.join(", "));
                Ok(RemovalReport { absent })
            }
            None => {
                for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
                    tracing::error!("{}", line);
                }
                Err(DockyardError::CommandFailed {
                    command: inv.command_line(),
                    code: output.code,
                })
            }
        }
    }

    /// Tear down the project across all given compose files in one call
    pub fn down(&self, project: &str, files: &[PathBuf], remove_orphans: bool) -> Result<()> {
        self.runner
            .run(&self.down_invocation(project, files, remove_orphans))
    }

    /// Bring a stack up; blocks for the stack's lifetime when attached
    pub fn up(&self, project: &str, stack: &StackConfig) -> Result<()> {
        self.runner.run(&self.up_invocation(project, stack))
    }
}

/// Names reported missing, or `None` if stderr holds any other kind of error
fn absent_containers(stderr: &str) -> Option<Vec<String>> {
    let mut absent = Vec::new();
    let mut saw_error = false;

    for line in stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
        saw_error = true;
        let caps = NO_SUCH_CONTAINER.captures(line)?;
        if let Some(name) = caps.get(1).filter(|m| !m.as_str().is_empty()) {
            absent.push(name.as_str().to_string());
        }
    }

    // A bare non-zero exit with nothing on stderr is not evidence of absence
    if saw_error {
        Some(absent)
    } else {
        None
    }
}
