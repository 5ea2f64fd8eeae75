//! Blocking command execution
//!
//! Every external step goes through a [`CommandRunner`]. The system runner
//! spawns one child at a time and always reaps it before returning.

use super::process::{CommandOutput, Invocation};
use crate::error::{DockyardError, Result};
use std::process::{Child, Command, ExitStatus, Output, Stdio};

/// Executes external commands
pub trait CommandRunner {
    /// Run with the terminal attached, failing on a non-zero exit
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Run with stdout and stderr captured
    ///
    /// A non-zero exit is reported through [`CommandOutput::code`] rather
    /// than as an error, so callers can classify the failure themselves.
    fn output(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

/// Runs commands on the host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner
    pub fn new() -> Self {
        Self
    }

    fn spawn(invocation: &Invocation, capture: bool) -> Result<ChildGuard> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(ref cwd) = invocation.cwd {
            command.current_dir(cwd);
        }
        if capture {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }

        let child = command.spawn().map_err(|source| DockyardError::Spawn {
            command: invocation.command_line(),
            source,
        })?;

        Ok(ChildGuard::new(child, invocation.command_line()))
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        tracing::info!("Running: {}", invocation);

        let status = Self::spawn(invocation, false)?.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(DockyardError::CommandFailed {
                command: invocation.command_line(),
                code: status.code(),
            })
        }
    }

    fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::info!("Running: {}", invocation);

        let output = Self::spawn(invocation, true)?.wait_with_output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Logs commands instead of running them
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        tracing::info!("[dry-run] {}", invocation);
        Ok(())
    }

    fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::info!("[dry-run] {}", invocation);
        Ok(CommandOutput::success())
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        (**self).run(invocation)
    }

    fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (**self).output(invocation)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        (**self).run(invocation)
    }

    fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (**self).output(invocation)
    }
}

/// Owns a spawned child until its exit status has been observed
///
/// Dropping the guard before that kills and reaps the child, so no path
/// out of the runner leaves a zombie or an orphaned process behind.
pub struct ChildGuard {
    child: Option<Child>,
    command: String,
}

impl ChildGuard {
    fn new(child: Child, command: String) -> Self {
        Self {
            child: Some(child),
            command,
        }
    }

    /// Block until the child exits
    pub fn wait(mut self) -> Result<ExitStatus> {
        match self.child.as_mut() {
            Some(child) => {
                let status = child.wait()?;
                self.child = None;
                Ok(status)
            }
            None => Err(self.reaped()),
        }
    }

    /// Block until the child exits, collecting its piped output
    pub fn wait_with_output(mut self) -> Result<Output> {
        match self.child.take() {
            Some(child) => Ok(child.wait_with_output()?),
            None => Err(self.reaped()),
        }
    }

    fn reaped(&self) -> DockyardError {
        DockyardError::Io(std::io::Error::other(format!(
            "child process for `{}` was already reaped",
            self.command
        )))
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::warn!("Terminating unfinished child process: {}", self.command);
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
