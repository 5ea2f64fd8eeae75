//! Scripted runner for exercising callers without spawning processes

use super::process::{CommandOutput, Invocation};
use super::runner::CommandRunner;
use crate::error::{DockyardError, Result};
use std::cell::RefCell;

struct Rule {
    prefix: String,
    output: CommandOutput,
}

/// Records every invocation and answers from a list of scripted results
///
/// Rules match on the start of [`Invocation::command_line`]; the first
/// matching rule wins and anything unmatched succeeds silently.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail commands starting with `prefix` with the given code and stderr
    pub fn fail(mut self, prefix: &str, code: i32, stderr: &str) -> Self {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            output: CommandOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        });
        self
    }

    /// Every invocation seen so far, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Command lines seen so far, in order
    pub fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(Invocation::command_line).collect()
    }

    fn respond(&self, invocation: &Invocation) -> CommandOutput {
        self.calls.borrow_mut().push(invocation.clone());
        let line = invocation.command_line();
        self.rules
            .iter()
            .find(|rule| line.starts_with(&rule.prefix))
            .map(|rule| rule.output.clone())
            .unwrap_or_else(CommandOutput::success)
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        let output = self.respond(invocation);
        if output.is_success() {
            Ok(())
        } else {
            Err(DockyardError::CommandFailed {
                command: invocation.command_line(),
                code: output.code,
            })
        }
    }

    fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        Ok(self.respond(invocation))
    }
}
