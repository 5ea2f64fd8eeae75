//! Process execution
//!
//! Every external tool (git, docker) is driven through this module: an
//! [`Invocation`] describes the command line and a [`CommandRunner`] runs it
//! synchronously, one child at a time.

pub mod process;
pub mod runner;
pub mod signal;

#[cfg(test)]
pub(crate) mod testing;

pub use process::{CommandOutput, Invocation};
pub use runner::{ChildGuard, CommandRunner, DryRunRunner, SystemRunner};
