//! Docker Compose stacks
//!
//! Stacks are described here and driven through the `docker compose` CLI.
//! Compose files themselves are never parsed; they belong to the engine.

pub mod cli;
pub mod config;

pub use cli::{ComposeCli, RemovalReport};
pub use config::{StackConfig, StackMode};
