//! Dockyard - grouped docker compose launcher
//!
//! Dockyard brings up a set of docker compose stacks under one shared
//! project name so the engine treats them as a single application:
//!
//! - Teardown of stuck containers and the whole project
//! - Sparse checkout of a third-party repository holding a dependency stack
//! - Environment file propagation
//! - Detached dependency stack, attached primary stack
//!
//! Every step shells out to `git` or `docker` through [`runtime`].

pub mod compose;
pub mod config;
pub mod error;
pub mod git;
pub mod lifecycle;
pub mod runtime;
pub mod storage;

pub use error::{DockyardError, Result};
