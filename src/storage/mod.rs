//! Files managed on behalf of compose stacks
//!
//! Dockyard only ever touches one file itself: the environment file the
//! dependency stack reads its settings from.

pub mod envfile;

pub use envfile::EnvFileConfig;
