//! Launch sequencing
//!
//! The controller runs a fixed, ordered list of stages: teardown, the
//! optional dependency phase (repository, environment file, dependency
//! stack, initialization delay), then the primary stack in the foreground.

pub mod controller;
pub mod stage;

pub use controller::{PlannedStage, StackController};
pub use stage::{Stage, StageToggles};
