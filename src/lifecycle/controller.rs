//! Stack lifecycle controller

use super::stage::Stage;
use crate::compose::cli::{ComposeCli, RemovalReport};
use crate::compose::StackConfig;
use crate::config::LaunchConfig;
use crate::error::{DockyardError, Result};
use crate::git::{Checkout, GitClient};
use crate::runtime::{CommandRunner, Invocation};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A stage as it would run right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStage {
    /// Which stage
    pub stage: Stage,
    /// External commands the stage issues, in order
    pub commands: Vec<Invocation>,
    /// What the stage does that is not an external command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Runs the launch sequence for one compose project
///
/// Steps run strictly one after another. The first fatal error stops the
/// sequence; nothing already done is rolled back. An interrupt received
/// while a stage runs lets that stage's child finish, then stops the
/// sequence before the next stage.
pub struct StackController<R: CommandRunner> {
    config: LaunchConfig,
    runner: R,
    root: PathBuf,
    sleeper: Box<dyn Fn(Duration)>,
    interrupted: Arc<AtomicBool>,
}

impl<R: CommandRunner> StackController<R> {
    /// Create a controller; relative paths in `config` resolve against `root`
    pub fn new(config: LaunchConfig, runner: R, root: &Path) -> Self {
        Self {
            config,
            runner,
            root: root.to_path_buf(),
            sleeper: Box::new(std::thread::sleep),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share the flag set by the interrupt handler
    pub fn with_interrupt_flag(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = interrupted;
        self
    }

    /// Replace how the initialization delay waits
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn git(&self) -> GitClient<'_, R> {
        GitClient::new(&self.runner, &self.config.tools.git, &self.root)
    }

    fn compose(&self) -> ComposeCli<'_, R> {
        ComposeCli::new(&self.runner, &self.config.tools.docker, &self.root)
    }

    /// Sparse-clone the external repository, or pull it if already present
    pub fn ensure_external_repository(&self) -> Result<Checkout> {
        self.git().ensure(&self.config.repository)
    }

    /// Copy the environment file into the dependency stack's directory
    pub fn propagate_environment_config(&self) -> Result<u64> {
        self.config.env_file.propagate(&self.root)
    }

    /// Remove stuck containers, then bring every given compose file down at once
    pub fn teardown(&self, project: &str, compose_files: &[PathBuf]) -> Result<RemovalReport> {
        tracing::info!(
            "Stopping and removing existing containers for the unified project '{}'...",
            project
        );

        let compose = self.compose();
        let report = compose.remove_containers(&self.config.teardown.containers)?;

        let files = self.teardown_files(compose_files);
        if files.is_empty() {
            tracing::info!("No compose files present, skipping compose down");
            return Ok(report);
        }

        compose.down(project, &files, self.config.teardown.remove_orphans)?;
        Ok(report)
    }

    /// Bring one stack up under the shared project
    ///
    /// Returns once the containers start when the stack is detached; an
    /// attached stack holds the call until it stops.
    pub fn bring_up(&self, project: &str, stack: &StackConfig) -> Result<()> {
        tracing::info!("Starting {} services ({})...", stack.name, stack.mode);
        self.compose().up(project, stack)
    }

    /// Run one stage regardless of whether it is enabled
    pub fn run_stage(&self, stage: Stage) -> Result<()> {
        let config = &self.config;
        match stage {
            Stage::Teardown => {
                self.teardown(&config.project, &config.teardown.compose_files)?;
            }
            Stage::ExternalRepository => {
                self.ensure_external_repository()?;
            }
            Stage::EnvironmentConfig => {
                self.propagate_environment_config()?;
            }
            Stage::DependencyStack => {
                self.bring_up(&config.project, &config.dependency_stack)?;
            }
            Stage::InitializationDelay => {
                let delay = config.initialization_delay();
                tracing::info!(
                    "Waiting {}s for {} to initialize...",
                    delay.as_secs(),
                    config.dependency_stack.name
                );
                (self.sleeper)(delay);
            }
            Stage::PrimaryStack => {
                self.bring_up(&config.project, &config.primary_stack)?;
            }
        }
        Ok(())
    }

    /// Run every enabled stage in order
    pub fn run_sequence(&self) -> Result<()> {
        let stages = self.config.stages.stages();
        tracing::debug!(
            "Launch sequence: {}",
            stages
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        for stage in stages {
            if self.interrupted.load(Ordering::SeqCst) {
                tracing::warn!("Interrupted, not starting {}", stage);
                return Err(DockyardError::Interrupted);
            }
            self.run_stage(stage)?;
        }
        Ok(())
    }

    /// Tear the project down without starting anything
    pub fn shut_down(&self) -> Result<RemovalReport> {
        self.teardown(&self.config.project, &self.config.teardown.compose_files)
    }

    /// Describe what [`run_sequence`](Self::run_sequence) would do
    pub fn plan(&self) -> Vec<PlannedStage> {
        self.config
            .stages
            .stages()
            .into_iter()
            .map(|stage| self.plan_stage(stage))
            .collect()
    }

    fn plan_stage(&self, stage: Stage) -> PlannedStage {
        let config = &self.config;
        let compose = self.compose();
        let (commands, note) = match stage {
            Stage::Teardown => {
                let mut commands = Vec::new();
                if !config.teardown.containers.is_empty() {
                    commands.push(compose.remove_invocation(&config.teardown.containers));
                }
                let files = self.teardown_files(&config.teardown.compose_files);
                if !files.is_empty() {
                    commands.push(compose.down_invocation(
                        &config.project,
                        &files,
                        config.teardown.remove_orphans,
                    ));
                }
                (commands, None)
            }
            Stage::ExternalRepository => {
                let git = self.git();
                if self.root.join(&config.repository.path).exists() {
                    (vec![git.pull_invocation(&config.repository)], None)
                } else {
                    (git.clone_invocations(&config.repository), None)
                }
            }
            Stage::EnvironmentConfig => (
                Vec::new(),
                Some(format!(
                    "copy {} to {}",
                    config.env_file.source.display(),
                    config.env_file.destination.display()
                )),
            ),
            Stage::DependencyStack => (
                vec![compose.up_invocation(&config.project, &config.dependency_stack)],
                None,
            ),
            Stage::InitializationDelay => (
                Vec::new(),
                Some(format!("wait {}s", config.initialization_delay_secs)),
            ),
            Stage::PrimaryStack => (
                vec![compose.up_invocation(&config.project, &config.primary_stack)],
                None,
            ),
        };

        PlannedStage {
            stage,
            commands,
            note,
        }
    }

    fn teardown_files(&self, compose_files: &[PathBuf]) -> Vec<PathBuf> {
        if !self.config.teardown.skip_missing_files {
            return compose_files.to_vec();
        }

        compose_files
            .iter()
            .filter(|file| {
                let present = self.root.join(file).is_file();
                if !present {
                    tracing::warn!("Compose file {} not found, leaving it out", file.display());
                }
                present
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::StageToggles;
    use crate::runtime::testing::ScriptedRunner;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::{tempdir, TempDir};

    const RM: &str = "docker rm -f mongodb open-webui";
    const DOWN: &str = "docker compose -p localai -f docker-compose.yml \
                        -f supabase/docker/docker-compose.yml down --remove-orphans";
    const DOWN_PRIMARY: &str =
        "docker compose -p localai -f docker-compose.yml down --remove-orphans";
    const UP_PRIMARY: &str = "docker compose -p localai -f docker-compose.yml up";
    const UP_DEPENDENCY: &str =
        "docker compose -p localai -f supabase/docker/docker-compose.yml up -d";

    /// Working directory holding the primary compose file and, optionally,
    /// a checked-out dependency stack with its environment file
    fn workspace(with_dependency: bool) -> TempDir {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        std::fs::write(temp.path().join(".env"), "JWT_SECRET=abc\n").unwrap();
        if with_dependency {
            let docker = temp.path().join("supabase/docker");
            std::fs::create_dir_all(&docker).unwrap();
            std::fs::write(docker.join("docker-compose.yml"), "services: {}\n").unwrap();
        }
        temp
    }

    fn all_stages() -> LaunchConfig {
        LaunchConfig {
            stages: StageToggles::all(),
            ..Default::default()
        }
    }

    fn recording_sleeper() -> (Rc<RefCell<Vec<Duration>>>, impl Fn(Duration) + 'static) {
        let slept = Rc::new(RefCell::new(Vec::new()));
        let sink = slept.clone();
        (slept, move |d| sink.borrow_mut().push(d))
    }

    #[test]
    fn test_fresh_machine_default_sequence() {
        let temp = workspace(false);
        // docker compose rejects -f paths that do not exist
        let runner = ScriptedRunner::new()
            .fail(
                "docker rm",
                1,
                "Error response from daemon: No such container: mongodb\n\
                 Error response from daemon: No such container: open-webui\n",
            )
            .fail(
                DOWN,
                14,
                "open supabase/docker/docker-compose.yml: no such file or directory",
            );
        let (slept, sleeper) = recording_sleeper();
        let controller = StackController::new(LaunchConfig::default(), runner, temp.path())
            .with_sleeper(sleeper);

        controller.run_sequence().unwrap();

        assert_eq!(
            controller.runner().lines(),
            vec![RM, DOWN_PRIMARY, UP_PRIMARY]
        );
        assert!(slept.borrow().is_empty());
    }

    #[test]
    fn test_strict_teardown_fails_on_missing_file() {
        let temp = workspace(false);
        let runner = ScriptedRunner::new().fail(DOWN, 14, "no such file or directory");
        let mut config = LaunchConfig::default();
        config.teardown.skip_missing_files = false;
        let controller = StackController::new(config, runner, temp.path());

        let err = controller.run_sequence().unwrap_err();

        assert_eq!(err.exit_code(), Some(14));
        assert_eq!(controller.runner().lines(), vec![RM, DOWN]);
    }

    #[test]
    fn test_full_sequence_with_dependency_stack() {
        let temp = workspace(true);

        let (slept, sleeper) = recording_sleeper();
        let controller = StackController::new(all_stages(), ScriptedRunner::new(), temp.path())
            .with_sleeper(sleeper);

        controller.run_sequence().unwrap();

        assert_eq!(
            controller.runner().lines(),
            vec![RM, DOWN, "git pull", UP_DEPENDENCY, UP_PRIMARY]
        );
        assert_eq!(*slept.borrow(), vec![Duration::from_secs(10)]);
        let copied = std::fs::read_to_string(temp.path().join("supabase/docker/.env")).unwrap();
        assert_eq!(copied, "JWT_SECRET=abc\n");
    }

    #[test]
    fn test_teardown_once_before_any_bring_up() {
        let temp = workspace(true);

        for config in [LaunchConfig::default(), all_stages()] {
            let controller = StackController::new(config, ScriptedRunner::new(), temp.path())
                .with_sleeper(|_| {});
            controller.run_sequence().unwrap();

            let lines = controller.runner().lines();
            let downs: Vec<usize> = positions(&lines, " down");
            let ups: Vec<usize> = positions(&lines, " up");
            assert_eq!(downs.len(), 1);
            assert!(ups.iter().all(|&up| up > downs[0]));
        }
    }

    fn positions(lines: &[String], needle: &str) -> Vec<usize> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.contains(needle))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_failed_down_aborts_before_bring_up() {
        let temp = workspace(true);
        let runner = ScriptedRunner::new().fail(DOWN, 1, "");
        let controller = StackController::new(LaunchConfig::default(), runner, temp.path());

        let err = controller.run_sequence().unwrap_err();

        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(controller.runner().lines(), vec![RM, DOWN]);
    }

    #[test]
    fn test_missing_env_file_aborts_before_dependency_stack() {
        let temp = workspace(true);
        std::fs::remove_file(temp.path().join(".env")).unwrap();
        let controller = StackController::new(all_stages(), ScriptedRunner::new(), temp.path())
            .with_sleeper(|_| {});

        let err = controller.run_sequence().unwrap_err();

        assert!(matches!(err, DockyardError::EnvFileMissing(_)));
        assert_eq!(controller.runner().lines(), vec![RM, DOWN, "git pull"]);
    }

    #[test]
    fn test_attached_failure_is_reported() {
        let temp = workspace(false);
        let runner = ScriptedRunner::new().fail(UP_PRIMARY, 130, "");
        let controller = StackController::new(LaunchConfig::default(), runner, temp.path());

        let err = controller.run_sequence().unwrap_err();
        assert_eq!(err.exit_code(), Some(130));
    }

    #[test]
    fn test_interrupt_stops_before_next_stage() {
        let temp = workspace(true);
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = interrupted.clone();
        let controller = StackController::new(all_stages(), ScriptedRunner::new(), temp.path())
            .with_interrupt_flag(interrupted)
            .with_sleeper(move |_| flag.store(true, Ordering::SeqCst));

        let err = controller.run_sequence().unwrap_err();

        assert!(matches!(err, DockyardError::Interrupted));
        assert_eq!(err.exit_code(), Some(130));
        assert_eq!(
            controller.runner().lines(),
            vec![RM, DOWN, "git pull", UP_DEPENDENCY]
        );
    }

    #[test]
    fn test_shut_down_only_tears_down() {
        let temp = workspace(true);
        let controller =
            StackController::new(LaunchConfig::default(), ScriptedRunner::new(), temp.path());

        controller.shut_down().unwrap();

        assert_eq!(controller.runner().lines(), vec![RM, DOWN]);
    }

    #[test]
    fn test_skip_down_when_no_compose_files_exist() {
        let temp = tempdir().unwrap();
        let controller =
            StackController::new(LaunchConfig::default(), ScriptedRunner::new(), temp.path());

        controller.shut_down().unwrap();

        assert_eq!(controller.runner().lines(), vec![RM]);
    }

    #[test]
    fn test_plan_for_fresh_clone() {
        let temp = workspace(false);
        let controller = StackController::new(all_stages(), ScriptedRunner::new(), temp.path());

        let plan = controller.plan();

        let stages: Vec<Stage> = plan.iter().map(|p| p.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert_eq!(plan[0].commands[1].command_line(), DOWN_PRIMARY);
        assert_eq!(plan[1].commands.len(), 4);
        assert!(plan[2].note.as_deref().unwrap().contains(".env"));
        assert_eq!(plan[4].note.as_deref(), Some("wait 10s"));
        assert!(controller.runner().calls().is_empty());
    }

    #[test]
    fn test_plan_serializes_to_json() {
        let temp = workspace(false);
        let controller =
            StackController::new(LaunchConfig::default(), ScriptedRunner::new(), temp.path());

        let json = serde_json::to_value(controller.plan()).unwrap();

        assert_eq!(json[0]["stage"], "teardown");
        assert_eq!(json[0]["commands"][0]["program"], "docker");
        assert_eq!(json[1]["stage"], "primary-stack");
        assert!(json[1].get("note").is_none());
    }
}
