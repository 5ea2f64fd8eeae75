//! Dockyard - grouped docker compose launcher
//!
//! This is the main CLI entry point for Dockyard.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use dockyard::config::LaunchConfig;
use dockyard::lifecycle::{PlannedStage, StackController};
use dockyard::runtime::{signal, CommandRunner, DryRunRunner, SystemRunner};
use dockyard::DockyardError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Dockyard - grouped docker compose launcher
#[derive(Parser)]
#[command(name = "dockyard")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Tear down and bring up docker compose stacks under one project", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file (defaults to ./dockyard.yaml, then the user config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory that relative paths resolve against
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    working_dir: Option<PathBuf>,

    /// Compose project name shared by all stacks
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Enable the dependency stack and everything it needs
    #[arg(long, global = true)]
    with_dependencies: bool,

    /// Seconds to wait after starting the dependency stack
    #[arg(long, global = true, value_name = "SECS")]
    init_delay: Option<u64>,

    /// Log commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tear down, then bring the stacks up (default)
    Up,

    /// Tear down the project without starting anything
    Down,

    /// Show the stages and commands a run would execute
    Plan {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(exit_status(&err))
        }
    }
}

/// Pass a failed child's exit code through, otherwise exit with 1
fn exit_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<DockyardError>()
        .and_then(DockyardError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .filter(|&code| code != 0)
        .unwrap_or(1)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let working_dir = match cli.working_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to determine working directory")?,
    };

    let (mut config, source) = LaunchConfig::load(cli.config.as_deref(), &working_dir)
        .context("failed to load configuration")?;
    tracing::debug!("Configuration: {}", source);

    if let Some(project) = cli.project {
        config.project = project;
    }
    if cli.with_dependencies {
        config.stages = dockyard::lifecycle::StageToggles::all();
    }
    if let Some(secs) = cli.init_delay {
        config.initialization_delay_secs = secs;
    }
    config.validate()?;

    let runner: Box<dyn CommandRunner> = if cli.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(SystemRunner::new())
    };
    let interrupted = signal::install()?;
    let controller =
        StackController::new(config, runner, &working_dir).with_interrupt_flag(interrupted);

    match cli.command.unwrap_or(Commands::Up) {
        Commands::Up => {
            controller.run_sequence()?;
        }

        Commands::Down => {
            let report = controller.shut_down()?;
            if !report.absent.is_empty() {
                println!("Already removed: {}", report.absent.join(", "));
            }
            println!("Project {} is down", controller.config().project);
        }

        Commands::Plan { format } => {
            let plan = controller.plan();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                OutputFormat::Text => print_plan(&plan),
            }
        }

        Commands::Config => {
            println!("# source: {}", source);
            print!("{}", controller.config().to_yaml()?);
        }
    }

    Ok(())
}

fn print_plan(plan: &[PlannedStage]) {
    for (i, step) in plan.iter().enumerate() {
        println!("{}. {}", i + 1, step.stage);
        for command in &step.commands {
            println!("     {}", command);
        }
        if let Some(ref note) = step.note {
            println!("     ({})", note);
        }
    }
}
