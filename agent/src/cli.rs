//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, OutputFlags, renderer_for};
use crate::application::ports::ConfigStore;
use crate::commands;
use crate::infra::{YamlConfigStore, logging};
use crate::output::OutputContext;
use crate::output::json::format_error;

/// Installs, enables, and garbage-collects job bundles on this node
#[derive(Parser)]
#[command(
    name = "job-agent",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Agent configuration file
    #[arg(long, global = true, env = "JOB_AGENT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile installed jobs against a desired-state manifest
    Apply(commands::apply::ApplyArgs),

    /// List installed job bundles
    List,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// In JSON mode a failure is printed as a JSON error object on stdout
    /// and reported through the exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails in human output mode.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            config,
            command,
        } = self;
        let flags = OutputFlags {
            no_color,
            quiet,
            json,
        };

        match dispatch(&flags, config, command).await {
            Err(e) if json => {
                println!("{}", format_error(&format!("{e:#}"))?);
                Ok(ExitCode::FAILURE)
            }
            other => other,
        }
    }
}

async fn dispatch(
    flags: &OutputFlags,
    config: Option<PathBuf>,
    command: Command,
) -> Result<ExitCode> {
    match command {
        Command::Version => {
            let output = OutputContext::new(flags.no_color, flags.quiet);
            commands::version::run(&renderer_for(flags.mode(), &output))
        }
        Command::Apply(args) => {
            let app = load_app(flags, config)?;
            commands::apply::run(&app, &args).await
        }
        Command::List => {
            let app = load_app(flags, config)?;
            commands::list::run(&app)
        }
    }
}

/// Load configuration, start logging, and wire the production collaborators.
fn load_app(flags: &OutputFlags, config: Option<PathBuf>) -> Result<AppContext> {
    let store = YamlConfigStore::new(config);
    let config = store.load()?;
    logging::init(&config.log_level);
    tracing::debug!(path = %store.path().display(), "loaded configuration");
    Ok(AppContext::new(flags, config))
}
