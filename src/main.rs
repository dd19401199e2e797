mod output;
mod prompt;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use ralphdock::config::{self, Overrides};
use ralphdock::docker::DockerCli;
use ralphdock::instructions;
use ralphdock::provision::{self, ExistingAction};
use ralphdock::verify;

#[derive(Parser)]
#[command(
    name = "ralphdock",
    about = "Provision a persistent Docker container for Claude Code and the Smart Ralph plugins",
    version,
    propagate_version = true
)]
struct Cli {
    /// Container name
    #[arg(long, global = true, env = "CONTAINER_NAME")]
    container: Option<String>,

    /// Base image for a new container
    #[arg(long, global = true, env = "IMAGE_NAME")]
    image: Option<String>,

    /// Named volume mounted at /workspace
    #[arg(long, global = true, env = "VOLUME_NAME")]
    volume: Option<String>,

    /// Directory holding .ralphdock.yaml (default: current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log every docker invocation
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or reuse the volume and container (default)
    Up {
        /// Remove an existing container with the same name and create a new one
        #[arg(long, conflicts_with = "reuse")]
        recreate: bool,

        /// Keep an existing container without asking
        #[arg(long)]
        reuse: bool,
    },

    /// Show the volume and container state
    Status,

    /// Check that the provisioned environment is healthy
    Verify,

    /// Stop and remove the container
    Down {
        /// Also remove the volume and everything stored in it
        #[arg(long)]
        remove_volume: bool,
    },

    /// Print the follow-up steps without touching Docker
    Instructions,
}

fn main() {
    let cli = Cli::parse();

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, cli.json, rust_log.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let dir = match cli.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let cfg = config::load(&dir)?.with_overrides(Overrides {
        container_name: cli.container,
        image: cli.image,
        volume_name: cli.volume,
    });
    let request = cfg.request()?;
    let docker = DockerCli::new();

    let command = cli.command.unwrap_or(Commands::Up {
        recreate: false,
        reuse: false,
    });

    match command {
        Commands::Up { recreate, reuse } => {
            let outcome = provision::provision(&request, &docker, |state| {
                if recreate {
                    ExistingAction::Recreate
                } else if reuse {
                    ExistingAction::Reuse
                } else {
                    prompt::ask_existing(state)
                }
            })?;
            if cli.json {
                output::print_json(&outcome)?;
            } else {
                output::print_lines(&output::outcome_lines(&outcome));
                let steps = instructions::follow_up(&request, &cfg.plugins, Some(&outcome.cli));
                output::print_lines(&output::instruction_lines(&steps));
            }
            Ok(0)
        }
        Commands::Status => {
            let status = provision::status(&request, &docker)?;
            if cli.json {
                output::print_json(&status)?;
            } else {
                output::print_lines(&output::status_lines(&status));
            }
            Ok(0)
        }
        Commands::Verify => {
            let report = verify::verify(&request, &docker);
            if cli.json {
                output::print_json(&report)?;
            } else {
                output::print_lines(&output::verify_lines(&report));
            }
            Ok(if report.success() { 0 } else { 1 })
        }
        Commands::Down { remove_volume } => {
            let outcome = provision::teardown(&request, &docker, remove_volume)?;
            if cli.json {
                output::print_json(&outcome)?;
            } else {
                output::print_lines(&output::teardown_lines(
                    &outcome,
                    request.container_name(),
                    request.volume_name(),
                ));
            }
            Ok(0)
        }
        Commands::Instructions => {
            let steps = instructions::follow_up(&request, &cfg.plugins, None);
            if cli.json {
                output::print_json(&steps)?;
            } else {
                output::print_lines(&output::instruction_lines(&steps));
            }
            Ok(0)
        }
    }
}

/// `RUST_LOG` when set, otherwise `info` (`warn` under `--json`).
/// `--verbose` raises the default level to `debug` on top of either.
fn log_filter(verbose: bool, json: bool, rust_log: Option<&str>) -> EnvFilter {
    let fallback = if json { "warn" } else { "info" };
    let filter = rust_log
        .filter(|spec| !spec.trim().is_empty())
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback));
    if verbose {
        filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        filter
    }
}
