use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod settings;

use commands::{backup, deploy, status};

/// Staged deployment and database backup for a single host.
#[derive(Parser)]
#[command(name = "hostctl", version, about, long_about = None)]
struct Cli {
    /// Load the config from a specific file.
    ///
    /// [default: $HOSTCTL_CONFIG, then hostctl.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Promote every staged artifact and restart its service
    Deploy(deploy::DeployArgs),
    /// Snapshot the database and upload it to object storage
    Backup,
    /// Show staged artifacts, service states, proxy mode and anomalies
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = settings::load_config(cli.config)?;

    match cli.command {
        Commands::Deploy(args) => deploy::exec(&config, args).await,
        Commands::Backup => backup::exec(&config).await,
        Commands::Status => status::exec(&config).await,
    }
}
