mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(
    name = "sprinkler",
    about = "Randomized fan-out transfer scheduler — spray paced value transfers from many accounts",
    version,
    propagate_version = true
)]
struct Cli {
    /// Scheduler configuration file
    #[arg(long, global = true, env = "SPRINKLER_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Sender private keys, one per line
    #[arg(long, global = true, env = "SPRINKLER_KEYS", default_value = "privatekey.txt")]
    keys: PathBuf,

    /// Recipient addresses, one per line
    #[arg(long, global = true, env = "SPRINKLER_RECIPIENTS", default_value = "toaddress.txt")]
    recipients: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load inputs and run the scheduler until externally terminated
    Run,

    /// Validate config and input files without touching the network
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run => tracing::Level::INFO,
        Commands::Check => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run => cmd::run::run(&cli.config, &cli.keys, &cli.recipients).await,
        Commands::Check => cmd::check::run(&cli.config, &cli.keys, &cli.recipients, cli.json),
    };

    if let Err(e) = result {
        error!(error = ?e, "command failed");
        std::process::exit(1);
    }
}
