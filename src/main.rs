//! Main entry point for the `bgg` CLI

use bgg_client::cli::{Cli, CliError, Commands};
use bgg_client::BggClient;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bgg_client=info"));

    // stdout carries the command output
    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let bgg = BggClient::new(cli.client_config())?;
    let format = cli.format;

    match &cli.command {
        Commands::User(args) => args.execute(&bgg, format).await,
        Commands::Guild(args) => args.execute(&bgg, format).await,
        Commands::Game(args) => args.execute(&bgg, format).await,
        Commands::Family(args) => args.execute(&bgg, format).await,
        Commands::Plays(args) => args.execute(&bgg, format).await,
        Commands::Collection(args) => args.execute(&bgg, format).await,
        Commands::Search(args) => args.execute(&bgg, format).await,
        Commands::Hot(args) => args.execute(&bgg, format).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        if e.is_usage_error() {
            error!("Invalid arguments: {}", e);
        } else {
            error!("Command failed: {}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}
