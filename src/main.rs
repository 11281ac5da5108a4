use clap::Parser;
use peerping::cli::{commands, Cli};
use peerping::config::DiscoveryConfig;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting peerping v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => DiscoveryConfig::from_file(path),
        None => Ok(DiscoveryConfig::default()),
    }
    .map(|c| c.with_overrides(cli.label_selector.clone(), cli.namespace.clone()))
    .and_then(|c| c.validate().map(|_| c));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Some(command) => commands::handle_command(config, command).await,
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
