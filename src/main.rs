//! ironclock - job scheduler and task runner
//!
//! Main entry point for the ironclock CLI.

mod cli;
mod runners;
mod server;
mod trigger;

use clap::Parser;

use ironclock_config::ConfigLoader;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(|| server::ironclock_dir().join("config.toml"));
    let config = ConfigLoader::load_or_default(&config_path)?;

    match cli.command {
        Some(Commands::Check) => server::check(&config),
        None | Some(Commands::Run) => {
            server::init_tracing(&config.logging)?;
            tracing::info!("Configuration: {}", config_path.display());
            server::run(config).await
        }
    }
}
