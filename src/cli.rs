//! CLI definitions for ironclock.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ironclock CLI.
#[derive(Parser)]
#[command(name = "ironclock")]
#[command(about = "Job scheduler and task runner")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults to ~/.ironclock/config.toml)
    #[arg(short, long, env = "IRONCLOCK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the scheduler in the foreground until Ctrl-C (default)
    Run,

    /// Validate the configuration and print the configured jobs
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_subcommand() {
        let cli = Cli::try_parse_from(["ironclock"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_check_with_config() {
        let cli = Cli::try_parse_from(["ironclock", "check", "--config", "/tmp/ironclock.toml"])
            .unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ironclock.toml")));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["ironclock", "daemon"]).is_err());
    }
}
