//! CLI module - Command-line interface for Stockkeeper
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Stockkeeper - inventory and account backend
#[derive(Parser)]
#[command(name = "stockkeeper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    #[command(alias = "daemon", short_flag = 'd')]
    Serve,

    /// Create default config file with a fresh secret key
    Init,

    /// Inspect and manage user accounts
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Inspect the item catalog
    Items {
        #[command(subcommand)]
        command: ItemCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List all users
    #[command(alias = "ls")]
    List,
    /// Show details about a user
    Show {
        /// User ID
        id: i32,
    },
    /// Delete a user and any pending verification
    #[command(alias = "rm")]
    Delete {
        /// User ID
        id: i32,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// List all items
    #[command(alias = "ls")]
    List,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_aliases() {
        for args in [
            ["stockkeeper", "serve"],
            ["stockkeeper", "daemon"],
            ["stockkeeper", "-d"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(matches!(cli.command, Some(Commands::Serve)));
        }
    }

    #[test]
    fn test_users_delete_args() {
        let cli = Cli::try_parse_from(["stockkeeper", "users", "rm", "7", "-y"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Users {
                command: UserCommands::Delete { id: 7, yes: true }
            })
        ));
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["stockkeeper"]).unwrap();
        assert!(cli.command.is_none());
    }
}
