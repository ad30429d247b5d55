//! Command-line interface definition for twitch-session
//!
//! This module defines the CLI structure using clap's derive API,
//! providing an interactive session command and a one-shot identity check.

use clap::{Parser, Subcommand};

/// twitch-session - sign in to Twitch from the terminal
///
/// Runs the OAuth implicit grant through the system browser and a local
/// loopback redirect.  Tokens live only for the life of the process.
#[derive(Parser, Debug, Clone)]
#[command(name = "twitch-session")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the Twitch application client id
    #[arg(long)]
    pub client_id: Option<String>,

    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for twitch-session
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive session (sign in, inspect, sign out)
    Session,

    /// Sign in, print the authenticated profile, then sign out
    Whoami {
        /// Print the profile as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            client_id: None,
            no_browser: false,
            command: Commands::Session,
        }
    }
}
