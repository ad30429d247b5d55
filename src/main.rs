//! twitch-session - Twitch sign-in from the terminal
//!
#![doc = "Main entry point for the twitch-session application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use twitch_session::cli::{Cli, Commands};
use twitch_session::commands;
use twitch_session::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Session => {
            tracing::info!("Starting interactive session");
            commands::session::run_session(config).await?;
            Ok(())
        }
        Commands::Whoami { json } => {
            tracing::info!("Starting one-shot identity check");
            commands::whoami::run_whoami(config, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "twitch_session=debug"
    } else {
        "twitch_session=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
