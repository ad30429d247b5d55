//! twitch-session - Twitch sign-in for terminal applications
//!
//! This library runs the OAuth 2.0 implicit grant against Twitch for a single
//! interactive user session and keeps the resulting identity in an
//! observable, in-memory session store.
//!
//! # Architecture
//!
//! - `auth`: authorization state machine, browser capability, redirect listener
//! - `session`: observable session state shared with dependents
//! - `http`: profile API capability and the Helix client
//! - `profile`: Twitch user record
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli` / `commands`: command-line host
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use twitch_session::auth::browser::LoopbackBrowser;
//! use twitch_session::auth::flow::{AuthFlowController, SignInOutcome};
//! use twitch_session::http::HelixClient;
//! use twitch_session::session::SessionStore;
//! use twitch_session::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let controller = AuthFlowController::new(
//!         config.twitch.clone(),
//!         Arc::new(LoopbackBrowser::new(config.redirect.clone())),
//!         Arc::new(HelixClient::for_config(&config.twitch)),
//!         Arc::new(SessionStore::new()),
//!     );
//!
//!     if let SignInOutcome::SignedIn(user) = controller.sign_in().await? {
//!         println!("Hello, {}", user.display_name);
//!     }
//!     controller.sign_out().await;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod profile;
pub mod session;

// Re-export commonly used types
pub use auth::flow::{AuthFlowController, SignInOutcome};
pub use config::Config;
pub use error::{AuthError, Result};
pub use profile::User;
pub use session::{Session, SessionStore};
