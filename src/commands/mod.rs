/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `session` -- Interactive session prompt
- `whoami`  -- One-shot sign in, print profile, sign out

Both handlers wire the library components together through
[`build_controller`] and only talk to the session through the controller.
*/

use std::sync::Arc;

use colored::Colorize;

use crate::auth::browser::LoopbackBrowser;
use crate::auth::flow::AuthFlowController;
use crate::config::Config;
use crate::error::{AuthError, Result};
use crate::http::HelixClient;
use crate::profile::User;
use crate::session::{Session, SessionStore};

// Prompt command parser
pub mod session_commands;

/// Builds a controller over a fresh, unauthenticated session.
///
/// The Helix client is created once here with the `Client-Id` header
/// installed; every later request reuses it.
pub fn build_controller(config: &Config) -> AuthFlowController {
    AuthFlowController::new(
        config.twitch.clone(),
        Arc::new(LoopbackBrowser::new(config.redirect.clone())),
        Arc::new(HelixClient::for_config(&config.twitch)),
        Arc::new(SessionStore::new()),
    )
}

/// One-line description of a session snapshot.
pub fn describe_session(session: &Session) -> String {
    let identity = match session.user() {
        Some(user) => format!("signed in as {} ({})", user.display_name, user.id),
        None => "signed out".to_string(),
    };

    match (session.is_signing_in(), session.is_signing_out()) {
        (true, _) => format!("{identity}, sign-in in progress"),
        (_, true) => format!("{identity}, sign-out in progress"),
        _ => identity,
    }
}

fn print_user(user: &User) {
    println!("{}", user.display_name.bold());
    println!("  id:     {}", user.id);
    println!("  email:  {}", user.email.as_deref().unwrap_or("(not shared)"));
    if !user.profile_image_url.is_empty() {
        println!("  avatar: {}", user.profile_image_url);
    }
}

fn print_error(err: &anyhow::Error) {
    let headline = match err.downcast_ref::<AuthError>() {
        Some(AuthError::SignInInProgress | AuthError::SignOutInProgress) => {
            "Session busy".yellow()
        }
        Some(AuthError::StateMismatch) => "Sign-in rejected".red(),
        Some(_) => "Sign-in failed".red(),
        None => "Error".red(),
    };
    eprintln!("{headline}: {err:#}");
}

// Interactive session handler
pub mod session {
    //! Interactive session prompt.
    //!
    //! Builds the controller, logs every session transition from a
    //! subscriber task, and runs a readline loop over the prompt commands.

    use super::*;
    use crate::auth::flow::{SignInOutcome, USERS_PATH};
    use crate::commands::session_commands::{parse_session_command, print_help, SessionCommand};
    use crate::profile::UsersEnvelope;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start the interactive session
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the line editor cannot be created.  Failures of
    /// individual commands are printed and the prompt continues.
    pub async fn run_session(config: Config) -> Result<()> {
        let controller = build_controller(&config);
        let watcher = spawn_transition_logger(controller.store());

        let mut rl = DefaultEditor::new()?;

        println!("{}", "Twitch session".bold());
        println!("Type 'help' for commands.\n");

        loop {
            match rl.readline("twitch> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    let command = match parse_session_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().yellow());
                            continue;
                        }
                    };

                    if command == SessionCommand::Quit {
                        break;
                    }
                    execute(&controller, command).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        if controller.store().snapshot().is_authenticated() {
            controller.sign_out().await;
            println!("Signed out.");
        }
        watcher.abort();

        println!("Goodbye!");
        Ok(())
    }

    async fn execute(controller: &AuthFlowController, command: SessionCommand) {
        match command {
            SessionCommand::SignIn => match controller.sign_in().await {
                Ok(SignInOutcome::SignedIn(user)) => {
                    println!("{}", "Signed in.".green());
                    print_user(&user);
                    println!();
                }
                Ok(SignInOutcome::Declined) => {
                    println!("{}\n", "Sign-in was not completed.".yellow());
                }
                Err(e) => print_error(&e),
            },
            SessionCommand::SignOut => {
                controller.sign_out().await;
                println!("{}\n", "Signed out.".green());
            }
            SessionCommand::WhoAmI => {
                if !controller.store().snapshot().is_authenticated() {
                    println!("{}\n", "Not signed in. Use 'signin' first.".yellow());
                    return;
                }
                match fetch_current_user(controller).await {
                    Ok(user) => {
                        print_user(&user);
                        println!();
                    }
                    Err(e) => print_error(&e),
                }
            }
            SessionCommand::Status => {
                let session = controller.store().snapshot();
                println!("Session: {}", describe_session(&session).cyan());
                if let Some(at) = session.signed_in_at() {
                    println!("Since:   {}", at.to_rfc3339());
                }
                println!();
            }
            SessionCommand::Help => print_help(),
            SessionCommand::Quit => {}
        }
    }

    async fn fetch_current_user(controller: &AuthFlowController) -> Result<User> {
        let body = controller.authorized_get(USERS_PATH).await?;
        let envelope: UsersEnvelope = serde_json::from_value(body).map_err(AuthError::from)?;
        envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::EmptyProfile.into())
    }

    fn spawn_transition_logger(store: &Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
        let mut rx = store.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let session = rx.borrow_and_update().clone();
                tracing::debug!("Session changed: {}", describe_session(&session));
            }
        })
    }
}

// One-shot identity command
pub mod whoami {
    //! Sign in, print the authenticated profile, sign out.

    use super::*;
    use crate::auth::flow::SignInOutcome;

    /// Run the one-shot identity check
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `json` - Print the profile as JSON instead of text
    ///
    /// # Errors
    ///
    /// Returns the sign-in error; the session is already unauthenticated in
    /// that case.
    pub async fn run_whoami(config: Config, json: bool) -> Result<()> {
        let controller = build_controller(&config);

        let user = match controller.sign_in().await? {
            SignInOutcome::SignedIn(user) => user,
            SignInOutcome::Declined => {
                eprintln!("{}", "Sign-in was not completed.".yellow());
                return Ok(());
            }
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&user).map_err(AuthError::from)?);
        } else {
            print_user(&user);
        }

        controller.sign_out().await;
        Ok(())
    }
}
