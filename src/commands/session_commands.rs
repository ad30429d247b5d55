//! Prompt command parser for the interactive session
//!
//! Commands are case-insensitive and may be written with or without a
//! leading `/` (`signin` and `/signin` are the same command).

use thiserror::Error;

/// Errors that can occur when parsing a prompt command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType 'help' to see available commands")]
    UnknownCommand(String),

    /// Command does not take arguments
    #[error("{command} takes no arguments (got '{arg}')")]
    UnexpectedArgument { command: String, arg: String },
}

/// Commands accepted at the session prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Run the interactive sign-in
    SignIn,
    /// End the current session
    SignOut,
    /// Re-fetch the profile through the authorized request path
    WhoAmI,
    /// Show the current session snapshot
    Status,
    /// Show available commands
    Help,
    /// Leave the prompt (signing out first when signed in)
    Quit,
}

/// Parses one line of prompt input.
///
/// # Errors
///
/// Returns [`CommandError::UnknownCommand`] for anything unrecognised and
/// [`CommandError::UnexpectedArgument`] when a command is followed by text.
///
/// # Examples
///
/// ```
/// use twitch_session::commands::session_commands::{parse_session_command, SessionCommand};
///
/// assert_eq!(parse_session_command("/signin").unwrap(), SessionCommand::SignIn);
/// assert_eq!(parse_session_command("EXIT").unwrap(), SessionCommand::Quit);
/// assert!(parse_session_command("dance").is_err());
/// ```
pub fn parse_session_command(input: &str) -> Result<SessionCommand, CommandError> {
    let mut parts = input.trim().splitn(2, char::is_whitespace);
    let word = parts.next().unwrap_or_default();
    let name = word.strip_prefix('/').unwrap_or(word).to_lowercase();

    let command = match name.as_str() {
        "signin" | "login" => SessionCommand::SignIn,
        "signout" | "logout" => SessionCommand::SignOut,
        "whoami" | "me" => SessionCommand::WhoAmI,
        "status" => SessionCommand::Status,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" | "q" => SessionCommand::Quit,
        _ => return Err(CommandError::UnknownCommand(word.to_string())),
    };

    match parts.next().map(str::trim) {
        Some(arg) if !arg.is_empty() => Err(CommandError::UnexpectedArgument {
            command: name,
            arg: arg.to_string(),
        }),
        _ => Ok(command),
    }
}

/// Prints the prompt command reference.
pub fn print_help() {
    use colored::Colorize;

    println!("{}", "Session commands:".bold());
    println!("  {}    sign in to Twitch through the browser", "signin".cyan());
    println!("  {}   revoke the token and end the session", "signout".cyan());
    println!("  {}    fetch your profile with the session credential", "whoami".cyan());
    println!("  {}    show the current session state", "status".cyan());
    println!("  {}      show this help", "help".cyan());
    println!("  {}      leave (signs out first)", "quit".cyan());
    println!();
}
