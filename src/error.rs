//! Error types for twitch-session
//!
//! This module defines all error types used throughout the crate, using
//! `thiserror` for ergonomic error handling.
//!
//! Fallible functions return [`Result`], an `anyhow` alias.  When a failure
//! wraps a lower-level cause (a network error under a profile fetch, for
//! example) the [`AuthError`] is attached as context, so callers classify the
//! failure with `err.downcast_ref::<AuthError>()` and still see the full
//! cause chain.

use thiserror::Error;

/// Main error type for twitch-session operations
///
/// Declined logins are not represented here: a user who cancels or denies
/// access produces [`SignInOutcome::Declined`](crate::auth::flow::SignInOutcome)
/// rather than an error.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The `state` echoed back by the provider differs from the one sent
    #[error("State mismatch in authorization redirect")]
    StateMismatch,

    /// The provider reported success but the redirect carried no token
    #[error("Authorization redirect did not contain an access token")]
    MissingAccessToken,

    /// The provider redirected with an error code other than `access_denied`
    #[error("Provider returned error '{code}'{}", suffix(.description))]
    Provider {
        /// The `error` parameter from the redirect
        code: String,
        /// The `error_description` parameter, when present
        description: Option<String>,
    },

    /// The interactive redirect round trip failed
    #[error("Authorization redirect failed")]
    Redirect,

    /// The authenticated profile request failed
    #[error("Failed to fetch user profile")]
    ProfileFetch,

    /// The profile endpoint returned an empty `data` list
    #[error("Profile response contained no users")]
    EmptyProfile,

    /// Non-success HTTP status from the API
    #[error("API request returned {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// Token revocation was rejected or unreachable
    #[error("Token revocation failed: {0}")]
    Revocation(String),

    /// The local browser or loopback listener failed
    #[error("Browser error: {0}")]
    Browser(String),

    /// A sign-in is already running
    #[error("A sign-in is already in progress")]
    SignInInProgress,

    /// A sign-out is running, so a sign-in cannot start
    #[error("A sign-out is in progress")]
    SignOutInProgress,

    /// A sign-out ran while this sign-in was in flight; its result was dropped
    #[error("Sign-in was interrupted by a sign-out")]
    SignInInterrupted,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

fn suffix(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// Result type alias for twitch-session operations
///
/// Uses `anyhow::Error` so that context can be layered over an [`AuthError`]
/// without losing the underlying cause.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn test_config_error_display() {
        let error = AuthError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_state_mismatch_display() {
        assert_eq!(
            AuthError::StateMismatch.to_string(),
            "State mismatch in authorization redirect"
        );
    }

    #[test]
    fn test_provider_error_display_with_description() {
        let error = AuthError::Provider {
            code: "invalid_scope".to_string(),
            description: Some("bad scope".to_string()),
        };
        assert_eq!(
            error.to_string(),
            "Provider returned error 'invalid_scope': bad scope"
        );
    }

    #[test]
    fn test_provider_error_display_without_description() {
        let error = AuthError::Provider {
            code: "server_error".to_string(),
            description: None,
        };
        assert_eq!(error.to_string(), "Provider returned error 'server_error'");
    }

    #[test]
    fn test_api_error_display() {
        let error = AuthError::Api {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(error.to_string(), "API request returned 401: unauthorized");
    }

    #[test]
    fn test_context_is_downcastable() {
        let inner: Result<()> = Err(AuthError::EmptyProfile.into());
        let err = inner.context(AuthError::ProfileFetch).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AuthError>(),
            Some(AuthError::ProfileFetch)
        ));
        let chain: Vec<String> = err.chain().map(|e| e.to_string()).collect();
        assert_eq!(
            chain,
            vec![
                "Failed to fetch user profile".to_string(),
                "Profile response contained no users".to_string(),
            ]
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let error: AuthError = io_error.into();
        assert!(matches!(error, AuthError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: AuthError = json_error.into();
        assert!(matches!(error, AuthError::Serialization(_)));
    }

    #[test]
    fn test_url_error_conversion() {
        let url_error = url::Url::parse("not a url").unwrap_err();
        let error: AuthError = url_error.into();
        assert!(matches!(error, AuthError::Url(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AuthError>();
    }
}
