//! Authorization request construction and redirect classification
//!
//! An [`AuthorizationRequest`] lives for exactly one sign-in attempt.  It
//! owns the attempt's `state` nonce, builds the implicit-grant authorization
//! URL, and decides what the [`AuthorizationResult`] handed back by the
//! browser means for the session (see [`AuthorizationRequest::classify`]).

use url::Url;

use crate::auth::state;
use crate::config::TwitchConfig;
use crate::error::{AuthError, Result};

/// Error code Twitch sends when the user clicks "Cancel" on the consent page.
pub const ACCESS_DENIED: &str = "access_denied";

/// How the interactive redirect ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The provider redirected back to us
    Success,
    /// The user abandoned the flow before a redirect arrived
    Cancelled,
    /// The browser side failed to capture a usable redirect
    Error,
}

/// Parameters captured from the provider's redirect.
///
/// Produced once by an [`AuthBrowser`](crate::auth::browser::AuthBrowser) and
/// consumed once by [`AuthorizationRequest::classify`].
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationResult {
    /// How the redirect ended
    pub outcome: Outcome,
    /// `access_token` redirect parameter
    pub access_token: Option<String>,
    /// `state` redirect parameter
    pub returned_state: Option<String>,
    /// `error` redirect parameter
    pub error_code: Option<String>,
    /// `error_description` redirect parameter
    pub error_description: Option<String>,
}

impl std::fmt::Debug for AuthorizationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationResult")
            .field("outcome", &self.outcome)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("returned_state", &self.returned_state)
            .field("error_code", &self.error_code)
            .field("error_description", &self.error_description)
            .finish()
    }
}

impl AuthorizationResult {
    /// A redirect that carried a token.
    pub fn success(access_token: impl Into<String>, returned_state: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Success,
            access_token: Some(access_token.into()),
            returned_state: Some(returned_state.into()),
            error_code: None,
            error_description: None,
        }
    }

    /// A redirect that carried a provider error code.
    pub fn provider_error(code: impl Into<String>, returned_state: Option<String>) -> Self {
        Self {
            outcome: Outcome::Success,
            access_token: None,
            returned_state,
            error_code: Some(code.into()),
            error_description: None,
        }
    }

    /// The user abandoned the flow.
    pub fn cancelled() -> Self {
        Self::bare(Outcome::Cancelled)
    }

    /// The browser could not capture a usable redirect.
    pub fn error(code: impl Into<String>) -> Self {
        Self {
            error_code: Some(code.into()),
            ..Self::bare(Outcome::Error)
        }
    }

    fn bare(outcome: Outcome) -> Self {
        Self {
            outcome,
            access_token: None,
            returned_state: None,
            error_code: None,
            error_description: None,
        }
    }
}

/// What a redirect means for the session.
#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The state matched and a token was issued
    Token(String),
    /// The user cancelled or denied access; not an error
    Declined,
}

/// One sign-in attempt's authorization request.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    state: String,
    redirect_uri: String,
    scope: String,
}

impl AuthorizationRequest {
    /// Starts a new attempt with a freshly generated `state`.
    pub fn new(config: &TwitchConfig, redirect_uri: impl Into<String>) -> Self {
        Self {
            state: state::generate(),
            redirect_uri: redirect_uri.into(),
            scope: config.scope(),
        }
    }

    /// The attempt's anti-forgery nonce.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Redirect URI sent to the provider.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Space-delimited scope string.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Builds the authorization URL.
    ///
    /// Query parameters, in order: `client_id`, `redirect_uri`,
    /// `response_type=token`, `scope`, `force_verify`, `state`.  Values are
    /// form-urlencoded, so the spaces in `scope` travel as `+`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Url`] if the configured authorization endpoint is
    /// not a valid URL.
    pub fn authorization_url(&self, config: &TwitchConfig) -> Result<Url> {
        let mut url = Url::parse(&config.authorization_endpoint).map_err(AuthError::from)?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &config.client_id);
            query.append_pair("redirect_uri", &self.redirect_uri);
            query.append_pair("response_type", "token");
            query.append_pair("scope", &self.scope);
            if config.force_verify {
                query.append_pair("force_verify", "true");
            }
            query.append_pair("state", &self.state);
        }

        Ok(url)
    }

    /// Decides what the browser's result means for this attempt.
    ///
    /// - Anything other than [`Outcome::Success`] is a declined login.
    /// - `error=access_denied` is a declined login.
    /// - Any other provider error code fails with [`AuthError::Provider`].
    /// - Otherwise the returned `state` must match exactly, or the attempt
    ///   fails with [`AuthError::StateMismatch`], and a token must be present.
    ///
    /// # Errors
    ///
    /// See above; the state check runs before the token is looked at.
    pub fn classify(&self, result: AuthorizationResult) -> Result<Verdict> {
        if result.outcome != Outcome::Success {
            tracing::info!(outcome = ?result.outcome, error = ?result.error_code, "Sign-in declined");
            return Ok(Verdict::Declined);
        }

        match result.error_code.as_deref() {
            Some(ACCESS_DENIED) => {
                tracing::info!("User denied access");
                return Ok(Verdict::Declined);
            }
            Some(code) if !code.is_empty() => {
                return Err(AuthError::Provider {
                    code: code.to_string(),
                    description: result.error_description,
                }
                .into());
            }
            _ => {}
        }

        state::verify(&self.state, result.returned_state.as_deref())?;

        match result.access_token {
            Some(token) if !token.is_empty() => Ok(Verdict::Token(token)),
            _ => Err(AuthError::MissingAccessToken.into()),
        }
    }
}
