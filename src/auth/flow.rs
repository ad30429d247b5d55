//! Sign-in / sign-out state machine
//!
//! [`AuthFlowController`] drives the OAuth implicit grant against Twitch and
//! keeps the [`SessionStore`] consistent with the outcome.
//!
//! # Sign-in
//!
//! 1. Claim the sign-in slot (`is_signing_in = true`).
//! 2. Build a fresh [`AuthorizationRequest`] (new `state`, redirect URI from
//!    the browser, configured scopes).
//! 3. Present the authorization URL through the [`AuthBrowser`] and wait for
//!    the redirect.
//! 4. Classify the redirect: declined, failed, or a token with a matching
//!    `state`.
//! 5. Fetch `/users` with the token as bearer credential and take the first
//!    entry as the identity.
//! 6. Commit user and token into the store together.
//!
//! The slot is released on every exit path, including a dropped future.
//!
//! # Sign-out
//!
//! Revocation is best effort.  The local session always ends: the identity
//! is cleared (which also removes the bearer credential from request
//! decoration) whether or not the provider accepted the revocation.

use std::sync::Arc;

use anyhow::Context as _;

use crate::auth::browser::AuthBrowser;
use crate::auth::request::{AuthorizationRequest, Verdict};
use crate::config::TwitchConfig;
use crate::error::{AuthError, Result};
use crate::http::{inject_bearer, Headers, HttpClient};
use crate::profile::{User, UsersEnvelope};
use crate::session::SessionStore;

/// Helix path of the authenticated-user endpoint.
pub const USERS_PATH: &str = "/users";

/// How a sign-in that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// The user is signed in
    SignedIn(User),
    /// The user cancelled or denied access; the session is unchanged
    Declined,
}

/// Drives the authorization flow and owns every session mutation.
pub struct AuthFlowController {
    config: TwitchConfig,
    browser: Arc<dyn AuthBrowser>,
    http: Arc<dyn HttpClient>,
    store: Arc<SessionStore>,
}

impl AuthFlowController {
    /// Creates a controller.
    ///
    /// # Arguments
    ///
    /// * `config` - Provider endpoints, client id, and scopes.
    /// * `browser` - Interactive authorization and revocation.
    /// * `http` - Profile API client.  Expected to carry the `Client-Id`
    ///   default header already (see
    ///   [`HelixClient::for_config`](crate::http::HelixClient::for_config)).
    /// * `store` - The session this controller mutates.
    pub fn new(
        config: TwitchConfig,
        browser: Arc<dyn AuthBrowser>,
        http: Arc<dyn HttpClient>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            config,
            browser,
            http,
            store,
        }
    }

    /// The session this controller writes to.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Runs the interactive sign-in.
    ///
    /// # Returns
    ///
    /// [`SignInOutcome::SignedIn`] with the profile, or
    /// [`SignInOutcome::Declined`] when the user cancelled or denied access.
    ///
    /// # Errors
    ///
    /// Fails with an error that downcasts to [`AuthError`]:
    ///
    /// - [`AuthError::SignInInProgress`] / [`AuthError::SignOutInProgress`]
    ///   when the session is busy.
    /// - [`AuthError::Redirect`] when the browser could not capture the
    ///   redirect.
    /// - [`AuthError::StateMismatch`], [`AuthError::Provider`], or
    ///   [`AuthError::MissingAccessToken`] for a bad redirect.
    /// - [`AuthError::ProfileFetch`] when `/users` fails; the token is
    ///   discarded.
    /// - [`AuthError::SignInInterrupted`] when a sign-out ran meanwhile.
    ///
    /// The session stays unauthenticated on every error path.
    pub async fn sign_in(&self) -> Result<SignInOutcome> {
        let flight = self.store.begin_sign_in()?;
        tracing::info!("Sign-in started");

        let request = AuthorizationRequest::new(&self.config, self.browser.redirect_uri());
        let url = request.authorization_url(&self.config)?;
        tracing::debug!(redirect_uri = %request.redirect_uri(), scope = %request.scope(), "Authorization request built");

        let result = self
            .browser
            .present_authorization(&url)
            .await
            .context(AuthError::Redirect)?;

        let token = match request.classify(result)? {
            Verdict::Token(token) => token,
            Verdict::Declined => return Ok(SignInOutcome::Declined),
        };

        let user = self
            .fetch_profile(&token)
            .await
            .context(AuthError::ProfileFetch)?;

        self.store
            .establish(flight.generation(), user.clone(), token)?;
        tracing::info!(user_id = %user.id, display_name = %user.display_name, "Signed in");

        Ok(SignInOutcome::SignedIn(user))
    }

    /// Ends the session.
    ///
    /// Never fails.  A sign-out requested while another is running returns
    /// immediately.  A sign-out during an in-flight sign-in invalidates that
    /// sign-in.
    pub async fn sign_out(&self) {
        let Some(_flight) = self.store.begin_sign_out() else {
            tracing::debug!("Sign-out already in progress");
            return;
        };
        tracing::info!("Sign-out started");

        let token = self.store.access_token();
        if let Err(e) = self
            .browser
            .revoke(
                token.as_deref(),
                &self.config.client_id,
                &self.config.revocation_endpoint,
            )
            .await
        {
            tracing::warn!("Token revocation failed, signing out locally: {e:#}");
        }

        self.store.clear();
        tracing::info!("Signed out");
    }

    /// GET against the profile API with headers decorated from the current
    /// session.
    ///
    /// # Errors
    ///
    /// Propagates the [`HttpClient`] error.
    pub async fn authorized_get(&self, path: &str) -> Result<serde_json::Value> {
        let mut headers = Headers::new();
        self.store.decorate(&mut headers);
        self.http.get(path, &headers).await
    }

    async fn fetch_profile(&self, token: &str) -> Result<User> {
        let mut headers = Headers::new();
        inject_bearer(&mut headers, token);

        let body = self.http.get(USERS_PATH, &headers).await?;
        let envelope: UsersEnvelope = serde_json::from_value(body).map_err(AuthError::from)?;

        envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::EmptyProfile.into())
    }
}
