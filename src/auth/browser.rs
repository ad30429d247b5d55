//! Browser capability for the interactive part of the flow
//!
//! [`AuthBrowser`] covers everything that happens outside the process:
//! presenting the authorization page, capturing the redirect, and asking
//! the provider to revoke a token.  [`LoopbackBrowser`] implements it with
//! the system browser and a local redirect listener; tests substitute an
//! in-process fake.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::auth::callback;
use crate::auth::request::AuthorizationResult;
use crate::config::RedirectConfig;
use crate::error::{AuthError, Result};

/// Interactive authorization and revocation against the provider.
#[async_trait]
pub trait AuthBrowser: Send + Sync {
    /// Redirect URI that resolves back into this host.  Asked once per
    /// sign-in attempt.
    fn redirect_uri(&self) -> String;

    /// Presents `url` to the user and waits for the provider's redirect.
    ///
    /// Resolves with [`Outcome::Cancelled`](crate::auth::request::Outcome)
    /// when the user abandons the flow.
    ///
    /// # Errors
    ///
    /// Returns an error only when the redirect cannot be captured at all
    /// (for example the callback port is already in use).
    async fn present_authorization(&self, url: &Url) -> Result<AuthorizationResult>;

    /// Asks the provider to revoke `token`.  Best effort.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Revocation`] when the provider rejects the
    /// request or cannot be reached.
    async fn revoke(&self, token: Option<&str>, client_id: &str, revocation_endpoint: &str)
        -> Result<()>;
}

/// [`AuthBrowser`] using the system browser and a loopback redirect listener.
///
/// # Examples
///
/// ```
/// use twitch_session::auth::browser::{AuthBrowser, LoopbackBrowser};
/// use twitch_session::config::RedirectConfig;
///
/// let browser = LoopbackBrowser::new(RedirectConfig::default());
/// assert_eq!(browser.redirect_uri(), "http://localhost:3000/callback");
/// ```
#[derive(Debug, Clone)]
pub struct LoopbackBrowser {
    config: RedirectConfig,
    http: reqwest::Client,
}

impl LoopbackBrowser {
    /// Creates a browser for the given redirect settings.
    pub fn new(config: RedirectConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Attempts to open the authorization URL in the user's default browser.
    ///
    /// Errors are ignored; the URL is always printed so the user can copy it.
    fn try_open_browser(&self, url: &str) {
        #[cfg(target_os = "macos")]
        {
            let _ = std::process::Command::new("open").arg(url).spawn();
        }
        #[cfg(target_os = "linux")]
        {
            let _ = std::process::Command::new("xdg-open").arg(url).spawn();
        }
        #[cfg(target_os = "windows")]
        {
            let _ = std::process::Command::new("cmd")
                .args(["/C", "start", "", url])
                .spawn();
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            let _ = url;
        }
    }

    async fn wait_with_limits(
        &self,
        wait: impl std::future::Future<Output = Result<AuthorizationResult>>,
    ) -> Result<AuthorizationResult> {
        let limit = self.config.timeout().unwrap_or(Duration::MAX);

        tokio::select! {
            result = wait => result,
            _ = tokio::time::sleep(limit) => {
                tracing::warn!(?limit, "Timed out waiting for the authorization redirect");
                Ok(AuthorizationResult::cancelled())
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Authorization interrupted");
                Ok(AuthorizationResult::cancelled())
            }
        }
    }
}

#[async_trait]
impl AuthBrowser for LoopbackBrowser {
    fn redirect_uri(&self) -> String {
        self.config.redirect_uri()
    }

    async fn present_authorization(&self, url: &Url) -> Result<AuthorizationResult> {
        let bind = format!("{}:{}", self.config.bind_address, self.config.port);
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .map_err(|e| AuthError::Browser(format!("failed to bind redirect listener on {bind}: {e}")))?;
        tracing::debug!(%bind, "Redirect listener bound");

        eprintln!(
            "Open the following URL in your browser to sign in to Twitch:\n{}",
            url
        );
        if self.config.open_browser {
            self.try_open_browser(url.as_str());
        }

        self.wait_with_limits(callback::await_redirect(listener, &self.config.path))
            .await
    }

    async fn revoke(
        &self,
        token: Option<&str>,
        client_id: &str,
        revocation_endpoint: &str,
    ) -> Result<()> {
        let params = [("client_id", client_id), ("token", token.unwrap_or_default())];

        let response = self
            .http
            .post(revocation_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Revocation(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Revocation(format!("endpoint returned {status}: {body}")).into());
        }

        Ok(())
    }
}
