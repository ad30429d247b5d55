//! Shared fixtures for integration tests
//!
//! [`FakeBrowser`] stands in for the system browser: instead of presenting
//! the authorization page it answers with a scripted redirect, and it
//! records every revocation request it receives.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;
use url::Url;

use twitch_session::auth::browser::AuthBrowser;
use twitch_session::auth::request::AuthorizationResult;
use twitch_session::config::TwitchConfig;
use twitch_session::error::{AuthError, Result};
use twitch_session::session::SessionStore;

pub const CLIENT_ID: &str = "test-client-id";
pub const REDIRECT_URI: &str = "http://localhost:3000/callback";
pub const TOKEN: &str = "test_access_token_xyz";

/// Scripted answer to one `present_authorization` call.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Redirect with the token and the request's own `state`
    Token(String),
    /// Redirect with the token and a `state` that does not match
    ForgedState(String),
    /// Redirect carrying `error=<code>` and the request's `state`
    ProviderError(String),
    /// The user closed the browser
    Cancelled,
    /// The browser side failed to capture the redirect
    BrowserError(String),
    /// `present_authorization` itself fails
    Fail(String),
}

/// Pauses `present_authorization` until the test releases it.
#[derive(Clone, Default)]
pub struct Hold {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct FakeBrowser {
    replies: Mutex<VecDeque<Reply>>,
    hold: Option<Hold>,
    revoke_hold: Option<Hold>,
    store: Option<Arc<SessionStore>>,
    fail_revoke: bool,
    pub presented: Mutex<Vec<Url>>,
    pub revocations: Mutex<Vec<Option<String>>>,
    pub signing_in_while_presented: Mutex<Vec<bool>>,
    pub signing_out_while_revoking: Mutex<Vec<bool>>,
}

impl FakeBrowser {
    pub fn replying(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_hold(mut self, hold: Hold) -> Self {
        self.hold = Some(hold);
        self
    }

    /// Pauses `revoke` until the test releases it.
    pub fn with_revoke_hold(mut self, hold: Hold) -> Self {
        self.revoke_hold = Some(hold);
        self
    }

    /// Records the store's `is_signing_in` flag each time the page is
    /// presented, and its `is_signing_out` flag each time a revocation is
    /// requested.
    pub fn observing(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn failing_revocation(mut self) -> Self {
        self.fail_revoke = true;
        self
    }

    pub fn revocations(&self) -> Vec<Option<String>> {
        self.revocations.lock().unwrap().clone()
    }

    pub fn presented(&self) -> Vec<Url> {
        self.presented.lock().unwrap().clone()
    }
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

#[async_trait]
impl AuthBrowser for FakeBrowser {
    fn redirect_uri(&self) -> String {
        REDIRECT_URI.to_string()
    }

    async fn present_authorization(&self, url: &Url) -> Result<AuthorizationResult> {
        self.presented.lock().unwrap().push(url.clone());
        if let Some(store) = &self.store {
            self.signing_in_while_presented
                .lock()
                .unwrap()
                .push(store.is_signing_in());
        }

        if let Some(hold) = &self.hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        let state = query_param(url, "state");
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Cancelled);

        match reply {
            Reply::Token(token) => Ok(AuthorizationResult::success(
                token,
                state.unwrap_or_default(),
            )),
            Reply::ForgedState(token) => Ok(AuthorizationResult::success(token, "forged-state")),
            Reply::ProviderError(code) => Ok(AuthorizationResult::provider_error(code, state)),
            Reply::Cancelled => Ok(AuthorizationResult::cancelled()),
            Reply::BrowserError(code) => Ok(AuthorizationResult::error(code)),
            Reply::Fail(msg) => Err(AuthError::Browser(msg).into()),
        }
    }

    async fn revoke(
        &self,
        token: Option<&str>,
        _client_id: &str,
        _revocation_endpoint: &str,
    ) -> Result<()> {
        self.revocations
            .lock()
            .unwrap()
            .push(token.map(str::to_string));
        if let Some(store) = &self.store {
            self.signing_out_while_revoking
                .lock()
                .unwrap()
                .push(store.is_signing_out());
        }

        if let Some(hold) = &self.revoke_hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        if self.fail_revoke {
            return Err(AuthError::Revocation("provider unavailable".to_string()).into());
        }
        Ok(())
    }
}

/// Provider configuration pointing the Helix API at `api_base`.
pub fn twitch_config(api_base: &str) -> TwitchConfig {
    TwitchConfig {
        client_id: CLIENT_ID.to_string(),
        api_base: api_base.to_string(),
        revocation_endpoint: format!("{api_base}/oauth2/revoke"),
        ..TwitchConfig::default()
    }
}

/// Standard `/users` response body for one user.
pub fn users_body() -> serde_json::Value {
    serde_json::json!({
        "data": [{
            "id": "141981764",
            "login": "twitchdev",
            "display_name": "TwitchDev",
            "type": "",
            "broadcaster_type": "partner",
            "description": "Supporting third-party developers building Twitch integrations",
            "profile_image_url": "https://static-cdn.jtvnw.net/user-default-pictures.png",
            "offline_image_url": "",
            "view_count": 5980557,
            "email": "not-real@email.com",
            "created_at": "2016-12-14T20:32:28Z"
        }]
    })
}

pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
