//! HTTP capability used for Helix API calls
//!
//! [`HttpClient`] is the seam between the sign-in flow and the network.  Its
//! default header map is fixed once at process start (the `Client-Id`
//! header); everything session-specific, most importantly the bearer
//! credential, travels in the per-request header map built by
//! [`SessionStore::decorate`](crate::session::SessionStore::decorate) or
//! [`inject_bearer`].

use std::collections::HashMap;

use async_trait::async_trait;

use crate::config::TwitchConfig;
use crate::error::{AuthError, Result};

/// Header carrying the application's client id on every Helix request.
pub const CLIENT_ID_HEADER: &str = "Client-Id";

/// Header carrying the user's bearer credential.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Per-request header map.
pub type Headers = HashMap<String, String>;

/// Inserts an `Authorization: Bearer <token>` header into the given map.
///
/// Replaces any bearer header already present.
///
/// # Examples
///
/// ```
/// use twitch_session::http::{inject_bearer, Headers};
///
/// let mut headers = Headers::new();
/// inject_bearer(&mut headers, "tok123");
/// assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer tok123"));
/// ```
pub fn inject_bearer(headers: &mut Headers, token: &str) {
    headers.insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {}", token));
}

/// Minimal JSON GET capability against the profile API.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends `GET {base}{path}` with the client's default headers overlaid by
    /// `headers`, returning the parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Api`] for a non-success status and
    /// [`AuthError::Http`] for transport or decoding failures.
    async fn get(&self, path: &str, headers: &Headers) -> Result<serde_json::Value>;
}

/// [`HttpClient`] backed by `reqwest`, pointed at the Helix API.
#[derive(Debug, Clone)]
pub struct HelixClient {
    http: reqwest::Client,
    base_url: String,
    default_headers: Headers,
}

impl HelixClient {
    /// Creates a client with no default headers.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_headers: Headers::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Process-wide initialization: a client for `config.api_base` that
    /// always sends the application's `Client-Id`.
    pub fn for_config(config: &TwitchConfig) -> Self {
        Self::new(&config.api_base).with_default_header(CLIENT_ID_HEADER, &config.client_id)
    }

    /// Returns the headers applied to every request.
    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }
}

#[async_trait]
impl HttpClient for HelixClient {
    async fn get(&self, path: &str, headers: &Headers) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut merged = self.default_headers.clone();
        merged.extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut request = self.http.get(&url);
        for (name, value) in &merged {
            request = request.header(name.as_str(), value.as_str());
        }

        tracing::debug!(url = %url, "GET");
        let response = request.send().await.map_err(AuthError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api { status, body }.into());
        }

        Ok(response.json().await.map_err(AuthError::from)?)
    }
}
