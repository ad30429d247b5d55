//! Configuration management for twitch-session
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! The only value the provider cannot do without is `twitch.client_id`.  Its
//! absence is tolerated here (with a warning) and surfaces later as a
//! provider-side rejection.

use crate::error::{AuthError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for twitch-session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Identity provider settings
    #[serde(default)]
    pub twitch: TwitchConfig,

    /// Loopback redirect settings
    #[serde(default)]
    pub redirect: RedirectConfig,
}

/// Twitch identity provider configuration
///
/// The endpoint defaults reproduce the provider's wire contract; they are
/// configurable so tests can point them at a mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitchConfig {
    /// Application client identifier registered with Twitch
    #[serde(default)]
    pub client_id: String,

    /// OAuth authorization endpoint
    #[serde(default = "default_authorization_endpoint")]
    pub authorization_endpoint: String,

    /// OAuth revocation endpoint
    #[serde(default = "default_revocation_endpoint")]
    pub revocation_endpoint: String,

    /// Base URL of the Helix API (the profile endpoint is `{api_base}/users`)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Requested scopes, joined with spaces in the authorization request
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Send `force_verify=true` so Twitch always asks the user to confirm
    #[serde(default = "default_force_verify")]
    pub force_verify: bool,
}

fn default_authorization_endpoint() -> String {
    "https://id.twitch.tv/oauth2/authorize".to_string()
}

fn default_revocation_endpoint() -> String {
    "https://id.twitch.tv/oauth2/revoke".to_string()
}

fn default_api_base() -> String {
    "https://api.twitch.tv/helix".to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "openid".to_string(),
        "user:read:email".to_string(),
        "user:read:follows".to_string(),
    ]
}

fn default_force_verify() -> bool {
    true
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            authorization_endpoint: default_authorization_endpoint(),
            revocation_endpoint: default_revocation_endpoint(),
            api_base: default_api_base(),
            scopes: default_scopes(),
            force_verify: default_force_verify(),
        }
    }
}

impl TwitchConfig {
    /// Returns the space-delimited scope string sent to the provider.
    ///
    /// Blank entries are skipped and surrounding whitespace is trimmed.
    pub fn scope(&self) -> String {
        self.scopes
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Loopback redirect configuration
///
/// Twitch matches redirect URIs exactly against the ones registered for the
/// application, so the port is fixed rather than OS-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// Host name used in the redirect URI
    #[serde(default = "default_redirect_host")]
    pub host: String,

    /// Local address the callback listener binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for both the redirect URI and the listener
    #[serde(default = "default_redirect_port")]
    pub port: u16,

    /// Callback path, starting with `/`
    #[serde(default = "default_redirect_path")]
    pub path: String,

    /// Try to open the system browser automatically
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,

    /// Give up waiting for the redirect after this many seconds.  `None`
    /// waits until the user completes or presses Ctrl-C.
    #[serde(default = "default_redirect_timeout")]
    pub timeout_seconds: Option<u64>,
}

fn default_redirect_host() -> String {
    "localhost".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_redirect_port() -> u16 {
    3000
}

fn default_redirect_path() -> String {
    "/callback".to_string()
}

fn default_open_browser() -> bool {
    true
}

fn default_redirect_timeout() -> Option<u64> {
    Some(300)
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            host: default_redirect_host(),
            bind_address: default_bind_address(),
            port: default_redirect_port(),
            path: default_redirect_path(),
            open_browser: default_open_browser(),
            timeout_seconds: default_redirect_timeout(),
        }
    }
}

impl RedirectConfig {
    /// Returns the redirect URI registered with the provider.
    pub fn redirect_uri(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }

    /// Returns the redirect wait limit, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| AuthError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(client_id) = std::env::var("TWITCH_SESSION_CLIENT_ID") {
            self.twitch.client_id = client_id;
        } else if let Ok(client_id) = std::env::var("CLIENT_ID") {
            tracing::debug!("Using client id from CLIENT_ID");
            self.twitch.client_id = client_id;
        }

        if let Ok(api_base) = std::env::var("TWITCH_SESSION_API_BASE") {
            tracing::debug!(api_base = %api_base, "Env override: TWITCH_SESSION_API_BASE");
            self.twitch.api_base = api_base;
        }

        if let Ok(host) = std::env::var("TWITCH_SESSION_REDIRECT_HOST") {
            self.redirect.host = host;
        }

        if let Ok(port) = std::env::var("TWITCH_SESSION_REDIRECT_PORT") {
            if let Ok(value) = port.parse() {
                self.redirect.port = value;
            } else {
                tracing::warn!("Invalid TWITCH_SESSION_REDIRECT_PORT: {}", port);
            }
        }

        if let Ok(timeout) = std::env::var("TWITCH_SESSION_REDIRECT_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(0) => self.redirect.timeout_seconds = None,
                Ok(value) => self.redirect.timeout_seconds = Some(value),
                Err(_) => {
                    tracing::warn!("Invalid TWITCH_SESSION_REDIRECT_TIMEOUT_SECONDS: {}", timeout)
                }
            }
        }

        if let Ok(open_browser) = std::env::var("TWITCH_SESSION_OPEN_BROWSER") {
            match open_browser.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.redirect.open_browser = true,
                "0" | "false" | "no" => self.redirect.open_browser = false,
                _ => tracing::warn!(
                    "Invalid value for TWITCH_SESSION_OPEN_BROWSER: {}",
                    open_browser
                ),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(client_id) = &cli.client_id {
            self.twitch.client_id = client_id.clone();
        }
        if cli.no_browser {
            self.redirect.open_browser = false;
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if an endpoint is not a valid URL, no scopes are
    /// configured, or the redirect settings cannot form a redirect URI
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("twitch.authorization_endpoint", &self.twitch.authorization_endpoint),
            ("twitch.revocation_endpoint", &self.twitch.revocation_endpoint),
            ("twitch.api_base", &self.twitch.api_base),
        ] {
            if let Err(e) = url::Url::parse(value) {
                return Err(AuthError::Config(format!("{name} is not a valid URL: {e}")).into());
            }
        }

        if self.twitch.scopes.iter().all(|s| s.trim().is_empty()) {
            return Err(
                AuthError::Config("twitch.scopes must contain at least one scope".to_string())
                    .into(),
            );
        }

        if !self.redirect.path.starts_with('/') {
            return Err(
                AuthError::Config("redirect.path must start with '/'".to_string()).into(),
            );
        }

        if self.redirect.port == 0 {
            return Err(AuthError::Config(
                "redirect.port must be fixed; Twitch matches redirect URIs exactly".to_string(),
            )
            .into());
        }

        if self.redirect.timeout_seconds == Some(0) {
            return Err(AuthError::Config(
                "redirect.timeout_seconds must be greater than 0 when set".to_string(),
            )
            .into());
        }

        if self.twitch.client_id.is_empty() {
            tracing::warn!("twitch.client_id is empty; Twitch will reject the authorization request");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use serial_test::serial;

    const ENV_VARS: [&str; 7] = [
        "TWITCH_SESSION_CLIENT_ID",
        "CLIENT_ID",
        "TWITCH_SESSION_API_BASE",
        "TWITCH_SESSION_REDIRECT_HOST",
        "TWITCH_SESSION_REDIRECT_PORT",
        "TWITCH_SESSION_REDIRECT_TIMEOUT_SECONDS",
        "TWITCH_SESSION_OPEN_BROWSER",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.twitch.authorization_endpoint,
            "https://id.twitch.tv/oauth2/authorize"
        );
        assert_eq!(
            config.twitch.revocation_endpoint,
            "https://id.twitch.tv/oauth2/revoke"
        );
        assert!(config.twitch.force_verify);
        assert_eq!(config.redirect.redirect_uri(), "http://localhost:3000/callback");
    }

    #[test]
    fn test_scope_is_space_delimited() {
        let config = TwitchConfig::default();
        assert_eq!(config.scope(), "openid user:read:email user:read:follows");
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validation_tolerates_missing_client_id() {
        let config = Config::default();
        assert!(config.twitch.client_id.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.twitch.revocation_endpoint = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("twitch.revocation_endpoint"));
    }

    #[test]
    fn test_scope_skips_blank_entries() {
        let mut config = Config::default();
        config.twitch.scopes = vec![
            "openid".to_string(),
            String::new(),
            "  ".to_string(),
            " user:read:email ".to_string(),
        ];
        assert_eq!(config.twitch.scope(), "openid user:read:email");
        config.validate().unwrap();
    }

    #[test]
    fn test_validation_rejects_empty_scopes() {
        let mut config = Config::default();
        config.twitch.scopes = vec![" ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_relative_path() {
        let mut config = Config::default();
        config.redirect.path = "callback".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_port_zero() {
        let mut config = Config::default();
        config.redirect.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
twitch:
  client_id: abc123
redirect:
  port: 8910
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.twitch.client_id, "abc123");
        assert_eq!(config.twitch.api_base, "https://api.twitch.tv/helix");
        assert_eq!(config.redirect.port, 8910);
        assert_eq!(config.redirect.path, "/callback");
        assert_eq!(config.redirect.timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_yaml_null_timeout_disables_limit() {
        let yaml = "redirect:\n  timeout_seconds: null\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.redirect.timeout(), None);
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        clear_env();
        let config = Config::load("/nonexistent/config.yaml", &Cli::default()).unwrap();
        assert!(config.twitch.client_id.is_empty());
        assert_eq!(config.redirect.port, 3000);
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "twitch:\n  client_id: from-file\n").unwrap();

        let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
        assert_eq!(config.twitch.client_id, "from-file");
    }

    #[test]
    #[serial]
    fn test_load_rejects_malformed_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "twitch: [unclosed").unwrap();

        let err = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    #[serial]
    fn test_env_client_id_takes_precedence_over_fallback() {
        clear_env();
        std::env::set_var("CLIENT_ID", "fallback");
        std::env::set_var("TWITCH_SESSION_CLIENT_ID", "primary");

        let config = Config::load("/nonexistent/config.yaml", &Cli::default()).unwrap();
        assert_eq!(config.twitch.client_id, "primary");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_plain_client_id_fallback() {
        clear_env();
        std::env::set_var("CLIENT_ID", "fallback");

        let config = Config::load("/nonexistent/config.yaml", &Cli::default()).unwrap();
        assert_eq!(config.twitch.client_id, "fallback");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_redirect_overrides() {
        clear_env();
        std::env::set_var("TWITCH_SESSION_REDIRECT_PORT", "4567");
        std::env::set_var("TWITCH_SESSION_REDIRECT_TIMEOUT_SECONDS", "0");
        std::env::set_var("TWITCH_SESSION_OPEN_BROWSER", "false");

        let config = Config::load("/nonexistent/config.yaml", &Cli::default()).unwrap();
        assert_eq!(config.redirect.port, 4567);
        assert_eq!(config.redirect.timeout_seconds, None);
        assert!(!config.redirect.open_browser);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_invalid_port_is_ignored() {
        clear_env();
        std::env::set_var("TWITCH_SESSION_REDIRECT_PORT", "not-a-port");

        let config = Config::load("/nonexistent/config.yaml", &Cli::default()).unwrap();
        assert_eq!(config.redirect.port, 3000);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_cli_overrides_env() {
        clear_env();
        std::env::set_var("TWITCH_SESSION_CLIENT_ID", "from-env");
        let cli = Cli {
            client_id: Some("from-cli".to_string()),
            no_browser: true,
            ..Cli::default()
        };

        let config = Config::load("/nonexistent/config.yaml", &cli).unwrap();
        assert_eq!(config.twitch.client_id, "from-cli");
        assert!(!config.redirect.open_browser);
        clear_env();
    }
}
