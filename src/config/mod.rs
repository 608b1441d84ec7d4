//! Configuration management for Yellows
//!
//! Loads configuration from yellows.config.json, resolving `$env:VAR`
//! references through the secrets provider. The resulting `Config` is
//! built once at process start and injected into every component; there
//! are no lazily-initialized globals.

use crate::secrets::{SecretsProvider, expand_value};
use crate::{Result, YellowsError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Complete Yellows configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Public domain this service is reached under; doubles as the JWT issuer
    pub domain_name: String,

    /// Storage configuration (required)
    pub storage: StorageConfig,

    /// Identity provider credentials and endpoints
    pub oauth: OAuthConfig,

    /// JWT signing keypair (RS256, PEM)
    pub jwt: JwtConfig,

    /// Pagination cursor signing
    pub pagination: PaginationConfig,

    /// HTTP server configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,

    /// Timeout for outbound identity provider calls, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_timeout_secs: Option<u64>,

    /// Logging configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Driver name (sqlite, memory)
    pub driver: String,

    /// Data source name / database path (unused for memory)
    #[serde(default)]
    pub dsn: String,
}

/// OAuth2 identity provider configuration
///
/// The endpoint URLs default to Discord's; tests point them at a mock
/// server instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    /// Public OAuth client id
    pub client_id: String,

    /// OAuth client secret (use `$env:...` in the config file)
    pub client_secret: String,

    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_profile_url")]
    pub profile_url: String,
}

/// RS256 keypair for session tokens
///
/// Only the issuing path needs the private key; validation uses the
/// public key alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtConfig {
    /// PEM-encoded RSA public key
    pub public_key_pem: String,

    /// PEM-encoded RSA private key
    pub private_key_pem: String,
}

/// Pagination cursor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationConfig {
    /// Key for HMAC-signing opaque next_token cursors
    pub signing_key: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable secure cookies (requires HTTPS). Default: false for local development
    #[serde(default)]
    pub secure: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secure: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    crate::constants::DEFAULT_HTTP_PORT
}

fn default_auth_url() -> String {
    crate::auth::identity::DISCORD_AUTH_URL.to_string()
}

fn default_token_url() -> String {
    crate::auth::identity::DISCORD_TOKEN_URL.to_string()
}

fn default_profile_url() -> String {
    crate::auth::identity::DISCORD_GET_SELF_INFO_URL.to_string()
}

impl Config {
    /// Load configuration from the default path
    pub async fn load(secrets: &Arc<dyn SecretsProvider>) -> Result<Self> {
        Self::load_from_path(crate::constants::CONFIG_FILE, secrets).await
    }

    /// Load configuration from a specific path, expanding `$env:VAR`
    /// references before parsing.
    pub async fn load_from_path<P: AsRef<Path>>(
        path: P,
        secrets: &Arc<dyn SecretsProvider>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            YellowsError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let expanded = expand_value(&content, secrets).await?;
        let config: Config = serde_json::from_str(&expanded)
            .map_err(|e| YellowsError::config(format!("Failed to parse JSON config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.domain_name.is_empty() {
            return Err(YellowsError::config("domainName must not be empty"));
        }
        if self.oauth.client_id.is_empty() || self.oauth.client_secret.is_empty() {
            return Err(YellowsError::config("oauth clientId/clientSecret must be set"));
        }
        if !self.jwt.public_key_pem.contains("BEGIN") || !self.jwt.private_key_pem.contains("BEGIN")
        {
            return Err(YellowsError::config("jwt keys must be PEM encoded"));
        }
        if self.pagination.signing_key.is_empty() {
            return Err(YellowsError::config("pagination signingKey must be set"));
        }
        match self.storage.driver.as_str() {
            "memory" => {}
            "sqlite" if !self.storage.dsn.is_empty() => {}
            "sqlite" => {
                return Err(YellowsError::config("sqlite storage requires a dsn"));
            }
            other => {
                return Err(YellowsError::config(format!(
                    "Unknown storage driver: {}. Supported: memory, sqlite",
                    other
                )));
            }
        }
        Ok(())
    }

    /// HTTP settings with defaults filled in
    pub fn http(&self) -> HttpConfig {
        self.http.clone().unwrap_or_default()
    }

    /// Timeout applied to outbound identity provider calls
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(
            self.provider_timeout_secs
                .unwrap_or(crate::constants::DEFAULT_PROVIDER_TIMEOUT_SECS),
        )
    }
}
