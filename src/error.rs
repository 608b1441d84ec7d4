//! Error types for Yellows
//!
//! This module provides the error hierarchy using thiserror.
//! All errors can be converted to YellowsError for unified error handling.

use thiserror::Error;

/// Main error type for Yellows operations
#[derive(Error, Debug)]
pub enum YellowsError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Authentication and session errors
///
/// Every variant collapses to a generic 401 at the HTTP boundary; the
/// distinction exists for server-side logs and metrics only.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("identity provider exchange failed: {0}")]
    Upstream(String),

    #[error("malformed session token")]
    MalformedToken,

    #[error("session token signature did not verify")]
    InvalidSignature,

    #[error("session token issuer mismatch")]
    InvalidIssuer,

    #[error("session expired")]
    SessionExpired,

    #[error("missing required scopes: {0:?}")]
    InsufficientScope(Vec<String>),

    #[error("missing auth cookie")]
    MissingCookie,

    #[error("login is not provisioned")]
    NotProvisioned,
}

impl AuthError {
    /// Stable label used as the metrics dimension for denied requests
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Upstream(_) => "upstream",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::SessionExpired => "session_expired",
            AuthError::InsufficientScope(_) => "insufficient_scope",
            AuthError::MissingCookie => "missing_cookie",
            AuthError::NotProvisioned => "not_provisioned",
        }
    }
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// Implement From for sqlx::Error
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<sqlx::Error> for YellowsError {
    fn from(err: sqlx::Error) -> Self {
        YellowsError::Storage(StorageError::from(err))
    }
}

/// Network-specific errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Convenient result type for Yellows operations
pub type Result<T> = std::result::Result<T, YellowsError>;

impl YellowsError {
    /// Create a validation error
    #[inline]
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        YellowsError::Validation(msg.into())
    }

    /// Create a config error
    #[inline]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        YellowsError::Config(msg.into())
    }

    /// Create a storage error
    #[inline]
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        YellowsError::Storage(StorageError::Database(msg.into()))
    }

    /// Create a bad request error
    #[inline]
    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        YellowsError::BadRequest(msg.into())
    }

    /// Create an upstream identity provider error
    #[inline]
    pub fn upstream<S: Into<String>>(msg: S) -> Self {
        YellowsError::Auth(AuthError::Upstream(msg.into()))
    }
}
