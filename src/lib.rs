//! Yellows - event attendance tracking backend
//!
//! Users log in with Discord, get a signed session cookie, and can list
//! or create events and browse the attendance leaderboard.
//!
//! # Architecture
//!
//! - **auth**: the authentication core - OAuth2 identity exchange,
//!   RS256 session tokens, and the cookie gate in front of every
//!   protected route
//! - **storage**: login records, events, and users behind one trait
//!   (in-memory and SQLite backends)
//! - **http**: axum REST API
//! - **config/secrets**: JSON config with `$env:` secret references,
//!   built once at startup and injected everywhere
//!
//! # Example
//!
//! ```rust,no_run
//! use yellows::config::Config;
//! use yellows::secrets::{EnvSecretsProvider, SecretsProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let secrets: Arc<dyn SecretsProvider> = Arc::new(EnvSecretsProvider::new());
//!     let config = Config::load(&secrets).await?;
//!     yellows::http::start_server(config).await?;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod constants;
pub mod error;
pub mod model;

// The authentication and session core
pub mod auth;

// Infrastructure
pub mod config;
pub mod core;
pub mod secrets;
pub mod storage;
pub mod telemetry;

// Interface layers
pub mod cli;
pub mod http;

// Re-exports for convenience
pub use error::{AuthError, NetworkError, Result, StorageError, YellowsError};
pub use model::{Event, ExternalIdentity, LoginRecord, User};

/// Initialize logging for the application
pub fn init_logging() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "yellows=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
