//! Dependency wiring
//!
//! Everything stateful is constructed exactly once here, at process
//! start, and handed to components by reference. Testing swaps in a
//! fake storage or a mock provider by building `Dependencies` by hand.

use crate::auth::{AuthGate, AuthService, IdentityExchange, SessionTokenCodec};
use crate::config::Config;
use crate::storage::{Storage, create_storage_from_config};
use crate::Result;
use std::sync::Arc;

/// Shared, immutable-after-startup dependencies
#[derive(Clone)]
pub struct Dependencies {
    pub config: Arc<Config>,
    pub storage: Arc<dyn Storage>,
    pub auth: Arc<AuthService>,
    pub gate: Arc<AuthGate>,
}

/// Create all dependencies from configuration
pub async fn create_dependencies(config: &Config) -> Result<Dependencies> {
    let config = Arc::new(config.clone());
    let storage = create_storage_from_config(&config.storage).await?;

    let codec = Arc::new(SessionTokenCodec::new(&config.domain_name, &config.jwt)?);
    let exchange = IdentityExchange::new(&config)?;

    let auth = Arc::new(AuthService::new(exchange, codec.clone(), storage.clone()));
    let gate = Arc::new(AuthGate::new(codec, storage.clone()));

    Ok(Dependencies {
        config,
        storage,
        auth,
        gate,
    })
}
