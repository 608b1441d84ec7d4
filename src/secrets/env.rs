//! Environment variable based secrets provider
//!
//! The default provider: secrets are plain environment variables, with
//! .env file support via dotenvy.

use super::*;

/// Secrets provider backed by process environment variables.
///
/// This is the only place in the codebase that touches `std::env::var`
/// or loads a .env file; everything else goes through the trait.
pub struct EnvSecretsProvider;

impl EnvSecretsProvider {
    /// Create a new environment-based provider, loading .env if present.
    /// A missing .env file is not an error.
    pub fn new() -> Self {
        let _ = dotenvy::dotenv();
        Self
    }
}

impl Default for EnvSecretsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SecretsProvider for EnvSecretsProvider {
    async fn get_secret(&self, key: &str) -> Result<Option<String>> {
        Ok(std::env::var(key).ok())
    }

    async fn get_all_secrets(&self) -> Result<HashMap<String, String>> {
        Ok(std::env::vars().collect())
    }
}
