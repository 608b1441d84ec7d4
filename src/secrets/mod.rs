//! Secrets management
//!
//! All secret material (OAuth client credentials, JWT keys, cursor
//! signing key) reaches the configuration through the `SecretsProvider`
//! trait, so config files never need to embed secrets directly.

mod env;

pub use env::EnvSecretsProvider;

use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Provides access to secrets and environment variables
///
/// The trait is async even though the env-backed provider is not: a
/// cloud secrets-store backend needs network I/O, and starting async
/// avoids a breaking change when one is added.
#[async_trait::async_trait]
pub trait SecretsProvider: Send + Sync {
    /// Get a single secret value by key. Returns None if absent.
    async fn get_secret(&self, key: &str) -> Result<Option<String>>;

    /// Get a secret value with a default fallback
    async fn get_secret_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get_secret(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Check if a secret exists
    async fn has_secret(&self, key: &str) -> bool {
        self.get_secret(key).await.ok().flatten().is_some()
    }

    /// Get all secrets as a map
    async fn get_all_secrets(&self) -> Result<HashMap<String, String>>;
}

/// Expand `$env:VAR` patterns in a string using the secrets provider.
///
/// Patterns whose secret does not exist are left unchanged; multiple
/// patterns in one string are all expanded.
pub async fn expand_value(value: &str, provider: &Arc<dyn SecretsProvider>) -> Result<String> {
    static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\$env:([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid environment variable regex")
    });

    // Fast path: nothing to expand
    if !value.contains("$env:") {
        return Ok(value.to_string());
    }

    let var_names: Vec<&str> = ENV_VAR_PATTERN
        .captures_iter(value)
        .map(|caps| caps.get(1).unwrap().as_str())
        .collect();

    let mut secret_values = HashMap::new();
    for var_name in var_names {
        if let Some(secret_value) = provider.get_secret(var_name).await? {
            secret_values.insert(var_name.to_string(), secret_value);
        }
    }

    let mut result = String::new();
    let mut last_match = 0;
    for cap in ENV_VAR_PATTERN.captures_iter(value) {
        let full_match = cap.get(0).unwrap();
        let var_name = cap.get(1).unwrap().as_str();

        result.push_str(&value[last_match..full_match.start()]);
        if let Some(secret_value) = secret_values.get(var_name) {
            result.push_str(secret_value);
        } else {
            result.push_str(full_match.as_str());
        }
        last_match = full_match.end();
    }
    result.push_str(&value[last_match..]);

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_expand_value_simple() {
        unsafe {
            std::env::set_var("YELLOWS_TEST_VAR", "test_value");
        }

        let provider: Arc<dyn SecretsProvider> = Arc::new(EnvSecretsProvider::new());
        let result = expand_value("$env:YELLOWS_TEST_VAR", &provider).await.unwrap();

        assert_eq!(result, "test_value");

        unsafe {
            std::env::remove_var("YELLOWS_TEST_VAR");
        }
    }

    #[tokio::test]
    async fn test_expand_value_embedded() {
        unsafe {
            std::env::set_var("YELLOWS_TEST_SECRET", "s3cret");
        }

        let provider: Arc<dyn SecretsProvider> = Arc::new(EnvSecretsProvider::new());
        let result = expand_value("client:$env:YELLOWS_TEST_SECRET", &provider)
            .await
            .unwrap();

        assert_eq!(result, "client:s3cret");

        unsafe {
            std::env::remove_var("YELLOWS_TEST_SECRET");
        }
    }

    #[tokio::test]
    async fn test_expand_value_missing_left_unchanged() {
        let provider: Arc<dyn SecretsProvider> = Arc::new(EnvSecretsProvider::new());
        let result = expand_value("$env:YELLOWS_MISSING_VAR", &provider).await.unwrap();

        assert_eq!(result, "$env:YELLOWS_MISSING_VAR");
    }

    #[tokio::test]
    async fn test_expand_value_no_pattern() {
        let provider: Arc<dyn SecretsProvider> = Arc::new(EnvSecretsProvider::new());
        let result = expand_value("literal value", &provider).await.unwrap();

        assert_eq!(result, "literal value");
    }
}
