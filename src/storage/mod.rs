//! Storage backends for Yellows
//!
//! Provides multiple storage backends with a unified trait interface.
//! The login-record contract is deliberately narrow: a keyed get plus a
//! conditional last-login update that fails if the record is gone.

pub mod memory;
pub mod sqlite;

use crate::model::{Event, LoginRecord, User};
use crate::{Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Opaque resume position for paginated listings.
///
/// Shaped like the key of the last item returned; callers treat it as a
/// black box (the HTTP layer signs it into the next_token cursor).
pub type LastKey = serde_json::Value;

/// One page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present when more items remain past this page
    pub last_key: Option<LastKey>,
}

/// Storage trait for logins, events, and users
#[async_trait]
pub trait Storage: Send + Sync {
    // Login record methods
    /// Create or replace a login record (administrative provisioning)
    async fn put_login(&self, login: &LoginRecord) -> Result<()>;

    /// Get a login record by provider-qualified id
    async fn get_login(&self, login_id: &str) -> Result<Option<LoginRecord>>;

    /// Delete a login record (revocation)
    async fn delete_login(&self, login_id: &str) -> Result<()>;

    /// Set last_login, conditional on the record still existing.
    /// Fails with `StorageError::NotFound` instead of creating anything.
    async fn update_last_login(&self, login_id: &str, at: DateTime<Utc>) -> Result<()>;

    // Event methods
    /// Insert a new event; fails with `StorageError::AlreadyExists` on a
    /// short-name collision
    async fn create_event(&self, event: &Event) -> Result<()>;

    /// Get an event by short name
    async fn get_event(&self, short_name: &str) -> Result<Option<Event>>;

    /// List events in start-time order
    async fn list_events(&self, limit: usize, start_after: Option<LastKey>) -> Result<Page<Event>>;

    // User methods
    /// Create or replace a user
    async fn put_user(&self, user: &User) -> Result<()>;

    /// Get a user by nick name
    async fn get_user(&self, nick_name: &str) -> Result<Option<User>>;

    /// List users in leaderboard order (highest score first)
    async fn list_users(&self, limit: usize, start_after: Option<LastKey>) -> Result<Page<User>>;
}

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Create a storage backend from configuration
pub async fn create_storage_from_config(
    config: &crate::config::StorageConfig,
) -> Result<Arc<dyn Storage>> {
    match config.driver.as_str() {
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        "sqlite" => Ok(Arc::new(SqliteStorage::new(&config.dsn).await?)),
        _ => Err(crate::YellowsError::config(format!(
            "Unknown storage driver: {}. Supported: memory, sqlite",
            config.driver
        ))),
    }
}

/// Key of the last returned event, fed back as the next page's start
pub(crate) fn event_last_key(event: &Event) -> LastKey {
    serde_json::json!({
        "startsAt": event.starts_at.timestamp(),
        "shortName": event.short_name,
    })
}

/// Key of the last returned user
pub(crate) fn user_last_key(user: &User) -> LastKey {
    serde_json::json!({
        "sortKey": format!("{:032x}", user.leaderboard_sort_key()),
    })
}

pub(crate) fn parse_event_key(key: &LastKey) -> Result<(i64, String)> {
    let starts_at = key
        .get("startsAt")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| StorageError::Database("bad event page key".into()))?;
    let short_name = key
        .get("shortName")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StorageError::Database("bad event page key".into()))?;
    Ok((starts_at, short_name.to_string()))
}

pub(crate) fn parse_user_key(key: &LastKey) -> Result<String> {
    let sort_key = key
        .get("sortKey")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StorageError::Database("bad user page key".into()))?;
    Ok(sort_key.to_string())
}
