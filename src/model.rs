//! Domain model for Yellows
//!
//! Core entities shared across storage, auth, and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity provider qualifier appended to external user ids
pub const PROVIDER_TAG: &str = "discord";

/// Verified identity returned by the external provider after the OAuth
/// exchange. Ephemeral: it exists only long enough to resolve a
/// [`LoginRecord`] and is never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalIdentity {
    /// Provider-side user id (Discord snowflake)
    pub id: String,
    /// Provider-side display name
    pub username: String,
    /// Email, when the provider shares it
    #[serde(default)]
    pub email: Option<String>,
}

impl ExternalIdentity {
    /// The provider-qualified id used as the login key, e.g. `1234@discord`
    pub fn provider_qualified_id(&self) -> String {
        format!("{}@{}", self.id, PROVIDER_TAG)
    }
}

/// Provisioned authorization state for one external identity.
///
/// Records are created only by administrative provisioning; a login with
/// no record is denied, never auto-created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRecord {
    /// Provider-qualified id, globally unique
    pub login_id: String,
    /// Capability tags granted to this login
    pub scope: Vec<String>,
    /// Updated on every successful authentication
    pub last_login: DateTime<Utc>,
}

impl LoginRecord {
    pub fn new(login_id: impl Into<String>, scope: Vec<String>) -> Self {
        Self {
            login_id: login_id.into(),
            scope,
            last_login: Utc::now(),
        }
    }
}

/// An event users can attend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Unique key, used in storage and URLs
    pub short_name: String,
    pub long_name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendee_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yellow_count: Option<i64>,
}

impl Event {
    pub fn new(
        short_name: impl Into<String>,
        long_name: impl Into<String>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            short_name: short_name.into(),
            long_name: long_name.into(),
            starts_at,
            ends_at,
            venue_id: None,
            attendee_count: None,
            yellow_count: None,
        }
    }
}

/// A user on the attendance leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique key
    pub nick_name: String,
    pub full_name: String,
    pub event_count: i64,
    pub achievement_score: i64,
}

/// Number of nick-name bytes packed into the leaderboard sort key
const SORT_KEY_NICK_BYTES: usize = 12;

impl User {
    pub fn new(nick_name: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            nick_name: nick_name.into(),
            full_name: full_name.into(),
            event_count: 0,
            achievement_score: 0,
        }
    }

    /// Leaderboard sort key: the low 32 bits of the achievement score
    /// shifted above the first 12 bytes of the nick name, so that equal
    /// scores tie-break alphabetically within one ordered index scan.
    pub fn leaderboard_sort_key(&self) -> u128 {
        let mut bits = ((self.achievement_score as u128) & 0xffff_ffff) << (SORT_KEY_NICK_BYTES * 8);
        for (i, byte) in self
            .nick_name
            .as_bytes()
            .iter()
            .take(SORT_KEY_NICK_BYTES)
            .enumerate()
        {
            bits |= (*byte as u128) << ((SORT_KEY_NICK_BYTES - i - 1) * 8);
        }
        bits
    }
}

#[cfg(test)]
mod model_test {
    include!("model_test.rs");
}
