//! Authentication and session core
//!
//! - **identity**: OAuth2 authorization-code exchange against Discord
//! - **token**: RS256 session token issuance and validation
//! - **gate**: the cookie guard evaluated in front of every protected route
//!
//! `AuthService` ties the three together into the login flow: callback
//! URL in, signed session token out.

pub mod gate;
pub mod identity;
pub mod token;

pub use gate::{AuthGate, AuthorizedPrincipal, require_scopes};
pub use identity::IdentityExchange;
pub use token::{SessionClaims, SessionTokenCodec};

use crate::model::LoginRecord;
use crate::storage::Storage;
use crate::{AuthError, Result, StorageError, YellowsError};
use chrono::Utc;
use std::sync::Arc;
use url::Url;

/// Login flow orchestration
pub struct AuthService {
    exchange: IdentityExchange,
    codec: Arc<SessionTokenCodec>,
    storage: Arc<dyn Storage>,
}

impl AuthService {
    pub fn new(
        exchange: IdentityExchange,
        codec: Arc<SessionTokenCodec>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            exchange,
            codec,
            storage,
        }
    }

    /// URL to send the browser to for provider authorization
    pub fn create_authorization_url(&self) -> Result<Url> {
        self.exchange.create_authorization_url()
    }

    /// Complete a login from the provider callback URL.
    ///
    /// A successful provider exchange is necessary but not sufficient:
    /// the identity must resolve to a provisioned login record, and the
    /// last-login write must still find that record. Any failure means
    /// no token is issued.
    pub async fn login(&self, callback_url: &Url) -> Result<String> {
        let identity = self.exchange.resolve_identity(callback_url).await?;
        let login_id = identity.provider_qualified_id();
        tracing::warn!(login_id = %login_id, "attempted login");

        let login = self.get_and_record_login(&login_id).await;
        let login = match login {
            Ok(login) => login,
            Err(e) => {
                crate::telemetry::record_login("denied");
                return Err(e);
            }
        };
        crate::telemetry::record_login("ok");
        tracing::info!(user = %login.login_id, "login succeeded");

        self.codec.issue(&login)
    }

    /// Resolve a provisioned record and stamp its last login.
    ///
    /// Logins are never auto-registered here: provisioning is an
    /// explicit administrative act (`yellows login add`).
    async fn get_and_record_login(&self, login_id: &str) -> Result<LoginRecord> {
        let login = self
            .storage
            .get_login(login_id)
            .await?
            .ok_or(AuthError::NotProvisioned)?;

        // Conditional on existence: a record revoked between the read
        // above and this write fails the login instead of issuing a
        // token against a deleted record.
        match self.storage.update_last_login(login_id, Utc::now()).await {
            Ok(()) => Ok(login),
            Err(YellowsError::Storage(StorageError::NotFound { .. })) => {
                Err(AuthError::NotProvisioned.into())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod identity_test;
