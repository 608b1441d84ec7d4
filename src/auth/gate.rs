//! Cookie-based auth gate
//!
//! The single enforcement point in front of every protected route:
//! cookie extraction, token validation, scope check, then the login
//! record lookup that lets revocation beat an unexpired token.

use crate::auth::token::SessionTokenCodec;
use crate::constants::AUTH_COOKIE;
use crate::model::LoginRecord;
use crate::storage::Storage;
use crate::{AuthError, Result, YellowsError};
use axum::{
    extract::Request,
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The authenticated login resolved for one request.
///
/// Constructed fresh from storage per request; never cached across
/// requests. Handlers receive it as a typed request extension.
#[derive(Debug, Clone)]
pub struct AuthorizedPrincipal {
    pub login: LoginRecord,
}

/// Reusable guard evaluated in front of protected handlers
pub struct AuthGate {
    codec: Arc<SessionTokenCodec>,
    storage: Arc<dyn Storage>,
}

impl AuthGate {
    pub fn new(codec: Arc<SessionTokenCodec>, storage: Arc<dyn Storage>) -> Self {
        Self { codec, storage }
    }

    /// Authenticate a request against the required scopes.
    ///
    /// The checks short-circuit: no cookie means no token parsing is
    /// attempted at all. A valid token whose subject no longer has a
    /// login record is denied; revocation takes effect before the
    /// token's natural expiry.
    pub async fn require(
        &self,
        headers: &HeaderMap,
        required_scopes: &[&str],
    ) -> Result<AuthorizedPrincipal> {
        let result = self.check(headers, required_scopes).await;
        if let Err(YellowsError::Auth(err)) = &result {
            crate::telemetry::record_denied(err.reason());
            tracing::warn!(reason = err.reason(), "request denied");
        }
        result
    }

    async fn check(
        &self,
        headers: &HeaderMap,
        required_scopes: &[&str],
    ) -> Result<AuthorizedPrincipal> {
        let token = extract_auth_cookie(headers).ok_or(AuthError::MissingCookie)?;
        let claims = self.codec.validate(&token, required_scopes)?;

        let login = self
            .storage
            .get_login(&claims.sub)
            .await?
            .ok_or(AuthError::NotProvisioned)?;

        // The only audit trail: the principal lands on the request span
        tracing::info!(user = %login.login_id, "authenticated");
        Ok(AuthorizedPrincipal { login })
    }
}

/// Pull the session token out of the `yellows-auth` cookie, if present
pub fn extract_auth_cookie(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    let prefix = format!("{}=", AUTH_COOKIE);
    cookie_header
        .split(';')
        .map(|c| c.trim())
        .find_map(|c| c.strip_prefix(prefix.as_str()))
        .map(|s| s.to_string())
}

/// Per-route guard layer.
///
/// Routes declare their required scope set at registration time (empty
/// slice = any authenticated session); the layer runs before the
/// handler and short-circuits it entirely on failure. Handlers read the
/// principal from a typed `Extension<AuthorizedPrincipal>`.
pub fn require_scopes(
    gate: Arc<AuthGate>,
    required_scopes: &'static [&'static str],
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone {
    move |mut req: Request, next: Next| {
        let gate = gate.clone();
        Box::pin(async move {
            match gate.require(req.headers(), required_scopes).await {
                Ok(principal) => {
                    req.extensions_mut().insert(principal);
                    next.run(req).await
                }
                // The shared error mapping keeps every denial generic
                Err(err) => crate::http::AppError::from(err).into_response(),
            }
        })
    }
}
