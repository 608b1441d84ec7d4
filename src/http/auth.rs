//! Login flow endpoints
//!
//! Three redirects: out to the provider, back in through the callback
//! (which sets the session cookie), and logout (which clears it).

use super::{AppError, AppState};
use crate::YellowsError;
use crate::constants::{AUTH_COOKIE, LOGIN_FINISH_PATH, SESSION_TTL_SECS};
use axum::extract::{RawQuery, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use url::Url;

/// GET /api/auth/login - redirect the browser to the provider
pub async fn login_get(State(state): State<AppState>) -> Result<Response, AppError> {
    let auth_url = state.deps.auth.create_authorization_url()?;
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, auth_url.to_string())],
        "Redir..",
    )
        .into_response())
}

/// GET /api/auth/login-finish - complete the OAuth callback and set the
/// session cookie
pub async fn login_finish_get(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    // Rebuild the full callback URL the provider redirected to; the
    // authorization code travels in its query string.
    let mut callback = format!(
        "https://{}{}",
        state.deps.config.domain_name, LOGIN_FINISH_PATH
    );
    if let Some(query) = query {
        callback.push('?');
        callback.push_str(&query);
    }
    let callback = Url::parse(&callback)
        .map_err(|e| YellowsError::bad_request(format!("bad callback URL: {}", e)))?;

    let token = state.deps.auth.login(&callback).await?;

    let cookie = format!(
        "{}={}; Max-Age={}; Path=/",
        AUTH_COOKIE, token, SESSION_TTL_SECS
    );
    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, cookie),
        ],
        "Redir...",
    )
        .into_response())
}

/// GET /api/auth/logout - clear the session cookie
pub async fn logout_get() -> Response {
    let cookie = format!("{}=dead; Max-Age=0; Path=/", AUTH_COOKIE);
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, cookie),
        ],
        "Redir..",
    )
        .into_response()
}
