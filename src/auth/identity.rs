//! OAuth2 identity exchange against Discord
//!
//! Drives the authorization-code grant and resolves the resulting
//! access token into a verified external identity. These are the only
//! network calls in the auth core; both run under a hard timeout.

use crate::config::Config;
use crate::constants::{LOGIN_FINISH_PATH, PROVIDER_SCOPES};
use crate::model::ExternalIdentity;
use crate::{AuthError, Result, YellowsError};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl, basic::BasicClient,
};
use url::Url;

pub const DISCORD_AUTH_URL: &str = "https://discord.com/oauth2/authorize";
pub const DISCORD_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
pub const DISCORD_GET_SELF_INFO_URL: &str = "https://discord.com/api/users/@me";

/// OAuth2 client for the external identity provider
pub struct IdentityExchange {
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
    profile_url: String,
    redirect_uri: String,
    http_client: reqwest::Client,
}

impl IdentityExchange {
    pub fn new(config: &Config) -> Result<Self> {
        // Redirects stay disabled to prevent authorization code
        // interception; the timeout keeps an unreachable provider from
        // hanging the request.
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.provider_timeout())
            .build()
            .map_err(|e| YellowsError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client_id: config.oauth.client_id.clone(),
            client_secret: config.oauth.client_secret.clone(),
            auth_url: config.oauth.auth_url.clone(),
            token_url: config.oauth.token_url.clone(),
            profile_url: config.oauth.profile_url.clone(),
            redirect_uri: format!("https://{}{}", config.domain_name, LOGIN_FINISH_PATH),
            http_client,
        })
    }

    /// Build the provider authorization URL to redirect the browser to.
    ///
    /// Carries the public client id, the fixed login-finish redirect,
    /// the requested scopes, and a random state; no secrets.
    pub fn create_authorization_url(&self) -> Result<Url> {
        // Note: Can't extract the builder to a helper due to oauth2's typestate pattern
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(self.auth_url.clone())
                    .map_err(|e| YellowsError::config(format!("Invalid auth URL: {}", e)))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(self.redirect_uri.clone())
                    .map_err(|e| YellowsError::config(format!("Invalid redirect URI: {}", e)))?,
            );

        let (auth_url, _csrf_token) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(PROVIDER_SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .url();

        Ok(auth_url)
    }

    /// Exchange the callback URL for a verified external identity.
    ///
    /// The authorization code is single-use; the provider rejects
    /// replays, so callers must not retry this.
    pub async fn resolve_identity(&self, callback_url: &Url) -> Result<ExternalIdentity> {
        let code = callback_url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| AuthError::Upstream("callback missing authorization code".into()))?;

        // Note: Can't extract the builder to a helper due to oauth2's typestate pattern
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_token_uri(
                TokenUrl::new(self.token_url.clone())
                    .map_err(|e| YellowsError::config(format!("Invalid token URL: {}", e)))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(self.redirect_uri.clone())
                    .map_err(|e| YellowsError::config(format!("Invalid redirect URI: {}", e)))?,
            );

        let token_result = client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http_client)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "authorization code exchange failed");
                AuthError::Upstream(format!("token exchange failed: {}", e))
            })?;

        let response = self
            .http_client
            .get(&self.profile_url)
            .bearer_auth(token_result.access_token().secret())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "profile fetch failed");
                AuthError::Upstream(format!("profile fetch failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AuthError::Upstream(format!(
                "profile endpoint returned {}",
                response.status()
            ))
            .into());
        }

        let identity = response.json::<ExternalIdentity>().await.map_err(|e| {
            tracing::warn!(error = %e, "unparseable profile response");
            AuthError::Upstream("unparseable profile response".into())
        })?;

        Ok(identity)
    }
}
