//! Session token issuance and validation
//!
//! Tokens are RS256-signed JWTs. Asymmetric signing keeps the minting
//! side (private key) separable from anything that only needs to verify
//! sessions (public key).

use crate::config::JwtConfig;
use crate::constants::SESSION_TTL_SECS;
use crate::model::LoginRecord;
use crate::{AuthError, Result, YellowsError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims carried by a session token.
///
/// All four fields are mandatory; a token missing any of them fails
/// validation as malformed before the per-claim checks run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Issuer, always the configured domain name
    pub iss: String,
    /// Subject: the provider-qualified login id
    pub sub: String,
    /// Expiry as Unix seconds, UTC
    pub exp: i64,
    /// Capability tags copied from the login record at issue time
    pub scope: Vec<String>,
}

/// Issues and validates signed session tokens
pub struct SessionTokenCodec {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionTokenCodec {
    pub fn new(issuer: impl Into<String>, jwt: &JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(jwt.private_key_pem.as_bytes())
            .map_err(|e| YellowsError::config(format!("Invalid JWT private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(jwt.public_key_pem.as_bytes())
            .map_err(|e| YellowsError::config(format!("Invalid JWT public key: {}", e)))?;
        Ok(Self {
            issuer: issuer.into(),
            encoding_key,
            decoding_key,
        })
    }

    /// Issue a session token for a provisioned login.
    ///
    /// Sessions last 24 hours; there is no renewal, a new token requires
    /// a fresh login.
    pub fn issue(&self, login: &LoginRecord) -> Result<String> {
        let exp = Utc::now() + Duration::seconds(SESSION_TTL_SECS);
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            sub: login.login_id.clone(),
            exp: exp.timestamp(),
            scope: login.scope.clone(),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("failed to sign session token: {}", e).into())
    }

    /// Validate a presented token against the required scopes.
    ///
    /// Checks run in a fixed order and short-circuit on the first
    /// failure: signature, claim presence, issuer, expiry, scopes.
    pub fn validate(
        &self,
        token: &str,
        required_scopes: &[&str],
    ) -> std::result::Result<SessionClaims, AuthError> {
        // The per-claim checks below carry the error taxonomy, so the
        // library's own claim validation is switched off.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => {
                    tracing::debug!(error = %e, "session token failed to decode");
                    AuthError::MalformedToken
                }
            }
        })?;
        let claims = data.claims;

        if claims.iss != self.issuer {
            return Err(AuthError::InvalidIssuer);
        }

        let expiry =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::MalformedToken)?;
        if expiry <= Utc::now() {
            return Err(AuthError::SessionExpired);
        }

        let missing: Vec<String> = required_scopes
            .iter()
            .filter(|required| !claims.scope.iter().any(|have| have == *required))
            .map(|s| s.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AuthError::InsufficientScope(missing));
        }

        Ok(claims)
    }
}
