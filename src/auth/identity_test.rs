//! Tests for the identity exchange
//!
//! The provider is mocked with wiremock; only create_authorization_url
//! is pure enough to test without it.

use crate::auth::identity::IdentityExchange;
use crate::config::{Config, JwtConfig, OAuthConfig, PaginationConfig, StorageConfig};
use crate::{AuthError, YellowsError};
use std::collections::HashMap;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUB: &str = include_str!("testdata/jwt_key.pub.pem");
const PRIV: &str = include_str!("testdata/jwt_key.pem");

fn test_config(provider_base: Option<&str>) -> Config {
    let oauth = match provider_base {
        Some(base) => OAuthConfig {
            client_id: "abc".to_string(),
            client_secret: "shh".to_string(),
            auth_url: format!("{}/oauth2/authorize", base),
            token_url: format!("{}/api/oauth2/token", base),
            profile_url: format!("{}/api/users/@me", base),
        },
        None => OAuthConfig {
            client_id: "abc".to_string(),
            client_secret: "shh".to_string(),
            auth_url: super::identity::DISCORD_AUTH_URL.to_string(),
            token_url: super::identity::DISCORD_TOKEN_URL.to_string(),
            profile_url: super::identity::DISCORD_GET_SELF_INFO_URL.to_string(),
        },
    };
    Config {
        domain_name: "example.com".to_string(),
        storage: StorageConfig {
            driver: "memory".to_string(),
            dsn: String::new(),
        },
        oauth,
        jwt: JwtConfig {
            public_key_pem: PUB.to_string(),
            private_key_pem: PRIV.to_string(),
        },
        pagination: PaginationConfig {
            signing_key: "cursor-key".to_string(),
        },
        http: None,
        provider_timeout_secs: Some(2),
        log: None,
    }
}

fn callback_url(code: Option<&str>) -> Url {
    let mut url = Url::parse("https://example.com/api/auth/login-finish").unwrap();
    if let Some(code) = code {
        url.query_pairs_mut()
            .append_pair("code", code)
            .append_pair("state", "xyz");
    }
    url
}

#[test]
fn test_create_authorization_url() {
    let exchange = IdentityExchange::new(&test_config(None)).unwrap();
    let url = exchange.create_authorization_url().unwrap();

    assert_eq!(url.host_str(), Some("discord.com"));
    assert_eq!(url.path(), "/oauth2/authorize");

    let params: HashMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(params.get("client_id").map(String::as_str), Some("abc"));
    assert_eq!(
        params.get("redirect_uri").map(String::as_str),
        Some("https://example.com/api/auth/login-finish")
    );
    assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
    assert_eq!(
        params.get("scope").map(String::as_str),
        Some("identify email")
    );
    // Random per call; must exist, must not leak the client secret
    assert!(!params.get("state").unwrap().is_empty());
    assert!(!url.as_str().contains("shh"));
}

#[tokio::test]
async fn test_resolve_identity_happy_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "prov-token",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/@me"))
        .and(header("Authorization", "Bearer prov-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "80351110224678912",
            "username": "nelly",
            "email": "nelly@example.com",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let exchange = IdentityExchange::new(&test_config(Some(&server.uri()))).unwrap();
    let identity = exchange
        .resolve_identity(&callback_url(Some("auth-code")))
        .await
        .unwrap();

    assert_eq!(identity.id, "80351110224678912");
    assert_eq!(identity.username, "nelly");
    assert_eq!(identity.provider_qualified_id(), "80351110224678912@discord");
}

#[tokio::test]
async fn test_missing_code_is_upstream_error() {
    let server = MockServer::start().await;
    let exchange = IdentityExchange::new(&test_config(Some(&server.uri()))).unwrap();

    let err = exchange
        .resolve_identity(&callback_url(None))
        .await
        .unwrap_err();
    assert!(matches!(err, YellowsError::Auth(AuthError::Upstream(_))));
}

#[tokio::test]
async fn test_provider_rejecting_exchange_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
        })))
        .mount(&server)
        .await;

    let exchange = IdentityExchange::new(&test_config(Some(&server.uri()))).unwrap();
    let err = exchange
        .resolve_identity(&callback_url(Some("replayed-code")))
        .await
        .unwrap_err();
    assert!(matches!(err, YellowsError::Auth(AuthError::Upstream(_))));
}

#[tokio::test]
async fn test_profile_failure_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "prov-token",
            "token_type": "Bearer",
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/@me"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let exchange = IdentityExchange::new(&test_config(Some(&server.uri()))).unwrap();
    let err = exchange
        .resolve_identity(&callback_url(Some("auth-code")))
        .await
        .unwrap_err();
    assert!(matches!(err, YellowsError::Auth(AuthError::Upstream(_))));
}

#[tokio::test]
async fn test_unparseable_profile_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "prov-token",
            "token_type": "Bearer",
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/@me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let exchange = IdentityExchange::new(&test_config(Some(&server.uri()))).unwrap();
    let err = exchange
        .resolve_identity(&callback_url(Some("auth-code")))
        .await
        .unwrap_err();
    assert!(matches!(err, YellowsError::Auth(AuthError::Upstream(_))));
}
