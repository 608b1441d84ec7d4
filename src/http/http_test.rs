//! Router-level tests
//!
//! Drive the real router with tower's oneshot; the identity provider is
//! not involved (the login-finish flow is covered in tests/).

use super::*;
use crate::auth::token::SessionTokenCodec;
use crate::config::{Config, JwtConfig, OAuthConfig, PaginationConfig, StorageConfig};
use crate::constants::AUTH_COOKIE;
use crate::model::{LoginRecord, User};
use axum::body::Body;
use axum::http::{Request as HttpRequest, header};
use tower::util::ServiceExt;

const PUB: &str = include_str!("../auth/testdata/jwt_key.pub.pem");
const PRIV: &str = include_str!("../auth/testdata/jwt_key.pem");

fn test_config() -> Config {
    Config {
        domain_name: "example.com".to_string(),
        storage: StorageConfig {
            driver: "memory".to_string(),
            dsn: String::new(),
        },
        oauth: OAuthConfig {
            client_id: "abc".to_string(),
            client_secret: "shh".to_string(),
            auth_url: crate::auth::identity::DISCORD_AUTH_URL.to_string(),
            token_url: crate::auth::identity::DISCORD_TOKEN_URL.to_string(),
            profile_url: crate::auth::identity::DISCORD_GET_SELF_INFO_URL.to_string(),
        },
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

async fn test_state() -> AppState {
    let config = test_config();
    let deps = crate::core::create_dependencies(&config).await.unwrap();
    AppState {
        cursor: Arc::new(CursorCodec::new(&config.pagination.signing_key)),
        deps,
    }
}

/// Provision a login and mint a session cookie for it
async fn session_cookie(state: &AppState, login_id: &str, scopes: &[&str]) -> String {
    let record = LoginRecord::new(login_id, scopes.iter().map(|s| s.to_string()).collect());
    state.deps.storage.put_login(&record).await.unwrap();

    let codec =
        SessionTokenCodec::new(&state.deps.config.domain_name, &state.deps.config.jwt).unwrap();
    format!("{}={}", AUTH_COOKIE, codec.issue(&record).unwrap())
}

async fn send(
    router: &Router,
    request: HttpRequest<Body>,
) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, headers, body)
}

fn get_request(path: &str, cookie: Option<&str>) -> HttpRequest<Body> {
    let mut builder = HttpRequest::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(path: &str, cookie: &str, body: serde_json::Value) -> HttpRequest<Body> {
    HttpRequest::builder()
        .method("POST")
        .uri(path)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_healthz() {
    let router = build_router(test_state().await);
    let (status, _headers, body) = send(&router, get_request("/healthz", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_protected_routes_deny_without_cookie() {
    let router = build_router(test_state().await);

    for path in ["/api/events", "/api/users"] {
        let (status, _headers, body) = send(&router, get_request(path, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "path: {}", path);
        // Generic body: no hint of which check failed
        assert_eq!(body["error"]["type"], "unauthorized");
        assert_eq!(body["error"]["message"], "unauthorized");
    }
}

#[tokio::test]
async fn test_events_list_with_session() {
    let state = test_state().await;
    let cookie = session_cookie(&state, "42@discord", &[]).await;
    let router = build_router(state);

    let (status, _headers, body) = send(&router, get_request("/api/events", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"], serde_json::json!([]));
    assert_eq!(body["next_token"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_event_creation_requires_admin_scope() {
    let state = test_state().await;
    let reader = session_cookie(&state, "42@discord", &["read"]).await;
    let admin = session_cookie(&state, "1@discord", &["event-admin"]).await;
    let router = build_router(state);

    let event = serde_json::json!({
        "short_name": "camp-2026",
        "long_name": "Summer Camp 2026",
        "starts_at": "2026-07-01T10:00:00Z",
        "ends_at": "2026-07-03T18:00:00Z",
    });

    let (status, _headers, _body) =
        send(&router, post_json("/api/events", &reader, event.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _headers, body) =
        send(&router, post_json("/api/events", &admin, event.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["short_name"], "camp-2026");

    // Duplicate short name conflicts
    let (status, _headers, _body) = send(&router, post_json("/api/events", &admin, event)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // And the reader session can now see it
    let (status, _headers, body) = send(&router, get_request("/api/events", Some(&reader))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"][0]["short_name"], "camp-2026");
    assert_eq!(body["events"][0]["starts_at"], "2026-07-01T10:00:00+00:00");
}

#[tokio::test]
async fn test_event_validation() {
    let state = test_state().await;
    let admin = session_cookie(&state, "1@discord", &["event-admin"]).await;
    let router = build_router(state);

    // ends_at before starts_at
    let (status, _headers, body) = send(
        &router,
        post_json(
            "/api/events",
            &admin,
            serde_json::json!({
                "short_name": "bad",
                "long_name": "Bad Event",
                "starts_at": "2026-07-03T18:00:00Z",
                "ends_at": "2026-07-01T10:00:00Z",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "validation_error");

    // short_name with whitespace
    let (status, _headers, _body) = send(
        &router,
        post_json(
            "/api/events",
            &admin,
            serde_json::json!({
                "short_name": "not a slug",
                "long_name": "Bad Event",
                "starts_at": "2026-07-01T10:00:00Z",
                "ends_at": "2026-07-03T18:00:00Z",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_users_leaderboard_order_and_pagination() {
    let state = test_state().await;
    for (nick, score) in [("amy", 50i64), ("bob", 100), ("cal", 75)] {
        let mut user = User::new(nick, format!("{} Fullname", nick));
        user.achievement_score = score;
        state.deps.storage.put_user(&user).await.unwrap();
    }
    let cookie = session_cookie(&state, "42@discord", &[]).await;
    let router = build_router(state);

    let (status, _headers, body) = send(
        &router,
        get_request("/api/users?max_items=2", Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"][0]["nick_name"], "bob");
    assert_eq!(body["users"][1]["nick_name"], "cal");
    let next_token = body["next_token"].as_str().expect("expected another page").to_string();

    let (status, _headers, body) = send(
        &router,
        get_request(
            &format!("/api/users?max_items=2&next_token={}", next_token),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"][0]["nick_name"], "amy");
    assert_eq!(body["next_token"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_bad_next_token_is_rejected() {
    let state = test_state().await;
    let cookie = session_cookie(&state, "42@discord", &[]).await;
    let router = build_router(state);

    let (status, _headers, body) = send(
        &router,
        get_request("/api/events?next_token=forged", Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "bad_request");
}

#[tokio::test]
async fn test_login_redirects_to_provider() {
    let router = build_router(test_state().await);

    let (status, headers, _body) = send(&router, get_request("/api/auth/login", None)).await;
    assert_eq!(status, StatusCode::FOUND);
    let location = headers[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://discord.com/oauth2/authorize"));
    assert!(location.contains("client_id=abc"));
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let router = build_router(test_state().await);

    let (status, headers, _body) = send(&router, get_request("/api/auth/logout", None)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "/");
    assert_eq!(
        headers[header::SET_COOKIE],
        "yellows-auth=dead; Max-Age=0; Path=/"
    );
}

#[tokio::test]
async fn test_metrics_expose_denied_counter() {
    let router = build_router(test_state().await);

    // Trip the gate once so the counter exists
    let (status, _headers, _body) = send(&router, get_request("/api/events", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = router
        .clone()
        .oneshot(get_request("/metrics", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("yellows_auth_denied_total"));
}
