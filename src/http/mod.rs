//! HTTP server for Yellows
//!
//! REST API over the auth core and storage: the /api/auth login flow
//! plus scope-gated event and user endpoints.

pub mod auth;
pub mod cursor;
pub mod events;
pub mod users;

use crate::auth::require_scopes;
use crate::config::Config;
use crate::core::Dependencies;
use crate::{Result, StorageError, YellowsError};
use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use self::cursor::CursorCodec;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::{
    LatencyUnit,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub deps: Dependencies,
    pub cursor: Arc<CursorCodec>,
}

/// Error type for HTTP handlers
///
/// Auth failures collapse to one generic unauthorized body no matter
/// which internal check tripped; detail only reaches the logs.
#[derive(Debug)]
pub struct AppError(YellowsError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self.0 {
            YellowsError::Auth(e) => {
                tracing::warn!(reason = e.reason(), "request unauthorized");
                (
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "unauthorized".to_string(),
                )
            }
            YellowsError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            YellowsError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            YellowsError::Storage(StorageError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{} not found: {}", entity, id),
            ),
            YellowsError::Storage(StorageError::AlreadyExists { entity, id }) => (
                StatusCode::CONFLICT,
                "conflict",
                format!("{} already exists: {}", entity, id),
            ),
            YellowsError::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "An internal storage error occurred".to_string(),
                )
            }
            YellowsError::Network(e) => {
                tracing::error!("Network error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "network_error",
                    "A network error occurred".to_string(),
                )
            }
            _ => {
                tracing::error!("Internal error: {:?}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "status": status.as_u16(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<YellowsError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let http_config = config.http();
    let dependencies = crate::core::create_dependencies(&config).await?;

    let state = AppState {
        cursor: Arc::new(CursorCodec::new(&config.pagination.signing_key)),
        deps: dependencies,
    };

    let app = build_router(state);

    let addr = format!("{}:{}", http_config.host, http_config.port);
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| YellowsError::config(format!("Invalid address {}: {}", addr, e)))?;

    tracing::info!("Starting HTTP server on {}", socket_addr);

    let listener = tokio::net::TcpListener::bind(socket_addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| YellowsError::config(format!("Server error: {}", e)))?;

    Ok(())
}

/// Build the router with all endpoints
pub fn build_router(state: AppState) -> Router {
    let gate = state.deps.gate.clone();
    let domain = state.deps.config.domain_name.clone();

    // Session required, no particular capability
    let session_routes = Router::new()
        .route("/api/events", get(events::list))
        .route("/api/users", get(users::list))
        .route_layer(axum::middleware::from_fn(require_scopes(gate.clone(), &[])));

    // Capability-gated routes
    let admin_routes = Router::new()
        .route("/api/events", post(events::create))
        .route_layer(axum::middleware::from_fn(require_scopes(
            gate.clone(),
            &["event-admin"],
        )));

    Router::new()
        .route("/api/auth/login", get(auth::login_get))
        .route("/api/auth/login-finish", get(auth::login_finish_get))
        .route("/api/auth/logout", get(auth::logout_get))
        .merge(session_routes)
        .merge(admin_routes)
        .route("/healthz", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new())
                        .on_response(
                            DefaultOnResponse::new()
                                .level(tracing::Level::INFO)
                                .latency_unit(LatencyUnit::Micros),
                        ),
                )
                .layer(axum::middleware::from_fn(track_metrics))
                .layer({
                    // Browser clients live on the service's own domain
                    let origin = format!("https://{}", domain)
                        .parse::<axum::http::HeaderValue>()
                        .expect("valid header value");
                    CorsLayer::new()
                        .allow_origin([origin])
                        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                        .allow_headers([axum::http::header::CONTENT_TYPE])
                        .allow_credentials(true)
                }),
        )
}

/// Request duration metrics keyed by matched route
async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let handler = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().to_string();

    let response = next.run(req).await;

    crate::telemetry::observe_request(&handler, &method, start.elapsed().as_secs_f64());
    response
}

async fn health_handler() -> axum::Json<Value> {
    axum::Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn metrics_handler() -> std::result::Result<(StatusCode, String), AppError> {
    let metrics = crate::telemetry::get_metrics()?;
    Ok((StatusCode::OK, metrics))
}

#[cfg(test)]
mod http_test;
