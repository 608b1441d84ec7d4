//! Event endpoints

use super::{AppError, AppState};
use crate::auth::AuthorizedPrincipal;
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::model::Event;
use crate::YellowsError;
use axum::Extension;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub max_items: Option<usize>,
    pub next_token: Option<String>,
}

/// GET /api/events - paginated listing in start-time order
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<axum::Json<Value>, AppError> {
    let limit = query
        .max_items
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let start_after = query
        .next_token
        .as_deref()
        .map(|token| state.cursor.decode(token))
        .transpose()?;

    let page = state.deps.storage.list_events(limit, start_after).await?;

    let events: Vec<Value> = page
        .items
        .iter()
        .map(|event| {
            json!({
                "short_name": event.short_name,
                "long_name": event.long_name,
                "attendee_count": event.attendee_count,
                "yellow_count": event.yellow_count,
                "starts_at": event.starts_at.to_rfc3339(),
                "ends_at": event.ends_at.to_rfc3339(),
            })
        })
        .collect();
    let next_token = page
        .last_key
        .map(|key| state.cursor.encode(&key))
        .transpose()?;

    Ok(axum::Json(json!({
        "events": events,
        "next_token": next_token,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub short_name: String,
    pub long_name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub venue_id: Option<String>,
}

/// POST /api/events - create an event (requires event-admin)
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthorizedPrincipal>,
    axum::Json(body): axum::Json<CreateEventRequest>,
) -> Result<(StatusCode, axum::Json<Event>), AppError> {
    if body.short_name.is_empty() || body.short_name.contains(char::is_whitespace) {
        return Err(YellowsError::validation("short_name must be a non-empty slug").into());
    }
    if body.ends_at <= body.starts_at {
        return Err(YellowsError::validation("ends_at must be after starts_at").into());
    }

    let mut event = Event::new(body.short_name, body.long_name, body.starts_at, body.ends_at);
    event.venue_id = body.venue_id;

    state.deps.storage.create_event(&event).await?;
    tracing::info!(
        user = %principal.login.login_id,
        event = %event.short_name,
        "event created"
    );

    Ok((StatusCode::CREATED, axum::Json(event)))
}
