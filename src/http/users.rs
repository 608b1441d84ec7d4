//! User leaderboard endpoint

use super::{AppError, AppState};
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub max_items: Option<usize>,
    pub next_token: Option<String>,
}

/// GET /api/users - leaderboard, highest achievement score first
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

    let page = state.deps.storage.list_users(limit, start_after).await?;

    let users: Vec<Value> = page
        .items
        .iter()
        .map(|user| {
            json!({
                "nick_name": user.nick_name,
                "full_name": user.full_name,
                "event_count": user.event_count,
                "achievement_score": user.achievement_score,
            })
        })
        .collect();
    let next_token = page
        .last_key
        .map(|key| state.cursor.encode(&key))
        .transpose()?;

    Ok(axum::Json(json!({
        "users": users,
        "next_token": next_token,
    })))
}
