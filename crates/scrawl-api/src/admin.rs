use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use scrawl_types::api::{AccountResponse, StatsResponse};

use crate::auth::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    100
}

/// Every account on the service, paged by id so a crawl sees each row
/// exactly once even while registrations continue.
pub async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let limit = query.limit.min(500);
    let offset = query.offset;
    let rows = tokio::task::spawn_blocking(move || db.db.list_accounts(limit, offset)).await??;

    let accounts: Vec<AccountResponse> = rows
        .into_iter()
        .map(|row| AccountResponse {
            id: row.id,
            username: row.username,
            privilege: row.privilege,
        })
        .collect();

    Ok(Json(accounts))
}

/// Remove an account and, through the foreign key cascade, every entry it
/// wrote. Deleting an absent id still succeeds; the end state is the same.
pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let removed = tokio::task::spawn_blocking(move || db.db.delete_account(id)).await??;

    if removed {
        info!("deleted account {}", id);
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let (users, entries) = tokio::task::spawn_blocking(move || {
        let users = db.db.count_accounts()?;
        let entries = db.db.count_entries()?;
        Ok::<_, anyhow::Error>((users, entries))
    })
    .await??;

    Ok(Json(StatsResponse { users, entries }))
}
