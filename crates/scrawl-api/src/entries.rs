use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::warn;

use scrawl_types::api::{
    CreateEntryRequest, CreateEntryResponse, EntryResponse, UpdateEntryRequest, WallEntryResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::token::Claims;

/// The wall shows this many of the newest entries across all accounts.
pub const WALL_LIMIT: u32 = 50;
/// Per-entry cap, counted in characters rather than bytes.
pub const MAX_CONTENT_CHARS: usize = 1000;

/// Public feed, newest first. No token required; each entry carries its
/// author's username.
pub async fn wall(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.wall_entries(WALL_LIMIT)).await??;

    let entries: Vec<WallEntryResponse> = rows
        .into_iter()
        .map(|row| {
            let created_at = parse_timestamp(row.id, &row.created_at);
            WallEntryResponse {
                id: row.id,
                content: row.content,
                username: row.username,
                created_at,
            }
        })
        .collect();

    Ok(Json(entries))
}

/// The caller's own entries, newest first. Other accounts' entries are
/// never visible here regardless of what ids they carry.
pub async fn list_own(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let owner = claims.sub;
    let rows = tokio::task::spawn_blocking(move || db.db.entries_for_owner(owner)).await??;

    let entries: Vec<EntryResponse> = rows
        .into_iter()
        .map(|row| {
            let created_at = parse_timestamp(row.id, &row.created_at);
            EntryResponse {
                id: row.id,
                content: row.content,
                created_at,
            }
        })
        .collect();

    Ok(Json(entries))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_content(&req.content)?;

    let db = state.clone();
    let owner = claims.sub;
    let inserted =
        tokio::task::spawn_blocking(move || db.db.insert_entry(owner, &req.content)).await??;

    let Some(id) = inserted else {
        // The owning account was deleted after this token was issued.
        warn!("entry insert rejected: account {} no longer exists", owner);
        return Err(ApiError::Unauthenticated);
    };

    Ok((StatusCode::CREATED, Json(CreateEntryResponse { success: true, id })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_content(&req.content)?;

    let db = state.clone();
    let owner = claims.sub;
    let changed =
        tokio::task::spawn_blocking(move || db.db.update_entry(id, owner, &req.content)).await??;

    // Absent and not-yours are indistinguishable on purpose.
    if !changed {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let owner = claims.sub;
    let changed = tokio::task::spawn_blocking(move || db.db.delete_entry(id, owner)).await??;

    if !changed {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "success": true })))
}

fn validate_content(content: &str) -> Result<(), ApiError> {
    let len = content.chars().count();
    if len == 0 {
        return Err(ApiError::Invalid("content must not be empty"));
    }
    if len > MAX_CONTENT_CHARS {
        return Err(ApiError::Invalid("content exceeds 1000 characters"));
    }
    Ok(())
}

/// SQLite's `datetime('now')` writes "YYYY-MM-DD HH:MM:SS" with no zone
/// marker; treat it as UTC. RFC 3339 is accepted too for rows written by
/// other tooling.
fn parse_timestamp(id: i64, raw: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("corrupt created_at '{}' on entry {}: {}", raw, id, e);
            chrono::DateTime::default()
        })
}
