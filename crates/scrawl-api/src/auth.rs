use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use scrawl_db::Database;
use scrawl_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::credentials;
use crate::error::ApiError;
use crate::token;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

/// Create an account and hand back a session token right away, so a fresh
/// registration can start posting without a second round-trip.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let account = tokio::task::spawn_blocking(move || {
        credentials::register(&db.db, &req.username, &req.password)
    })
    .await??;

    let token = token::issue(
        &state.jwt_secret,
        account.id,
        &account.username,
        account.privilege,
    )?;

    info!("registered account '{}' (id {})", account.username, account.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            token,
            username: account.username,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let account = tokio::task::spawn_blocking(move || {
        credentials::verify(&db.db, &req.username, &req.password)
    })
    .await??;

    let token = token::issue(
        &state.jwt_secret,
        account.id,
        &account.username,
        account.privilege,
    )?;

    Ok(Json(LoginResponse {
        success: true,
        token,
        username: account.username,
        privilege: account.privilege,
    }))
}
