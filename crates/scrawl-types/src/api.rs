use serde::{Deserialize, Serialize};

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub token: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub username: String,
    pub privilege: bool,
}

// -- Entries --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEntryRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreateEntryResponse {
    pub success: bool,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateEntryRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: i64,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A wall item is an entry joined with its author's display name.
#[derive(Debug, Serialize)]
pub struct WallEntryResponse {
    pub id: i64,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub username: String,
}

// -- Admin --

/// Account listing row. The stored password hash never leaves scrawl-db.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub username: String,
    pub privilege: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub users: i64,
    pub entries: i64,
}
