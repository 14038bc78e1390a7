//! Database row types — these map directly to SQLite rows.
//! Distinct from scrawl-types API models to keep the DB layer independent.

#[derive(Debug)]
pub struct AccountRow {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string, never the clear password.
    pub password: String,
    pub privilege: bool,
}

pub struct EntryRow {
    pub id: i64,
    pub content: String,
    pub created_at: String,
}

/// Wall rows carry the author's username from the join against users.
pub struct WallEntryRow {
    pub id: i64,
    pub content: String,
    pub created_at: String,
    pub username: String,
}
