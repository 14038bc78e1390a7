//! One-shot administrator provisioning. Run once against a fresh database;
//! running it again is a no-op once a privileged account exists.

use std::path::PathBuf;

use tracing::{info, warn};

use scrawl_api::error::ApiError;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = std::env::var("SCRAWL_DB_PATH").unwrap_or_else(|_| "scrawl.db".into());
    let username = std::env::var("SCRAWL_ADMIN_USERNAME").unwrap_or_else(|_| "admin".into());
    let password = std::env::var("SCRAWL_ADMIN_PASSWORD").unwrap_or_else(|_| "adminpass".into());
    if password == "adminpass" {
        warn!("SCRAWL_ADMIN_PASSWORD is not set; using the default password");
    }

    let db = scrawl_db::Database::open(&PathBuf::from(&db_path))?;

    match scrawl_api::credentials::provision_admin(&db, &username, &password) {
        Ok(true) => info!("administrator '{}' provisioned", username),
        Ok(false) => info!("an administrator already exists; nothing to do"),
        Err(ApiError::DuplicateUsername) => {
            anyhow::bail!("username '{}' is already taken by a regular account", username)
        }
        Err(ApiError::Storage(cause)) => return Err(cause.context("provisioning failed")),
        Err(e) => anyhow::bail!("provisioning failed: {e}"),
    }

    Ok(())
}
