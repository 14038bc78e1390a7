use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::info;

use scrawl_db::Database;
use scrawl_db::models::AccountRow;

use crate::error::ApiError;

pub const MAX_USERNAME_CHARS: usize = 32;

/// Create a new non-privileged account with an Argon2id hash of the
/// password. Duplicate usernames are caught by the storage layer's UNIQUE
/// rejection, so two racing registrations cannot both win.
pub fn register(db: &Database, username: &str, password: &str) -> Result<AccountRow, ApiError> {
    validate_username(username)?;
    if password.is_empty() {
        return Err(ApiError::Invalid("password must not be empty"));
    }

    let hash = hash_password(password)?;
    let id = db
        .create_account(username, &hash, false)?
        .ok_or(ApiError::DuplicateUsername)?;

    Ok(AccountRow {
        id,
        username: username.to_string(),
        password: hash,
        privilege: false,
    })
}

/// Check a username/password pair. An absent account and a failed hash
/// comparison return the same error, so login responses cannot be used to
/// enumerate usernames.
pub fn verify(db: &Database, username: &str, password: &str) -> Result<AccountRow, ApiError> {
    let account = db
        .get_account_by_username(username)?
        .ok_or(ApiError::InvalidCredentials)?;

    let parsed = PasswordHash::new(&account.password)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("stored hash unreadable: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::InvalidCredentials)?;

    Ok(account)
}

/// Explicit idempotent bootstrap, run once during deployment. Creates the
/// first privileged account and returns true; returns false when one
/// already exists. Never promotes an existing non-privileged account.
pub fn provision_admin(db: &Database, username: &str, password: &str) -> Result<bool, ApiError> {
    if db.has_privileged_account()? {
        return Ok(false);
    }

    validate_username(username)?;
    if password.is_empty() {
        return Err(ApiError::Invalid("password must not be empty"));
    }

    let hash = hash_password(password)?;
    let id = db
        .create_account(username, &hash, true)?
        .ok_or(ApiError::DuplicateUsername)?;

    info!("provisioned administrator account '{}' (id {})", username, id);
    Ok(true)
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();
    Ok(hash)
}

fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_CHARS {
        return Err(ApiError::Invalid("username must be 1-32 characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_test_db() -> (Database, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        (db, dir)
    }

    #[test]
    fn register_then_verify_roundtrip() {
        let (db, _dir) = open_test_db();

        let created = register(&db, "bob", "pw1").unwrap();
        assert!(!created.privilege);

        let verified = verify(&db, "bob", "pw1").unwrap();
        assert_eq!(verified.id, created.id);
        assert!(!verified.privilege);
    }

    #[test]
    fn stored_secret_is_a_salted_hash() {
        let (db, _dir) = open_test_db();

        register(&db, "bob", "pw1").unwrap();
        let row = db.get_account_by_username("bob").unwrap().unwrap();
        assert_ne!(row.password, "pw1");
        assert!(row.password.starts_with("$argon2"));
    }

    #[test]
    fn wrong_password_and_unknown_user_fail_alike() {
        let (db, _dir) = open_test_db();
        register(&db, "alice", "right").unwrap();

        let wrong = verify(&db, "alice", "wrong").unwrap_err();
        let ghost = verify(&db, "ghost", "anything").unwrap_err();
        assert!(matches!(wrong, ApiError::InvalidCredentials));
        assert!(matches!(ghost, ApiError::InvalidCredentials));
    }

    #[test]
    fn second_registration_fails_and_leaves_the_first_intact() {
        let (db, _dir) = open_test_db();
        register(&db, "alice", "first").unwrap();
        let before = db.get_account_by_username("alice").unwrap().unwrap().password;

        let err = register(&db, "alice", "second").unwrap_err();
        assert!(matches!(err, ApiError::DuplicateUsername));

        let after = db.get_account_by_username("alice").unwrap().unwrap().password;
        assert_eq!(before, after);
        assert!(verify(&db, "alice", "first").is_ok());
    }

    #[test]
    fn registration_validates_bounds() {
        let (db, _dir) = open_test_db();

        assert!(matches!(register(&db, "", "pw"), Err(ApiError::Invalid(_))));
        let long = "x".repeat(MAX_USERNAME_CHARS + 1);
        assert!(matches!(register(&db, &long, "pw"), Err(ApiError::Invalid(_))));
        assert!(matches!(register(&db, "ok", ""), Err(ApiError::Invalid(_))));
    }

    #[test]
    fn registration_never_grants_privilege() {
        let (db, _dir) = open_test_db();
        assert!(!register(&db, "wannabe-admin", "pw").unwrap().privilege);
    }

    #[test]
    fn provisioning_is_idempotent() {
        let (db, _dir) = open_test_db();

        assert!(provision_admin(&db, "admin", "adminpass").unwrap());
        assert!(!provision_admin(&db, "admin", "adminpass").unwrap());

        let row = db.get_account_by_username("admin").unwrap().unwrap();
        assert!(row.privilege);
        assert!(verify(&db, "admin", "adminpass").unwrap().privilege);
    }

    #[test]
    fn provisioning_never_promotes_a_taken_username() {
        let (db, _dir) = open_test_db();
        register(&db, "admin", "sneaky").unwrap();

        let err = provision_admin(&db, "admin", "adminpass").unwrap_err();
        assert!(matches!(err, ApiError::DuplicateUsername));
        assert!(!db.get_account_by_username("admin").unwrap().unwrap().privilege);
    }
}
