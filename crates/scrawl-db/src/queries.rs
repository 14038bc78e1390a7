use crate::Database;
use crate::models::{AccountRow, EntryRow, WallEntryRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Accounts --

    /// Insert a new account. Returns the new row id, or `None` when the
    /// username is already taken — the UNIQUE constraint is the sole
    /// duplicate check, so two racing registrations cannot both win.
    pub fn create_account(
        &self,
        username: &str,
        password_hash: &str,
        privilege: bool,
    ) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (username, password, privilege) VALUES (?1, ?2, ?3)",
                (username, password_hash, privilege),
            ) {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_constraint_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_account_by_username(&self, username: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account_by_username(conn, username))
    }

    pub fn get_account_by_id(&self, id: i64) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account_by_id(conn, id))
    }

    /// Provisioning guard: is there any account with the admin flag set?
    pub fn has_privileged_account(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE privilege = 1",
                [],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Accounts ordered by id so limit/offset windows are stable.
    pub fn list_accounts(&self, limit: u32, offset: u32) -> Result<Vec<AccountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, privilege FROM users
                 ORDER BY id LIMIT ?1 OFFSET ?2",
            )?;

            let rows = stmt
                .query_map((limit, offset), map_account_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Delete by id; owned entries go with the account via the foreign-key
    /// cascade. Returns whether a row was actually removed.
    pub fn delete_account(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    pub fn count_accounts(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    // -- Entries --

    /// Insert an entry for `owner_id`. Returns the new row id, or `None`
    /// when the owner no longer exists (foreign-key rejection for a stale
    /// session whose account was deleted).
    pub fn insert_entry(&self, owner_id: i64, content: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO entries (content, user_id) VALUES (?1, ?2)",
                (content, owner_id),
            ) {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_constraint_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn entries_for_owner(&self, owner_id: i64) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, content, created_at FROM entries
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC",
            )?;

            let rows = stmt
                .query_map([owner_id], |row| {
                    Ok(EntryRow {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// The public wall: newest entries across all owners, joined with the
    /// author's username. Timestamps have second precision, so id breaks
    /// ties to keep the order strict.
    pub fn wall_entries(&self, limit: u32) -> Result<Vec<WallEntryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT e.id, e.content, e.created_at, u.username
                 FROM entries e
                 JOIN users u ON e.user_id = u.id
                 ORDER BY e.created_at DESC, e.id DESC
                 LIMIT ?1",
            )?;

            let rows = stmt
                .query_map([limit], |row| {
                    Ok(WallEntryRow {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        created_at: row.get(2)?,
                        username: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Update scoped to the owner: a mismatch on either id or owner changes
    /// zero rows, indistinguishable from a missing entry.
    pub fn update_entry(&self, id: i64, owner_id: i64, content: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE entries SET content = ?1 WHERE id = ?2 AND user_id = ?3",
                (content, id, owner_id),
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_entry(&self, id: i64, owner_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM entries WHERE id = ?1 AND user_id = ?2",
                (id, owner_id),
            )?;
            Ok(changed > 0)
        })
    }

    pub fn count_entries(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
            Ok(count)
        })
    }
}

fn query_account_by_username(conn: &Connection, username: &str) -> Result<Option<AccountRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password, privilege FROM users WHERE username = ?1",
    )?;

    let row = stmt.query_row([username], map_account_row).optional()?;
    Ok(row)
}

fn query_account_by_id(conn: &Connection, id: i64) -> Result<Option<AccountRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, privilege FROM users WHERE id = ?1")?;

    let row = stmt.query_row([id], map_account_row).optional()?;
    Ok(row)
}

fn map_account_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        privilege: row.get(3)?,
    })
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
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
    fn duplicate_username_is_rejected_and_first_hash_survives() {
        let (db, _dir) = open_test_db();

        let id = db.create_account("alice", "hash-one", false).unwrap();
        assert!(id.is_some());

        let second = db.create_account("alice", "hash-two", false).unwrap();
        assert!(second.is_none());

        let row = db.get_account_by_username("alice").unwrap().unwrap();
        assert_eq!(row.password, "hash-one");
        assert!(!row.privilege);
    }

    #[test]
    fn username_lookup_is_case_sensitive() {
        let (db, _dir) = open_test_db();

        db.create_account("Alice", "h", false).unwrap();
        assert!(db.get_account_by_username("alice").unwrap().is_none());
        assert!(db.get_account_by_username("Alice").unwrap().is_some());
    }

    #[test]
    fn wall_caps_at_limit_and_orders_newest_first() {
        let (db, _dir) = open_test_db();

        let owner = db.create_account("poster", "h", false).unwrap().unwrap();
        let mut last_id = 0;
        for i in 1..=55 {
            last_id = db
                .insert_entry(owner, &format!("note {i}"))
                .unwrap()
                .unwrap();
        }

        let wall = db.wall_entries(50).unwrap();
        assert_eq!(wall.len(), 50);
        assert_eq!(wall[0].id, last_id);
        assert_eq!(wall[0].username, "poster");
        assert!(wall.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[test]
    fn update_and_delete_are_scoped_to_owner() {
        let (db, _dir) = open_test_db();

        let alice = db.create_account("alice", "h", false).unwrap().unwrap();
        let bob = db.create_account("bob", "h", false).unwrap().unwrap();
        let entry = db.insert_entry(alice, "mine").unwrap().unwrap();

        assert!(!db.update_entry(entry, bob, "stolen").unwrap());
        assert!(!db.delete_entry(entry, bob).unwrap());

        let own = db.entries_for_owner(alice).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].content, "mine");

        assert!(db.update_entry(entry, alice, "edited").unwrap());
        assert_eq!(db.entries_for_owner(alice).unwrap()[0].content, "edited");
        assert!(db.delete_entry(entry, alice).unwrap());
        assert!(db.entries_for_owner(alice).unwrap().is_empty());
    }

    #[test]
    fn missing_entry_changes_nothing() {
        let (db, _dir) = open_test_db();

        let alice = db.create_account("alice", "h", false).unwrap().unwrap();
        assert!(!db.update_entry(12345, alice, "x").unwrap());
        assert!(!db.delete_entry(12345, alice).unwrap());
    }

    #[test]
    fn deleting_an_account_cascades_to_its_entries() {
        let (db, _dir) = open_test_db();

        let alice = db.create_account("alice", "h", false).unwrap().unwrap();
        let bob = db.create_account("bob", "h", false).unwrap().unwrap();
        for i in 0..3 {
            db.insert_entry(alice, &format!("a{i}")).unwrap().unwrap();
        }
        db.insert_entry(bob, "b0").unwrap().unwrap();
        assert_eq!(db.count_entries().unwrap(), 4);

        assert!(db.delete_account(alice).unwrap());
        assert_eq!(db.count_accounts().unwrap(), 1);
        assert_eq!(db.count_entries().unwrap(), 1);
        assert_eq!(db.wall_entries(50).unwrap()[0].username, "bob");
    }

    #[test]
    fn deleting_a_missing_account_changes_nothing() {
        let (db, _dir) = open_test_db();
        assert!(!db.delete_account(404).unwrap());
    }

    #[test]
    fn entry_insert_requires_a_live_owner() {
        let (db, _dir) = open_test_db();
        assert!(db.insert_entry(999, "orphan").unwrap().is_none());
    }

    #[test]
    fn account_listing_pages_by_id() {
        let (db, _dir) = open_test_db();

        for name in ["a", "b", "c", "d", "e"] {
            db.create_account(name, "h", false).unwrap().unwrap();
        }

        let first = db.list_accounts(2, 0).unwrap();
        assert_eq!(
            first.iter().map(|a| a.username.as_str()).collect::<Vec<_>>(),
            ["a", "b"]
        );

        let second = db.list_accounts(2, 2).unwrap();
        assert_eq!(
            second.iter().map(|a| a.username.as_str()).collect::<Vec<_>>(),
            ["c", "d"]
        );

        let tail = db.list_accounts(10, 4).unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].username, "e");
    }

    #[test]
    fn privileged_account_guard() {
        let (db, _dir) = open_test_db();

        assert!(!db.has_privileged_account().unwrap());
        db.create_account("user", "h", false).unwrap().unwrap();
        assert!(!db.has_privileged_account().unwrap());
        db.create_account("root", "h", true).unwrap().unwrap();
        assert!(db.has_privileged_account().unwrap());
    }
}
