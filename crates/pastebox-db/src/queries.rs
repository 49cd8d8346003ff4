use chrono::{DateTime, Utc};
use pastebox_types::models::{OwnedPaste, Paste, User};
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::Database;
use crate::StoreError;
use crate::error::{paste_insert_error, user_insert_error};
use crate::models::{NewUser, PasteRow, UserRow};

const PASTE_SELECT: &str = "
    SELECT p.id, p.title, p.body, p.created_at, p.expires_at, p.delete_after_read,
           p.privacy, p.password, p.syntax, p.owner_id, u.username
    FROM pastes p
    LEFT JOIN users u ON p.owner_id = u.id";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let id = self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.username,
                    user.email,
                    user.password_hash,
                    user.created_at.timestamp_millis()
                ],
            )
            .map_err(user_insert_error)?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!("Created user {} ({})", id, user.username);
        Ok(User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user(conn, "username", &username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user(conn, "email", &email))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user(conn, "id", &id))
    }

    // -- Pastes --

    pub fn insert_paste(&self, paste: &Paste) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO pastes (id, title, body, created_at, expires_at, delete_after_read,
                                     privacy, password, syntax, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    paste.id,
                    paste.title,
                    paste.body,
                    paste.created_at.timestamp_millis(),
                    paste.expires_at.map(|at| at.timestamp_millis()),
                    paste.delete_after_read,
                    paste.privacy.as_str(),
                    paste.password_hash,
                    paste.syntax,
                    paste.owner_id,
                ],
            )
            .map_err(|e| paste_insert_error(paste.id, e))?;
            Ok(())
        })
    }

    /// Fetch a paste and its owner's username in one query. Pastes whose
    /// expiry is at or before `now` are reported as absent even if the row
    /// has not been purged yet.
    pub fn get_paste(&self, id: i64, now: DateTime<Utc>) -> Result<Option<OwnedPaste>, StoreError> {
        let row = self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE p.id = ?1 AND (p.expires_at IS NULL OR p.expires_at > ?2)",
                PASTE_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt
                .query_row(params![id, now.timestamp_millis()], paste_row)
                .optional()?;
            Ok(row)
        })?;

        row.map(PasteRow::into_owned).transpose()
    }

    /// Returns `true` if a row was removed.
    pub fn delete_paste(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self.with_conn_mut(|conn| {
            Ok(conn.execute("DELETE FROM pastes WHERE id = ?1", [id])?)
        })?;
        Ok(removed > 0)
    }

    /// Live pastes owned by `owner`, newest first. `None` lists only
    /// anonymous pastes.
    pub fn list_pastes(
        &self,
        owner: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Paste>, StoreError> {
        let rows = self.with_conn(|conn| {
            let live = "(p.expires_at IS NULL OR p.expires_at > ?1)";
            let rows = match owner {
                Some(owner_id) => {
                    let sql = format!(
                        "{} WHERE p.owner_id = ?2 AND {} ORDER BY p.created_at DESC, p.id",
                        PASTE_SELECT, live
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map(params![now.timestamp_millis(), owner_id], paste_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                }
                None => {
                    let sql = format!(
                        "{} WHERE p.owner_id IS NULL AND {} ORDER BY p.created_at DESC, p.id",
                        PASTE_SELECT, live
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map(params![now.timestamp_millis()], paste_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                }
            };
            Ok(rows)
        })?;

        rows.into_iter().map(PasteRow::into_paste).collect()
    }

    /// Physically remove every paste that expired at or before `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.with_conn_mut(|conn| {
            Ok(conn.execute(
                "DELETE FROM pastes WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                [now.timestamp_millis()],
            )?)
        })
    }
}

fn query_user(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<UserRow>, StoreError> {
    let sql = format!(
        "SELECT id, username, email, password, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn paste_row(row: &Row<'_>) -> rusqlite::Result<PasteRow> {
    Ok(PasteRow {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        created_at: row.get(3)?,
        expires_at: row.get(4)?,
        delete_after_read: row.get(5)?,
        privacy: row.get(6)?,
        password: row.get(7)?,
        syntax: row.get(8)?,
        owner_id: row.get(9)?,
        owner_username: row.get(10)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, StoreError>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, StoreError> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pastebox_types::models::Privacy;

    fn paste(id: i64, owner_id: Option<i64>) -> Paste {
        Paste {
            id,
            title: format!("paste {}", id),
            body: "body".into(),
            created_at: Utc::now(),
            expires_at: None,
            delete_after_read: false,
            privacy: Privacy::Public,
            password_hash: None,
            syntax: "rust".into(),
            owner_id,
        }
    }

    fn user(db: &Database, name: &str) -> User {
        db.create_user(&NewUser {
            username: name.into(),
            email: format!("{}@example.com", name),
            password_hash: "$argon2id$hash".into(),
            created_at: Utc::now(),
        })
        .unwrap()
    }

    #[test]
    fn insert_and_fetch_with_owner() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");

        db.insert_paste(&paste(1, Some(alice.id))).unwrap();
        db.insert_paste(&paste(2, None)).unwrap();

        let owned = db.get_paste(1, Utc::now()).unwrap().unwrap();
        assert_eq!(owned.paste.id, 1);
        assert_eq!(owned.paste.syntax, "rust");
        let owner = owned.owner.unwrap();
        assert_eq!(owner.id, alice.id);
        assert_eq!(owner.username, "alice");

        let anon = db.get_paste(2, Utc::now()).unwrap().unwrap();
        assert!(anon.owner.is_none());
        assert!(anon.paste.owner_id.is_none());
    }

    #[test]
    fn duplicate_id_is_distinguishable() {
        let db = Database::open_in_memory().unwrap();
        db.insert_paste(&paste(42, None)).unwrap();

        let err = db.insert_paste(&paste(42, None)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateIdentifier(42)), "got {:?}", err);
    }

    #[test]
    fn unknown_owner_is_a_constraint_violation() {
        let db = Database::open_in_memory().unwrap();
        let err = db.insert_paste(&paste(1, Some(999))).unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)), "got {:?}", err);
    }

    #[test]
    fn private_paste_requires_owner() {
        let db = Database::open_in_memory().unwrap();
        let mut p = paste(1, None);
        p.privacy = Privacy::Private;
        let err = db.insert_paste(&p).unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)), "got {:?}", err);
    }

    #[test]
    fn expired_paste_is_not_found_before_purge() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let mut p = paste(5, None);
        p.created_at = now - TimeDelta::minutes(10);
        p.expires_at = Some(now - TimeDelta::minutes(1));
        db.insert_paste(&p).unwrap();

        assert!(db.get_paste(5, now).unwrap().is_none());
        assert!(db.get_paste(5, now - TimeDelta::minutes(5)).unwrap().is_some());
        assert!(db.list_pastes(None, now).unwrap().is_empty());

        assert_eq!(db.purge_expired(now).unwrap(), 1);
        assert!(db.get_paste(5, now - TimeDelta::minutes(5)).unwrap().is_none());
    }

    #[test]
    fn delete_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.insert_paste(&paste(3, None)).unwrap();

        assert!(db.delete_paste(3).unwrap());
        assert!(!db.delete_paste(3).unwrap());
        assert!(!db.delete_paste(12345).unwrap());
    }

    #[test]
    fn list_separates_owners_from_anonymous() {
        let db = Database::open_in_memory().unwrap();
        let alice = user(&db, "alice");
        let bob = user(&db, "bob");

        db.insert_paste(&paste(1, Some(alice.id))).unwrap();
        db.insert_paste(&paste(2, Some(alice.id))).unwrap();
        db.insert_paste(&paste(3, Some(bob.id))).unwrap();
        db.insert_paste(&paste(4, None)).unwrap();

        let now = Utc::now();
        let mut alices: Vec<i64> = db
            .list_pastes(Some(alice.id), now)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        alices.sort();
        assert_eq!(alices, vec![1, 2]);

        let anon: Vec<i64> = db.list_pastes(None, now).unwrap().iter().map(|p| p.id).collect();
        assert_eq!(anon, vec![4]);
    }

    #[test]
    fn password_hash_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let mut p = paste(9, None);
        p.password_hash = Some("$argon2id$v=19$stuff".into());
        db.insert_paste(&p).unwrap();

        let got = db.get_paste(9, Utc::now()).unwrap().unwrap();
        assert_eq!(got.paste.password_hash.as_deref(), Some("$argon2id$v=19$stuff"));
    }

    #[test]
    fn user_uniqueness_is_enforced() {
        let db = Database::open_in_memory().unwrap();
        user(&db, "carol");

        let dup_name = db
            .create_user(&NewUser {
                username: "carol".into(),
                email: "other@example.com".into(),
                password_hash: "h".into(),
                created_at: Utc::now(),
            })
            .unwrap_err();
        assert!(matches!(dup_name, StoreError::Conflict { field: "username" }));

        let dup_email = db
            .create_user(&NewUser {
                username: "carol2".into(),
                email: "carol@example.com".into(),
                password_hash: "h".into(),
                created_at: Utc::now(),
            })
            .unwrap_err();
        assert!(matches!(dup_email, StoreError::Conflict { field: "email" }));
    }

    #[test]
    fn user_lookups() {
        let db = Database::open_in_memory().unwrap();
        let dave = user(&db, "dave");

        assert_eq!(db.get_user_by_username("dave").unwrap().unwrap().id, dave.id);
        assert_eq!(
            db.get_user_by_email("dave@example.com").unwrap().unwrap().username,
            "dave"
        );
        let row = db.get_user_by_id(dave.id).unwrap().unwrap();
        assert_eq!(row.into_user().unwrap(), truncated_to_ms(&dave));
        assert!(db.get_user_by_username("Dave").unwrap().is_none());
    }

    // Stored timestamps are millisecond precision.
    fn truncated_to_ms(u: &User) -> User {
        User {
            created_at: DateTime::from_timestamp_millis(u.created_at.timestamp_millis()).unwrap(),
            ..u.clone()
        }
    }
}
