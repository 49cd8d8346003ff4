/// Database row types. These map directly to SQLite rows and are kept
/// distinct from the pastebox-types models so the schema can evolve on its own.
use chrono::{DateTime, Utc};
use pastebox_types::models::{OwnedPaste, Owner, Paste, Privacy, User};

use crate::StoreError;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: i64,
}

impl UserRow {
    pub fn into_user(self) -> Result<User, StoreError> {
        Ok(User {
            created_at: from_millis(self.created_at, "users.created_at")?,
            id: self.id,
            username: self.username,
            email: self.email,
        })
    }
}

/// Registration input for [`crate::UserStore::insert_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

pub struct PasteRow {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: i64,
    pub expires_at: Option<i64>,
    pub delete_after_read: bool,
    pub privacy: String,
    pub password: Option<String>,
    pub syntax: String,
    pub owner_id: Option<i64>,
    /// Filled by the LEFT JOIN on users; `None` for anonymous pastes.
    pub owner_username: Option<String>,
}

impl PasteRow {
    pub fn into_paste(self) -> Result<Paste, StoreError> {
        self.into_owned().map(|owned| owned.paste)
    }

    pub fn into_owned(self) -> Result<OwnedPaste, StoreError> {
        let privacy = Privacy::parse(&self.privacy).ok_or_else(|| {
            StoreError::Corrupt(format!("paste {}: unknown privacy {:?}", self.id, self.privacy))
        })?;
        let expires_at = self
            .expires_at
            .map(|ms| from_millis(ms, "pastes.expires_at"))
            .transpose()?;

        let owner = match (self.owner_id, self.owner_username) {
            (Some(id), Some(username)) => Some(Owner { id, username }),
            _ => None,
        };

        Ok(OwnedPaste {
            paste: Paste {
                id: self.id,
                title: self.title,
                body: self.body,
                created_at: from_millis(self.created_at, "pastes.created_at")?,
                expires_at,
                delete_after_read: self.delete_after_read,
                privacy,
                password_hash: self.password.filter(|h| !h.is_empty()),
                syntax: self.syntax,
                owner_id: self.owner_id,
            },
            owner,
        })
    }
}

pub(crate) fn from_millis(ms: i64, column: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Corrupt(format!("{} out of range: {}", column, ms)))
}
