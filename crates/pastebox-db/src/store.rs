//! Repository seams consumed by the lifecycle and user services.

use chrono::{DateTime, Utc};
use pastebox_types::models::{OwnedPaste, Paste, User};

use crate::models::{NewUser, UserRow};
use crate::{Database, StoreError};

/// Persistent paste repository. Implementations must be safe to call from
/// many threads at once and must never expose a partially written paste.
pub trait PasteStore: Send + Sync {
    /// Fails with [`StoreError::DuplicateIdentifier`] when the id is taken
    /// and [`StoreError::ConstraintViolation`] when the owner does not exist.
    fn insert_paste(&self, paste: &Paste) -> Result<(), StoreError>;

    /// Expired pastes are `None`, whether or not they were purged yet.
    fn fetch_paste(&self, id: i64, now: DateTime<Utc>) -> Result<Option<OwnedPaste>, StoreError>;

    /// Idempotent. Returns whether a row was removed.
    fn delete_paste(&self, id: i64) -> Result<bool, StoreError>;

    /// `None` lists anonymous pastes only, never every paste.
    fn list_pastes(&self, owner: Option<i64>, now: DateTime<Utc>)
        -> Result<Vec<Paste>, StoreError>;

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

#[derive(Debug, Clone, Copy)]
pub enum UserLookup<'a> {
    Id(i64),
    Username(&'a str),
    Email(&'a str),
}

pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the username or email exists.
    fn insert_user(&self, user: &NewUser) -> Result<User, StoreError>;

    fn find_user(&self, lookup: UserLookup<'_>) -> Result<Option<UserRow>, StoreError>;
}

impl PasteStore for Database {
    fn insert_paste(&self, paste: &Paste) -> Result<(), StoreError> {
        Database::insert_paste(self, paste)
    }

    fn fetch_paste(&self, id: i64, now: DateTime<Utc>) -> Result<Option<OwnedPaste>, StoreError> {
        self.get_paste(id, now)
    }

    fn delete_paste(&self, id: i64) -> Result<bool, StoreError> {
        Database::delete_paste(self, id)
    }

    fn list_pastes(
        &self,
        owner: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Paste>, StoreError> {
        Database::list_pastes(self, owner, now)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        Database::purge_expired(self, now)
    }
}

impl UserStore for Database {
    fn insert_user(&self, user: &NewUser) -> Result<User, StoreError> {
        self.create_user(user)
    }

    fn find_user(&self, lookup: UserLookup<'_>) -> Result<Option<UserRow>, StoreError> {
        match lookup {
            UserLookup::Id(id) => self.get_user_by_id(id),
            UserLookup::Username(username) => self.get_user_by_username(username),
            UserLookup::Email(email) => self.get_user_by_email(email),
        }
    }
}
