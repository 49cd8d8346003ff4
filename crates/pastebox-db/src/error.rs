use rusqlite::ErrorCode;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A paste with this id already exists. Callers retry with a fresh id.
    #[error("paste id {0} already exists")]
    DuplicateIdentifier(i64),

    /// A foreign key or CHECK constraint rejected the row.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A UNIQUE column already holds this value.
    #[error("{field} is already taken")]
    Conflict { field: &'static str },

    /// A stored row could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Extended SQLite result code of a constraint failure, if `err` is one.
pub(crate) fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}

/// Classify a failed paste INSERT.
pub(crate) fn paste_insert_error(id: i64, err: rusqlite::Error) -> StoreError {
    match constraint_code(&err) {
        Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => StoreError::DuplicateIdentifier(id),
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => StoreError::DuplicateIdentifier(id),
        Some(_) => StoreError::ConstraintViolation(err.to_string()),
        None => StoreError::Database(err),
    }
}

/// Classify a failed user INSERT.
pub(crate) fn user_insert_error(err: rusqlite::Error) -> StoreError {
    match constraint_code(&err) {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => {
            // Message reads "UNIQUE constraint failed: users.email"
            if err.to_string().contains("users.email") {
                StoreError::Conflict { field: "email" }
            } else {
                StoreError::Conflict { field: "username" }
            }
        }
        Some(_) => StoreError::ConstraintViolation(err.to_string()),
        None => StoreError::Database(err),
    }
}
