use pastebox_crypto::{CredentialError, TokenError};
use pastebox_db::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasteError {
    #[error("invalid paste identifier")]
    InvalidIdentifier,

    #[error("invalid expiration format: {0:?}")]
    InvalidExpirationFormat(String),

    #[error("invalid paste: {0}")]
    InvalidForm(&'static str),

    #[error("no unique paste id after {0} attempts")]
    IdentifierExhausted(u32),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("paste not found")]
    NotFound,

    /// Wrong or missing paste password.
    #[error("wrong paste password")]
    Unauthorized,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),
}

impl From<StoreError> for PasteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation(msg) => Self::ConstraintViolation(msg),
            StoreError::DuplicateIdentifier(id) => {
                Self::ConstraintViolation(format!("duplicate paste id {}", id))
            }
            other => Self::StorageUnavailable(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid registration: {0}")]
    InvalidRegistration(&'static str),

    #[error("username is already taken")]
    UsernameTaken,

    #[error("email is already registered")]
    EmailTaken,

    /// Unknown user or wrong password; the two are not distinguished.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { field: "email" } => Self::EmailTaken,
            StoreError::Conflict { .. } => Self::UsernameTaken,
            other => Self::StorageUnavailable(other),
        }
    }
}
