use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pastebox_core::{AuthError, PasteError};
use pastebox_crypto::TokenError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Paste(#[from] PasteError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Missing or unusable bearer token where one was presented.
    #[error("authentication required")]
    Unauthenticated,

    #[error("not allowed")]
    Forbidden,

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // Unknown, expired, private and malformed ids all look the same.
            ApiError::Paste(PasteError::NotFound | PasteError::InvalidIdentifier) => {
                (StatusCode::NOT_FOUND, "paste not found".to_string())
            }
            ApiError::Paste(PasteError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::Paste(
                PasteError::InvalidExpirationFormat(_)
                | PasteError::InvalidForm(_)
                | PasteError::ConstraintViolation(_),
            ) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Paste(PasteError::StorageUnavailable(e)) => {
                error!("Storage error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable".to_string())
            }
            ApiError::Paste(e @ (PasteError::IdentifierExhausted(_) | PasteError::Credential(_))) => {
                error!("Paste error: {}", e);
                internal()
            }

            ApiError::Auth(AuthError::InvalidRegistration(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Auth(AuthError::UsernameTaken | AuthError::EmailTaken) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            ApiError::Auth(
                AuthError::InvalidCredentials
                | AuthError::Token(TokenError::InvalidSignature | TokenError::Expired),
            ) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Auth(AuthError::StorageUnavailable(e)) => {
                error!("Storage error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable".to_string())
            }
            ApiError::Auth(
                e @ (AuthError::Credential(_)
                | AuthError::Token(TokenError::TtlOutOfRange | TokenError::Encode(_))),
            ) => {
                error!("Auth error: {}", e);
                internal()
            }

            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                internal()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn token_errors_split_between_client_and_server() {
        assert_eq!(
            status(AuthError::Token(TokenError::Expired)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AuthError::Token(TokenError::InvalidSignature)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AuthError::Token(TokenError::TtlOutOfRange)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn hidden_and_missing_pastes_look_alike() {
        assert_eq!(status(PasteError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(PasteError::InvalidIdentifier), StatusCode::NOT_FOUND);
        assert_eq!(status(PasteError::Unauthorized), StatusCode::UNAUTHORIZED);
    }
}
