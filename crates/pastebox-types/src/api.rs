use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Privacy;

// -- JWT Claims --

/// Identity token claims, shared by the token service (issuing) and the
/// HTTP middleware (validating).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub repassword: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// -- Pastes --

fn default_expires() -> String {
    "never".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePasteRequest {
    #[serde(default)]
    pub title: String,
    pub body: String,
    #[serde(default = "default_expires")]
    pub expires: String,
    #[serde(default)]
    pub delete_after_read: bool,
    #[serde(default)]
    pub privacy: Privacy,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub syntax: String,
}

/// A paste as returned to clients. `id` is the base-62 form.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasteResponse {
    pub id: String,
    pub url: String,
    pub title: String,
    pub body: String,
    pub created: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub delete_after_read: bool,
    pub privacy: Privacy,
    pub has_password: bool,
    pub syntax: String,
    pub owner: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults() {
        let req: CreatePasteRequest = serde_json::from_str(r#"{"body":"hello"}"#).unwrap();
        assert_eq!(req.title, "");
        assert_eq!(req.expires, "never");
        assert!(!req.delete_after_read);
        assert_eq!(req.privacy, Privacy::Public);
        assert!(req.password.is_none());
    }

    #[test]
    fn create_request_rejects_unknown_fields() {
        let err = serde_json::from_str::<CreatePasteRequest>(r#"{"body":"x","id":1}"#);
        assert!(err.is_err());
    }

    #[test]
    fn create_request_uses_camel_case() {
        let req: CreatePasteRequest =
            serde_json::from_str(r#"{"body":"x","deleteAfterRead":true,"privacy":"unlisted"}"#)
                .unwrap();
        assert!(req.delete_after_read);
        assert_eq!(req.privacy, Privacy::Unlisted);
    }
}
