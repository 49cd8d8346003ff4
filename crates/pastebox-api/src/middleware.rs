use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use pastebox_types::api::Claims;
use pastebox_types::models::{Paste, Privacy};
use tracing::debug;

use crate::auth::AppState;
use crate::error::ApiError;

/// The identity behind a request. Anonymous when no token was presented.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub user_id: Option<i64>,
    pub username: Option<String>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn owns(&self, paste: &Paste) -> bool {
        paste.owner_id.is_some() && paste.owner_id == self.user_id
    }

    pub fn can_read(&self, paste: &Paste) -> bool {
        paste.privacy != Privacy::Private || self.owns(paste)
    }

    /// Anonymous pastes can be deleted by anyone holding the id.
    pub fn can_delete(&self, paste: &Paste) -> bool {
        paste.owner_id.is_none() || self.owns(paste)
    }
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: Some(claims.sub),
            username: Some(claims.username),
        }
    }
}

/// Resolve the bearer token, if any, into a [`Caller`] request extension.
/// A token that is present but malformed, forged or expired is rejected
/// rather than downgraded to anonymous.
pub async fn resolve_caller(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = if req.headers().contains_key(header::AUTHORIZATION) {
        let Authorization(bearer) = req
            .headers()
            .typed_get::<Authorization<Bearer>>()
            .ok_or(ApiError::Unauthenticated)?;

        let claims = state
            .users
            .validate(bearer.token(), state.token_secret.as_bytes())
            .inspect_err(|e| debug!("Rejected bearer token: {}", e))?;
        Caller::from(claims)
    } else {
        Caller::anonymous()
    };

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
