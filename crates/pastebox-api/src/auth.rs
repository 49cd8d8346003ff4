use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use pastebox_core::{PasteService, Registration, UserService};
use pastebox_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::run_blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub pastes: PasteService,
    pub users: UserService,
    pub token_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, issued) = run_blocking(move || {
        let user = state.users.register(Registration {
            username: req.username,
            email: req.email,
            password: req.password,
            repassword: req.repassword,
        })?;
        let issued = state.users.issue(&user, state.token_secret.as_bytes())?;
        Ok((user, issued))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            token: issued.token,
            expires_at: issued.expires_at,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, issued) = run_blocking(move || {
        Ok(state
            .users
            .authenticate(&req.username, &req.password, state.token_secret.as_bytes())?)
    })
    .await?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}
