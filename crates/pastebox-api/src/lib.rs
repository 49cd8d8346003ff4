pub mod auth;
pub mod error;
pub mod middleware;
pub mod pastes;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tracing::error;

use crate::auth::AppState;
use crate::error::ApiError;

/// All HTTP routes. Paste routes resolve the caller from the bearer token
/// first; the auth and health routes never look at it.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(health));

    let paste_routes = Router::new()
        .route("/paste", post(pastes::create_paste))
        .route(
            "/paste/{id}",
            get(pastes::get_paste).delete(pastes::delete_paste),
        )
        .route("/pastes", get(pastes::list_pastes))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_caller,
        ));

    Router::new()
        .merge(public_routes)
        .merge(paste_routes)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Run store and Argon2 work off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("Blocking task failed: {}", e);
        ApiError::Internal(e.to_string())
    })?
}
