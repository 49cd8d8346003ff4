mod cleanup;
mod config;

use std::sync::Arc;

use axum::http::{
    HeaderName, Method,
    header::{AUTHORIZATION, CONTENT_TYPE, LOCATION},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use pastebox_api::auth::{AppState, AppStateInner};
use pastebox_api::pastes::PASSWORD_HEADER;
use pastebox_core::{PasteService, UserService};
use pastebox_crypto::TokenService;
use pastebox_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pastebox=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(Database::open(&config.db_path)?);
    info!("Opened database at {}", config.db_path.display());

    let state: AppState = Arc::new(AppStateInner {
        pastes: PasteService::new(db.clone()),
        users: UserService::new(db, TokenService::new(config.token_ttl)),
        token_secret: config.token_secret.clone(),
    });

    tokio::spawn(cleanup::run_cleanup_loop(
        state.clone(),
        config.cleanup_interval_secs,
    ));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(PASSWORD_HEADER),
        ])
        .expose_headers([LOCATION])
        .allow_credentials(false);

    let app = pastebox_api::router(state, config.max_body_bytes)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Pastebox listening on {}", addr);
    info!(
        "Body limit: {} bytes, cleanup every {}s",
        config.max_body_bytes, config.cleanup_interval_secs
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
