use std::time::Duration;

use pastebox_api::auth::AppState;
use tracing::{info, warn};

/// Background task that reclaims expired pastes.
///
/// Expired pastes are already invisible to reads and listings; this only
/// frees their rows.
pub async fn run_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let state = state.clone();
        match tokio::task::spawn_blocking(move || state.pastes.purge_expired()).await {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Cleanup: purged {} expired pastes", count);
                }
            }
            Ok(Err(e)) => warn!("Cleanup error: {}", e),
            Err(e) => warn!("Cleanup task failed: {}", e),
        }
    }
}
