//! Idle-connection reaper.

use std::sync::Arc;
use std::time::Duration;

use cabby_core::config::RealtimeConfig;

use super::manager::ConnectionManager;

/// Periodically reaps connections that stopped sending heartbeats.
/// Runs until the process shuts down; spawn it from `main`.
pub async fn run_idle_reaper(manager: Arc<ConnectionManager>, config: RealtimeConfig) {
    let timeout = Duration::from_secs(config.heartbeat_timeout_seconds);
    let mut interval =
        tokio::time::interval(Duration::from_secs(config.sweep_interval_seconds));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let reaped = manager.sweep_idle(timeout);
        if reaped > 0 {
            tracing::info!(reaped, "Idle connection sweep complete");
        }
    }
}
