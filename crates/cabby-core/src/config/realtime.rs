//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound buffer size per connection. A subscriber whose buffer is
    /// full has frames dropped rather than stalling fan-out.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum WebSocket connections per user.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// Seconds of inactivity after which a connection is considered dead.
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout_seconds: u64,
    /// Interval between idle-connection sweeps, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            max_connections_per_user: default_max_connections_per_user(),
            heartbeat_timeout_seconds: default_heartbeat_timeout(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_connections_per_user() -> usize {
    5
}

fn default_heartbeat_timeout() -> u64 {
    90
}

fn default_sweep_interval() -> u64 {
    30
}
