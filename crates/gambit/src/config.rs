//! Server configuration.

use std::time::Duration;

use gambit_room::SessionConfig;
use gambit_transport::DEFAULT_HANDSHAKE_TIMEOUT;
use serde::{Deserialize, Serialize};

/// Settings for a [`GambitServer`](crate::GambitServer).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Close a connection that sends nothing for this long. `None` keeps
    /// idle connections open indefinitely.
    pub idle_timeout: Option<Duration>,

    /// How long a new peer gets to complete the WebSocket upgrade.
    pub handshake_timeout: Duration,

    /// Settings applied to every session.
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            idle_timeout: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            session: SessionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert!(config.idle_timeout.is_none());
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
        assert!(!config.session.notify_rejections);
    }
}
