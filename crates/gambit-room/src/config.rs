//! Session configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every session a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Capacity of each session actor's command queue. Senders wait when
    /// it is full.
    pub channel_size: usize,

    /// Send a private `moveRejected` event to a member whose move proposal
    /// was dropped. Off by default: rejected proposals are silent.
    pub notify_rejections: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_size: 64,
            notify_rejections: false,
        }
    }
}

impl SessionConfig {
    pub fn with_rejection_notices(mut self, enabled: bool) -> Self {
        self.notify_rejections = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_silent() {
        let config = SessionConfig::default();
        assert_eq!(config.channel_size, 64);
        assert!(!config.notify_rejections);
    }

    #[test]
    fn test_with_rejection_notices() {
        let config = SessionConfig::default().with_rejection_notices(true);
        assert!(config.notify_rejections);
    }
}
