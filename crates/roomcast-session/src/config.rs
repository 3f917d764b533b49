//! Per-player configuration.

use std::time::Duration;

use roomcast_protocol::DEFAULT_MAX_FRAME_LEN;
use roomcast_room::OverflowPolicy;

/// Settings applied to every player actor.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Capacity of the reader → dispatcher mailbox.
    pub inbound_capacity: usize,

    /// Capacity of the outbound (→ writer) mailbox.
    pub outbound_capacity: usize,

    /// Size of the buffer handed to each transport read.
    pub read_buffer_size: usize,

    /// Largest frame payload accepted or sent, in bytes.
    pub max_frame_len: usize,

    /// How long a handler waits on a room's reply before giving up.
    pub reply_timeout: Duration,

    /// What the reader does when the inbound mailbox is full.
    pub inbound_overflow: OverflowPolicy,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            inbound_capacity: 1000,
            outbound_capacity: 1000,
            read_buffer_size: 4096,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            reply_timeout: Duration::from_secs(5),
            inbound_overflow: OverflowPolicy::DropNewest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_config_default() {
        let config = PlayerConfig::default();
        assert_eq!(config.inbound_capacity, 1000);
        assert_eq!(config.outbound_capacity, 1000);
        assert_eq!(config.read_buffer_size, 4096);
        assert_eq!(config.max_frame_len, 1024 * 1024);
        assert_eq!(config.reply_timeout, Duration::from_secs(5));
        assert_eq!(config.inbound_overflow, OverflowPolicy::DropNewest);
    }
}
