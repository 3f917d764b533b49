//! Room configuration.

use std::time::Duration;

/// Default capacity of a room's event mailbox.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Configuration shared by every room actor.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Capacity of each room's event mailbox.
    pub event_capacity: usize,

    /// Upper bound on a synchronous request to a room (enqueue + reply).
    pub reply_timeout: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            reply_timeout: Duration::from_secs(5),
        }
    }
}
