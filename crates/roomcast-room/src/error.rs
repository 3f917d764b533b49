//! Error types for the room layer.

use roomcast_protocol::RoomId;

/// Errors that can occur while talking to a room actor.
///
/// These describe the room's *reachability*. Application outcomes such as
/// "player already in room" travel back as a `ResultCode` instead.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room's event loop has stopped (mailbox closed or reply dropped).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The room's event mailbox is full and the event was dropped.
    #[error("room {0} is busy, event dropped")]
    Busy(RoomId),

    /// The room did not accept or answer a request in time.
    #[error("room {0} did not respond in time")]
    Timeout(RoomId),
}
