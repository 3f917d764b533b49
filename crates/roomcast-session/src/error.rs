//! Error types for the session layer.

use roomcast_protocol::ProtocolError;
use roomcast_room::{MailboxError, RoomError};

/// Errors a player handler can fail with.
///
/// None of these end the connection. The dispatcher logs them and moves on
/// to the next inbound message; outcomes the client should see are sent as
/// result codes instead.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request payload could not be decoded, or the response could not
    /// be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room could not be reached.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The player's own outbound mailbox rejected the response.
    #[error(transparent)]
    Mailbox(#[from] MailboxError),
}
