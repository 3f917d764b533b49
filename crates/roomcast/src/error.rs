//! Unified error type for Roomcast.

use roomcast_protocol::ProtocolError;
use roomcast_room::{MailboxError, RoomError};
use roomcast_session::SessionError;
use roomcast_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum RoomcastError {
    /// Binding or accepting failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Framing or (de)serialization failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room could not be reached.
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Mailbox(#[from] MailboxError),
}
