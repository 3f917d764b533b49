//! Wire protocol for Roomcast.
//!
//! This crate defines what clients and the server exchange:
//!
//! - **Types** ([`Envelope`], [`MessageKind`], [`ResultCode`], the request /
//!   response payloads): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes and payloads
//!   are converted to/from bytes.
//! - **Framing** ([`FrameDecoder`], [`encode_frame`]): how a byte stream is
//!   cut into discrete envelopes.
//! - **Dispatch** ([`HandlerTable`]): kind → handler lookup used by both
//!   the player and the room layer.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Frame (length-prefixed unit) → Envelope → handler
//! ```

mod codec;
mod dispatch;
mod error;
mod frame;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use dispatch::HandlerTable;
pub use error::ProtocolError;
pub use frame::{encode_frame, FrameDecoder, DEFAULT_MAX_FRAME_LEN, LENGTH_PREFIX_LEN};
pub use types::{
    CreateRoomRequest, CreateRoomResponse, Envelope, GetRoomListRequest,
    GetRoomListResponse, JoinRoomRequest, JoinRoomResponse, LeaveRoomRequest,
    LeaveRoomResponse, LoginRequest, LoginResponse, MessageKind, MoveRequest,
    MoveResponse, PlayerId, PlayerInfo, Position, ResultCode, RoomId,
    RoomSnapshot, RoomStateNotification, NOTIFICATION_SERIAL_NO,
};
