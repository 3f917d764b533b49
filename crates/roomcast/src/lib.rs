//! # Roomcast
//!
//! Actor-based multiplayer room server.
//!
//! Every connection is a player actor and every room is a room actor. They
//! only talk through bounded mailboxes: players send events into rooms,
//! rooms broadcast state snapshots back into players' outbound mailboxes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomcast::prelude::*;
//!
//! # async fn start() -> Result<(), RoomcastError> {
//! let server = RoomcastServer::builder()
//!     .bind("0.0.0.0:12345")
//!     .player_config(PlayerConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod server;

pub use error::RoomcastError;
pub use server::{RoomcastServer, RoomcastServerBuilder};

/// Sub-crates, for anything the prelude doesn't cover.
pub use roomcast_protocol as protocol;
pub use roomcast_room as room;
pub use roomcast_session as session;
pub use roomcast_transport as transport;

/// Everything needed to run a server or speak its protocol.
pub mod prelude {
    pub use crate::{RoomcastError, RoomcastServer, RoomcastServerBuilder};
    pub use roomcast_protocol::{
        encode_frame, Codec, CreateRoomRequest, CreateRoomResponse, Envelope,
        FrameDecoder, GetRoomListRequest, GetRoomListResponse, JoinRoomRequest,
        JoinRoomResponse, JsonCodec, LeaveRoomRequest, LeaveRoomResponse,
        LoginRequest, LoginResponse, MessageKind, MoveRequest, MoveResponse,
        PlayerId, PlayerInfo, Position, ResultCode, RoomId, RoomSnapshot,
        RoomStateNotification,
    };
    pub use roomcast_room::{OverflowPolicy, RoomConfig};
    pub use roomcast_session::{PlayerConfig, Registry};
}
