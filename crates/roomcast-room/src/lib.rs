//! Room actors for Roomcast.
//!
//! Each room runs as an isolated Tokio task with its own member list and
//! a bounded event mailbox. Players never touch a room's state directly;
//! they send [`RoomEvent`]s through a [`RoomHandle`].
//!
//! # Key types
//!
//! - [`RoomActor`]: owns one room's membership and runs its event loop
//! - [`RoomHandle`]: cloneable sender into a running room
//! - [`EventTable`]: event kind → handler lookup, see [`room_handlers`]
//! - [`PlayerDirectory`]: resolves a joining player to its outbound mailbox
//! - [`Mailbox`]: bounded sender with a drop-newest overflow policy

mod config;
mod error;
mod event;
mod mailbox;
mod room;

pub use config::{RoomConfig, DEFAULT_EVENT_CAPACITY};
pub use error::RoomError;
pub use event::{
    EventBody, EventKind, JoinOutcome, LeaveOutcome, MemberProfile, RoomEvent,
};
pub use mailbox::{mailbox, Mailbox, MailboxError, OverflowPolicy};
pub use room::{
    room_handlers, EventHandler, EventTable, PlayerDirectory, RoomActor,
    RoomHandle,
};
