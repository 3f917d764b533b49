//! Players and the registry for Roomcast.
//!
//! This crate owns everything that happens per connection:
//!
//! 1. **Registry** ([`Registry`]): the identifier → handle map for every
//!    live player and room, with at-most-once actor creation
//! 2. **Player actor** ([`Player`]): reader, writer, and dispatcher tasks
//!    for one connection, plus the teardown that follows them
//! 3. **Handlers** ([`player_handlers`]): what each request kind does
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← accepts connections, spawns players via the registry
//!     ↕
//! Session layer (this crate)  ← decodes requests, talks to rooms
//!     ↕
//! Room layer (below)  ← room actors, events, mailboxes
//! ```

mod config;
mod error;
mod handlers;
mod player;
mod registry;

pub use config::PlayerConfig;
pub use error::SessionError;
pub use handlers::{
    player_handlers, HandlerFuture, PlayerContext, PlayerHandler,
    PlayerHandlers,
};
pub use player::{frame_envelope, Player, PlayerHandle};
pub use registry::Registry;
