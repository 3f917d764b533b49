//! `RoomcastServer` builder and accept loop.
//!
//! This is the entry point for running a Roomcast server. It ties the
//! layers together: transport → player actor → room actor.

use std::net::SocketAddr;
use std::sync::Arc;

use roomcast_protocol::PlayerId;
use roomcast_room::RoomConfig;
use roomcast_session::{
    player_handlers, Player, PlayerConfig, PlayerHandlers, Registry,
};
use roomcast_transport::{Connection, TcpConnection, TcpTransport, Transport};

use crate::RoomcastError;

/// Builder for configuring and starting a Roomcast server.
///
/// # Example
///
/// ```rust,no_run
/// use roomcast::prelude::*;
///
/// # async fn start() -> Result<(), RoomcastError> {
/// let server = RoomcastServer::builder()
///     .bind("0.0.0.0:12345")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RoomcastServerBuilder {
    bind_addr: String,
    player_config: PlayerConfig,
    room_config: RoomConfig,
    handlers: PlayerHandlers,
}

impl RoomcastServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:12345".to_string(),
            player_config: PlayerConfig::default(),
            room_config: RoomConfig::default(),
            handlers: player_handlers(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn player_config(mut self, config: PlayerConfig) -> Self {
        self.player_config = config;
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Replaces the player handler table.
    pub fn handlers(mut self, handlers: PlayerHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Binds the listener and builds the server. Nothing is accepted until
    /// [`RoomcastServer::run`] is awaited.
    pub async fn build(self) -> Result<RoomcastServer, RoomcastError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;

        Ok(RoomcastServer {
            transport,
            registry: Registry::new(self.room_config),
            handlers: Arc::new(self.handlers),
            player_config: self.player_config,
        })
    }
}

impl Default for RoomcastServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Roomcast server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RoomcastServer {
    transport: TcpTransport,
    registry: Arc<Registry>,
    handlers: Arc<PlayerHandlers>,
    player_config: PlayerConfig,
}

impl RoomcastServer {
    /// Creates a new builder.
    pub fn builder() -> RoomcastServerBuilder {
        RoomcastServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The registry every player and room of this server lives in.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Runs the accept loop.
    ///
    /// Every accepted connection becomes a player actor registered under
    /// its connection id. A failed accept is logged and the loop goes on.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), RoomcastError> {
        tracing::info!(addr = ?self.local_addr().ok(), "roomcast server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => self.spawn_player(conn),
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }

    fn spawn_player(&self, conn: TcpConnection) {
        let id = PlayerId::from(conn.id().as_str());
        let peer = conn.peer_addr();
        let (reader, writer) = conn.into_split();

        let (_, created) = self.registry.get_or_create_player(id.clone(), || {
            let (handle, player) = Player::new(
                id.clone(),
                reader,
                writer,
                Arc::clone(&self.registry),
                Arc::clone(&self.handlers),
                self.player_config.clone(),
            );
            (handle, player.run())
        });

        if created {
            tracing::debug!(player_id = %id, %peer, "player spawned");
        } else {
            tracing::warn!(
                player_id = %id,
                %peer,
                "connection id already registered, dropping connection"
            );
        }
    }
}
