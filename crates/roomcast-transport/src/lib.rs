//! Transport abstraction layer for Roomcast.
//!
//! Provides the [`Transport`] and [`Connection`] traits over ordered byte
//! streams, plus the TCP implementation ([`TcpTransport`]). A connection is
//! split into independent read and write halves so a reader and a writer
//! task can own one each.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;
use std::net::SocketAddr;

use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncWrite};

/// Opaque identifier for a connection.
///
/// Derived from the peer address and a per-transport counter, so two
/// connections from the same address still get distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Length of the hex identifier in characters.
    pub const LEN: usize = 32;

    /// Derives the identifier for the `counter`-th connection from `peer`.
    pub fn derive(peer: &SocketAddr, counter: u64) -> Self {
        let digest = Sha256::digest(format!("{peer}#{counter}").as_bytes());
        let mut id = hex::encode(digest);
        id.truncate(Self::LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the underlying string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single accepted byte stream.
pub trait Connection: Send + 'static {
    /// The read half handed to the reader task.
    type Reader: AsyncRead + Unpin + Send + 'static;
    /// The write half handed to the writer task.
    type Writer: AsyncWrite + Unpin + Send + 'static;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> &ConnectionId;

    /// Returns the remote peer's address.
    fn peer_addr(&self) -> SocketAddr;

    /// Splits the connection into owned read and write halves.
    fn into_split(self) -> (Self::Reader, Self::Writer);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "10.0.0.1:4000".parse().unwrap()
    }

    #[test]
    fn test_connection_id_is_deterministic() {
        assert_eq!(ConnectionId::derive(&addr(), 1), ConnectionId::derive(&addr(), 1));
    }

    #[test]
    fn test_connection_id_differs_per_counter() {
        assert_ne!(ConnectionId::derive(&addr(), 1), ConnectionId::derive(&addr(), 2));
    }

    #[test]
    fn test_connection_id_is_fixed_length_hex() {
        let id = ConnectionId::derive(&addr(), 7);
        assert_eq!(id.as_str().len(), ConnectionId::LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_connection_id_display_matches_inner() {
        let id = ConnectionId::derive(&addr(), 3);
        assert_eq!(id.to_string(), id.clone().into_inner());
    }
}
