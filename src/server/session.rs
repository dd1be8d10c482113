//! Per-connection session handling.
//!
//! Protocol parsing lives above this layer; a session's job is to hold
//! the connection open, account for traffic, and release its resources
//! when the peer leaves or the daemon stops.

use std::net::SocketAddr;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::{watch, OwnedSemaphorePermit};

use crate::extensions::Extensions;
use crate::net::connection::{ConnectionGuard, ConnectionId};

/// State carried for one accepted connection.
pub struct Session {
    id: ConnectionId,
    peer: SocketAddr,
    bytes_in: u64,
    /// Attachment slots for subsystems layered on top of the session.
    pub extensions: Extensions,
}

impl Session {
    pub fn new(id: ConnectionId, peer: SocketAddr) -> Self {
        Self {
            id,
            peer,
            bytes_in: 0,
            extensions: Extensions::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }
}

/// Serve one connection until the peer disconnects or the daemon asks
/// the session to stop.
///
/// The permit and guard ride along for the whole lifetime: dropping them
/// frees the connection slot and corrects the active-connection count.
pub async fn run(
    mut stream: TcpStream,
    peer: SocketAddr,
    guard: ConnectionGuard,
    permit: OwnedSemaphorePermit,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut session = Session::new(guard.id(), peer);
    tracing::info!(connection_id = %session.id(), peer = %peer, "Client connected");

    let mut buf = vec![0u8; 4096];
    loop {
        tokio::select! {
            _ = stop_rx.changed() => {
                tracing::debug!(connection_id = %session.id(), "Session stopped by daemon");
                break;
            }
            read = stream.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => session.bytes_in += n as u64,
                Err(e) => {
                    tracing::debug!(connection_id = %session.id(), error = %e, "Read failed");
                    break;
                }
            },
        }
    }

    tracing::info!(
        connection_id = %session.id(),
        peer = %peer,
        bytes_in = session.bytes_in(),
        "Client disconnected"
    );
    drop(permit);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_records_identity() {
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let session = Session::new(ConnectionId::new(), peer);
        assert_eq!(session.peer(), peer);
        assert_eq!(session.bytes_in(), 0);
    }

    #[test]
    fn session_extensions_hold_attachments() {
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let mut session = Session::new(ConnectionId::new(), peer);
        assert!(session.extensions.insert("idle_since", 1234u64));
        assert_eq!(session.extensions.get::<u64>("idle_since"), Some(&1234));
    }
}
