//! Binding and listen setup for created sockets.
//!
//! # Responsibilities
//! - Bind a descriptor to a resolved endpoint, preserving the OS reason on
//!   failure for operator diagnostics
//! - Put stream descriptors into listening mode and mark them non-blocking
//! - Run the full create→resolve→bind→listen sequence atomically: the
//!   caller receives either a usable record or a guaranteed-closed
//!   descriptor, never a half-configured one
//!
//! # Design Decisions
//! - `bind`/`listen` borrow the socket and never take ownership, so a
//!   failed listen leaves the close with the caller (here: dropping the
//!   local binding in [`bind_listener`])
//! - The UDP-ephemeral sentinel port (−1) is handled at this layer and
//!   never enters the reconciler's key space

use std::net::SocketAddr;

use socket2::{SockAddr, Socket};
use thiserror::Error;

use crate::net::address::{self, AddressError, AddressFamily};
use crate::net::registry::{ListenerKey, ListenerRecord};
use crate::net::socket::{self, SocketError, Transport};

/// Sentinel port requesting an IPv4 any-address, ephemeral-port datagram
/// bind (resolver-style subsystems).
pub const EPHEMERAL_PORT: i32 = -1;

/// OS-level bind failure; the reason string is kept verbatim.
#[derive(Debug, Error)]
#[error("bind failed: {0}")]
pub struct BindError(#[from] std::io::Error);

/// OS-level listen (or non-blocking setup) failure.
#[derive(Debug, Error)]
#[error("listen failed: {0}")]
pub struct ListenError(#[from] std::io::Error);

/// Any failure in the bind sequence for a single desired endpoint.
#[derive(Debug, Error)]
pub enum BindAttemptError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Socket(#[from] SocketError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Listen(#[from] ListenError),

    #[error("port {0} out of range")]
    PortOutOfRange(i32),
}

/// Resolve a raw bind request to the concrete endpoint a socket binds to.
///
/// Port [`EPHEMERAL_PORT`] is the UDP special case: IPv4 any with port 0.
/// All other ports must fit in 16 bits.
pub fn resolve_endpoint(text: &str, port: i32) -> Result<SocketAddr, BindAttemptError> {
    if port == EPHEMERAL_PORT {
        return Ok(address::wildcard(AddressFamily::V4, 0));
    }
    let port = u16::try_from(port).map_err(|_| BindAttemptError::PortOutOfRange(port))?;
    Ok(address::parse(text, port)?)
}

/// Bind a descriptor to an endpoint.
pub fn bind(socket: &Socket, addr: &SocketAddr) -> Result<(), BindError> {
    socket.bind(&SockAddr::from(*addr)).map_err(BindError::from)
}

/// Put a stream descriptor into listening mode and mark it non-blocking.
pub fn listen(socket: &Socket, backlog: i32) -> Result<(), ListenError> {
    socket.listen(backlog)?;
    socket.set_nonblocking(true)?;
    Ok(())
}

/// Bind a datagram socket to the UDP-ephemeral endpoint.
pub fn bind_ephemeral_datagram(socket: &Socket) -> Result<(), BindAttemptError> {
    let target = resolve_endpoint("", EPHEMERAL_PORT)?;
    bind(socket, &target).map_err(BindAttemptError::from)
}

/// Full bind sequence for one desired listener.
///
/// Wildcard specs take the family the socket factory actually opened, so a
/// host without IPv6 binds 0.0.0.0 rather than failing on `::`. On any
/// error the locally owned descriptor is dropped (closed) before the error
/// is returned; no record is created.
pub fn bind_listener(
    address_text: &str,
    port: u16,
    transport: Transport,
    backlog: i32,
) -> Result<ListenerRecord, BindAttemptError> {
    let text = address::normalize(address_text);

    let (sock, target) = if address::is_wildcard(text) {
        let (sock, family) = socket::create_wildcard(transport)?;
        (sock, address::wildcard(family, port))
    } else {
        let target = address::parse(text, port)?;
        let sock = socket::create(address::family(&target), transport)?;
        (sock, target)
    };

    bind(&sock, &target)?;
    if transport == Transport::Stream {
        listen(&sock, backlog)?;
    }

    Ok(ListenerRecord::new(
        ListenerKey::new(text, port),
        target,
        sock,
        transport,
    ))
}
