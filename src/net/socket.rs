//! Raw socket creation with standard daemon options.
//!
//! # Responsibilities
//! - Open a descriptor for an explicit address family and transport
//! - For wildcard binds with no family, try the preferred family and fall
//!   back to the alternate one, reporting which family was actually opened
//! - Apply SO_REUSEADDR unconditionally (fast rebind after restart) and a
//!   bounded SO_LINGER on stream sockets (no indefinite close hang)

use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use socket2::{Domain, Socket, Type};
use thiserror::Error;

use crate::net::address::{AddressFamily, PREFERRED_WILDCARD_FAMILY};

/// Linger interval applied to stream sockets at creation.
const STREAM_LINGER: Duration = Duration::from_secs(1);

/// Transport kind of a bind endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stream,
    Datagram,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Stream => write!(f, "stream"),
            Transport::Datagram => write!(f, "datagram"),
        }
    }
}

/// Error creating a descriptor; carries the OS reason.
#[derive(Debug, Error)]
#[error("socket creation failed: {0}")]
pub struct SocketError(#[from] io::Error);

fn domain(family: AddressFamily) -> Domain {
    match family {
        AddressFamily::V4 => Domain::IPV4,
        AddressFamily::V6 => Domain::IPV6,
    }
}

fn socket_type(transport: Transport) -> Type {
    match transport {
        Transport::Stream => Type::STREAM,
        Transport::Datagram => Type::DGRAM,
    }
}

fn open(family: AddressFamily, transport: Transport) -> io::Result<Socket> {
    let socket = Socket::new(domain(family), socket_type(transport), None)?;
    socket.set_reuse_address(true)?;
    if transport == Transport::Stream {
        socket.set_linger(Some(STREAM_LINGER))?;
    }
    Ok(socket)
}

/// Create a socket for an explicitly known address family.
pub fn create(family: AddressFamily, transport: Transport) -> Result<Socket, SocketError> {
    open(family, transport).map_err(SocketError::from)
}

/// Create a socket for a wildcard bind where the config names no address.
///
/// Tries [`PREFERRED_WILDCARD_FAMILY`] first and falls back to the
/// alternate family only if the OS refuses the first. The returned family
/// is the one actually opened, so the caller can build a matching wildcard
/// address instead of assuming the preference held.
pub fn create_wildcard(transport: Transport) -> Result<(Socket, AddressFamily), SocketError> {
    create_with_fallback(PREFERRED_WILDCARD_FAMILY, transport, open)
}

fn create_with_fallback<F>(
    preferred: AddressFamily,
    transport: Transport,
    mut open: F,
) -> Result<(Socket, AddressFamily), SocketError>
where
    F: FnMut(AddressFamily, Transport) -> io::Result<Socket>,
{
    match open(preferred, transport) {
        Ok(socket) => Ok((socket, preferred)),
        Err(_) => {
            let alternate = preferred.alternate();
            match open(alternate, transport) {
                Ok(socket) => Ok((socket, alternate)),
                Err(err) => Err(SocketError::from(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_uses_preferred_family_when_available() {
        let (socket, family) =
            create_with_fallback(AddressFamily::V6, Transport::Stream, open).unwrap();
        assert_eq!(family, AddressFamily::V6);
        drop(socket);
    }

    #[test]
    fn wildcard_falls_back_when_preferred_family_unavailable() {
        let (socket, family) =
            create_with_fallback(AddressFamily::V6, Transport::Stream, |family, transport| {
                if family == AddressFamily::V6 {
                    Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        "address family not supported",
                    ))
                } else {
                    open(family, transport)
                }
            })
            .unwrap();
        assert_eq!(family, AddressFamily::V4);
        drop(socket);
    }

    #[test]
    fn create_fails_when_both_families_refused() {
        let result = create_with_fallback(AddressFamily::V6, Transport::Stream, |_, _| {
            Err(io::Error::new(io::ErrorKind::Unsupported, "no sockets here"))
        });
        assert!(result.is_err());
    }

    #[test]
    fn explicit_family_create_succeeds() {
        let socket = create(AddressFamily::V4, Transport::Datagram).unwrap();
        drop(socket);
    }
}
