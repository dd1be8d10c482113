//! Address-family abstraction and numeric endpoint parsing.
//!
//! # Responsibilities
//! - Parse config-facing address text (numeric literals or wildcard) into
//!   socket addresses without DNS
//! - Format bound addresses back into (text, port) pairs
//! - Report the OS-level sockaddr length for bind(2)
//!
//! # Design Decisions
//! - `std::net::SocketAddr` is the family-tagged representation; the family
//!   tag and payload can never disagree
//! - Wildcard family preference is a single policy constant, not a per-call
//!   guess; hosts without IPv6 are handled by the socket factory's fallback

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use thiserror::Error;

/// IP address family of a bind endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// The other family, used by the wildcard fallback path.
    pub fn alternate(self) -> Self {
        match self {
            AddressFamily::V4 => AddressFamily::V6,
            AddressFamily::V6 => AddressFamily::V4,
        }
    }
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "ipv4"),
            AddressFamily::V6 => write!(f, "ipv6"),
        }
    }
}

/// Family used for wildcard binds when the config names no address.
///
/// IPv6 any is dual-stack on common platforms and therefore preferred;
/// hosts without IPv6 support fall back to IPv4 at socket-creation time
/// (see [`crate::net::socket`]).
pub const PREFERRED_WILDCARD_FAMILY: AddressFamily = AddressFamily::V6;

/// Config marker accepted as an alias for the empty (wildcard) address.
pub const WILDCARD_MARKER: &str = "*";

/// Error for address text that is neither wildcard nor a numeric literal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address {0:?}: not an IPv4 or IPv6 numeric literal")]
    InvalidAddress(String),
}

/// True for the empty string or the `*` marker.
pub fn is_wildcard(text: &str) -> bool {
    text.is_empty() || text == WILDCARD_MARKER
}

/// Normalize address text for registry keys: `*` collapses to the empty
/// string so both spellings of a wildcard bind compare equal.
pub fn normalize(text: &str) -> &str {
    if text == WILDCARD_MARKER {
        ""
    } else {
        text
    }
}

/// The all-interfaces address for a family.
pub fn wildcard(family: AddressFamily, port: u16) -> SocketAddr {
    match family {
        AddressFamily::V4 => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        AddressFamily::V6 => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port),
    }
}

/// Parse address text and a port into a socket address.
///
/// Empty text or `*` yields the all-interfaces address of
/// [`PREFERRED_WILDCARD_FAMILY`]. Text containing a colon is parsed as an
/// IPv6 literal, anything else as an IPv4 literal. Hostnames are not
/// resolved here; callers must hand in numeric text.
pub fn parse(text: &str, port: u16) -> Result<SocketAddr, AddressError> {
    let text = normalize(text);
    if text.is_empty() {
        return Ok(wildcard(PREFERRED_WILDCARD_FAMILY, port));
    }

    if text.contains(':') {
        text.parse::<Ipv6Addr>()
            .map(|ip| SocketAddr::new(IpAddr::V6(ip), port))
            .map_err(|_| AddressError::InvalidAddress(text.to_string()))
    } else {
        text.parse::<Ipv4Addr>()
            .map(|ip| SocketAddr::new(IpAddr::V4(ip), port))
            .map_err(|_| AddressError::InvalidAddress(text.to_string()))
    }
}

/// Inverse of [`parse`]: the textual address and port of a socket address.
///
/// Always succeeds; the sum-type representation has no unrecognized-family
/// branch to defend against.
pub fn format(addr: &SocketAddr) -> (String, u16) {
    (addr.ip().to_string(), addr.port())
}

/// Family tag of a socket address.
pub fn family(addr: &SocketAddr) -> AddressFamily {
    if addr.is_ipv4() {
        AddressFamily::V4
    } else {
        AddressFamily::V6
    }
}

/// Byte length of the OS sockaddr structure for this address, as consumed
/// by bind(2).
pub fn sockaddr_len(addr: &SocketAddr) -> usize {
    socket2::SockAddr::from(*addr).len() as usize
}
