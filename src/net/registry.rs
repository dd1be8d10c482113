//! Live listener ownership.
//!
//! # Responsibilities
//! - Own every bound listener record for the process lifetime
//! - Key records by (address-text, port) for reconciliation diffing
//! - Guard against duplicate inserts and removals of absent keys
//!
//! # Design Decisions
//! - Records are created only by a successful bind during reconciliation
//!   and destroyed only by eviction or shutdown teardown; dropping a record
//!   closes its descriptor exactly once
//! - Keys compare on configured text, not resolved addresses: "*" and ""
//!   were normalized to the same spelling before binding

use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;

use socket2::Socket;
use thiserror::Error;

use crate::net::socket::Transport;

/// Registry key: the normalized configured address text and port.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerKey {
    pub address: String,
    pub port: u16,
}

impl ListenerKey {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Operator-facing spelling; the empty wildcard prints as `*`.
    pub fn display_address(&self) -> &str {
        if self.address.is_empty() {
            "*"
        } else {
            &self.address
        }
    }
}

impl std::fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.display_address(), self.port)
    }
}

/// A live bound listener: key, resolved bound address, owned descriptor.
#[derive(Debug)]
pub struct ListenerRecord {
    key: ListenerKey,
    bound: SocketAddr,
    socket: Socket,
    transport: Transport,
}

impl ListenerRecord {
    pub fn new(key: ListenerKey, bound: SocketAddr, socket: Socket, transport: Transport) -> Self {
        Self {
            key,
            bound,
            socket,
            transport,
        }
    }

    pub fn key(&self) -> &ListenerKey {
        &self.key
    }

    /// The address the descriptor is actually bound to. For wildcard binds
    /// this reflects the family the socket factory managed to open.
    pub fn bound_addr(&self) -> SocketAddr {
        self.bound
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Duplicate the descriptor as a std listener for an accept loop.
    ///
    /// The clone shares the open file description (already non-blocking);
    /// the record keeps exclusive ownership of its own descriptor, which
    /// still closes exactly once when the record is dropped.
    pub fn clone_stream_listener(&self) -> io::Result<std::net::TcpListener> {
        debug_assert_eq!(self.transport, Transport::Stream);
        Ok(self.socket.try_clone()?.into())
    }

    /// Raw descriptor identity, used to verify listeners survive rehash.
    #[cfg(unix)]
    pub fn raw_fd(&self) -> std::os::unix::io::RawFd {
        use std::os::unix::io::AsRawFd;
        self.socket.as_raw_fd()
    }
}

/// Guard errors for registry mutation; correct reconciler passes never
/// trigger either.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("listener {0} is already registered")]
    DuplicateListener(ListenerKey),

    #[error("listener {0} is not registered")]
    NotFound(ListenerKey),
}

/// The live set of bound listeners, exclusively owned by the rehash path.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    entries: BTreeMap<ListenerKey, ListenerRecord>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered (address, port) view for delta computation; does not mutate.
    pub fn snapshot(&self) -> Vec<ListenerKey> {
        self.entries.keys().cloned().collect()
    }

    pub fn insert(&mut self, record: ListenerRecord) -> Result<(), RegistryError> {
        let key = record.key().clone();
        if self.entries.contains_key(&key) {
            return Err(RegistryError::DuplicateListener(key));
        }
        self.entries.insert(key, record);
        Ok(())
    }

    /// Remove a listener, handing ownership (and the close) to the caller.
    pub fn remove(&mut self, key: &ListenerKey) -> Result<ListenerRecord, RegistryError> {
        self.entries
            .remove(key)
            .ok_or_else(|| RegistryError::NotFound(key.clone()))
    }

    pub fn get(&self, key: &ListenerKey) -> Option<&ListenerRecord> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &ListenerKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bulk teardown at shutdown: drops every record, closing each
    /// descriptor.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
