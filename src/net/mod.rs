//! Network layer subsystem: listening sockets and their lifecycle.
//!
//! # Data Flow
//! ```text
//! Config bind entries (desired state)
//!     → reconcile.rs (diff against live registry)
//!     → binder.rs (resolve endpoint, bind, listen)
//!     → socket.rs (descriptor creation, options, family fallback)
//!     → registry.rs (live listeners, keyed by configured text)
//!     → Accept engine picks up new descriptors
//!
//! Listener lifetime:
//!     Configured → Bound → Listening → Removed (descriptor closed)
//! ```
//!
//! # Design Decisions
//! - Listener identity is the configured (address, port) text, so a
//!   rehash only touches entries the config actually changed
//! - All descriptors are owned by registry records; closing is Drop
//! - Per-entry bind failures never abort a reconciliation pass

pub mod address;
pub mod binder;
pub mod connection;
pub mod reconcile;
pub mod registry;
pub mod socket;
