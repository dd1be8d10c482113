//! hearthd: a multi-listener network daemon with hot rehash.
//!
//! The daemon binds a configurable set of listening sockets, keeps them
//! in a registry keyed by their configured (address, port) text, and on
//! every configuration reload adjusts the live set to match: new entries
//! are bound, dropped entries are closed, and overlapping entries are
//! left completely untouched so serving never pauses for a rehash.

pub mod config;
pub mod extensions;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;

pub use config::schema::DaemonConfig;
pub use extensions::Extensions;
pub use lifecycle::{Daemon, Shutdown};
pub use net::reconcile::{reconcile, BindSpec, ReconcileReport};
pub use net::registry::{ListenerKey, ListenerRegistry};
pub use net::socket::Transport;
