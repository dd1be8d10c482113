//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Bind listeners → Start accept tasks
//!
//! Rehash (startup.rs):
//!     SIGHUP or file change → Reload → Validate → Reconcile listeners
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Close
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger rehash
//! ```
//!
//! # Design Decisions
//! - Startup is fail-fast: no bound listeners means no daemon
//! - Rehash never is: per-listener failures leave the rest serving
//! - Ordered shutdown: stop accept, drain, close descriptors
//! - Shutdown has timeout: forced close after the drain deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{ControlEvent, Signals};
pub use startup::{Daemon, StartupError};
