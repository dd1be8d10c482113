//! Serving subsystem: accept tasks and client sessions.
//!
//! # Data Flow
//! ```text
//! Listener registry (after reconciliation)
//!     → engine.rs (spawn/stop accept tasks, connection limit)
//!     → session.rs (per-connection lifetime, traffic accounting)
//!
//! Session lifetime:
//!     Accepted → Tracked → Serving → Disconnected (slot released)
//! ```
//!
//! # Design Decisions
//! - The engine follows the registry, never the config directly; only
//!   listeners that actually bound get accept tasks
//! - One semaphore bounds connections across all listeners

pub mod engine;
pub mod session;

pub use engine::AcceptEngine;
pub use session::Session;
