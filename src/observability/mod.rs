//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters and gauges)
//!     → events.rs (listener lifecycle events, pluggable sink)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Tests observe bind activity through a recording sink
//! ```
//!
//! # Design Decisions
//! - Connection IDs flow through logs for correlation
//! - Metrics are cheap (atomic increments)
//! - Listener events go through a trait object so reconciliation is
//!   observable without depending on a particular logger

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{BindEvent, BindEventSink, BindOutcome, TracingSink};
