//! Structured rehash events.
//!
//! The listener core reports every bind attempt, duplicate skip, and
//! removal as one structured event to an external sink; it does not format
//! or persist diagnostics itself. The daemon installs [`TracingSink`];
//! tests install recording sinks to assert on the event stream.

use crate::net::socket::Transport;

/// Outcome of one reconciliation action on an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// Newly bound and registered.
    Bound,
    /// Present in both the old and new config; left untouched.
    AlreadyBound,
    /// Bind or listen failed; the endpoint is not registered.
    Failed,
    /// No longer in the config; closed and evicted.
    Removed,
}

/// One event per reconciliation action, family-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindEvent {
    /// Operator-facing address text (`*` for wildcard binds).
    pub address: String,
    pub port: u16,
    pub transport: Transport,
    pub outcome: BindOutcome,
    /// OS reason, present only for [`BindOutcome::Failed`].
    pub reason: Option<String>,
}

/// Diagnostic sink collaborator for the listener core.
pub trait BindEventSink: Send + Sync {
    fn record(&self, event: BindEvent);
}

/// Production sink: one structured tracing line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl BindEventSink for TracingSink {
    fn record(&self, event: BindEvent) {
        match event.outcome {
            BindOutcome::Bound => tracing::info!(
                address = %event.address,
                port = event.port,
                transport = %event.transport,
                "Listener bound"
            ),
            BindOutcome::AlreadyBound => tracing::debug!(
                address = %event.address,
                port = event.port,
                transport = %event.transport,
                "Listener already bound, left untouched"
            ),
            BindOutcome::Failed => tracing::warn!(
                address = %event.address,
                port = event.port,
                transport = %event.transport,
                reason = event.reason.as_deref().unwrap_or("unknown"),
                "Failed to bind listener"
            ),
            BindOutcome::Removed => tracing::info!(
                address = %event.address,
                port = event.port,
                transport = %event.transport,
                "Listener removed from config, closing"
            ),
        }
    }
}
