//! Listener reconciliation: the hot-rehash delta algorithm.
//!
//! # Responsibilities
//! - Diff the desired bind set against the live registry on textual
//!   (address, port) identity
//! - Bind additions one at a time, isolating per-entry failures
//! - Evict and close listeners the new config no longer names
//! - Leave overlapping listeners completely untouched so a rehash never
//!   interrupts already-served endpoints
//!
//! # Design Decisions
//! - Two-pass compute-then-apply: the delta is derived from an immutable
//!   snapshot, never by erasing from a collection while scanning it
//! - Keys compare on configured text ("*" normalized to ""), not resolved
//!   addresses; two spellings of the same IP are different listeners
//! - Removals are skipped when the registry started empty or the desired
//!   list is empty: no removals from an uninitialized baseline
//! - Duplicate desired entries are a config-validation concern; a
//!   duplicate that slips through fails its own bind attempt loudly
//!   instead of being silently collapsed

use std::collections::BTreeSet;

use serde::Serialize;

use crate::net::address;
use crate::net::binder;
use crate::net::registry::{ListenerKey, ListenerRegistry};
use crate::net::socket::Transport;
use crate::observability::events::{BindEvent, BindEventSink, BindOutcome};

/// Type discriminator for client-facing binds; anything else is reserved
/// for future listener classes (server links) and ignored here.
pub const CLIENTS_KIND: &str = "clients";

/// Desired-state entry for one listener, produced by the config layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindSpec {
    /// Numeric address text, empty, or the `*` wildcard marker.
    pub address: String,
    pub port: u16,
    pub transport: Transport,
    /// Pending-connection queue size handed to listen(2).
    pub backlog: i32,
    /// Listener class; only [`CLIENTS_KIND`] is bound today.
    #[serde(rename = "type")]
    pub kind: String,
}

impl BindSpec {
    pub fn new(
        address: impl Into<String>,
        port: u16,
        transport: Transport,
        backlog: i32,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            port,
            transport,
            backlog,
            kind: kind.into(),
        }
    }

    /// A client-facing stream listener, the common case.
    pub fn client(address: impl Into<String>, port: u16, backlog: i32) -> Self {
        Self::new(address, port, Transport::Stream, backlog, CLIENTS_KIND)
    }

    /// Registry key this spec normalizes to.
    pub fn key(&self) -> ListenerKey {
        ListenerKey::new(address::normalize(&self.address), self.port)
    }

    fn is_clients(&self) -> bool {
        self.kind == CLIENTS_KIND
    }
}

/// One failed bind attempt, kept for the rehash orchestrator's report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindFailure {
    pub address: String,
    pub port: u16,
    pub reason: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Newly bound listeners.
    pub bound: usize,
    /// Listeners present in both old and new config, left untouched.
    pub unchanged: usize,
    /// Per-entry failures; partial success is expected and normal.
    pub failures: Vec<BindFailure>,
    /// Listeners closed because the config no longer names them.
    pub removed: Vec<ListenerKey>,
}

impl ReconcileReport {
    /// True when nothing changed: the pass was a no-op.
    pub fn is_quiescent(&self) -> bool {
        self.bound == 0 && self.failures.is_empty() && self.removed.is_empty()
    }
}

/// Normalized key set of the client-facing desired entries, used for the
/// removal delta.
fn desired_keys(desired: &[BindSpec]) -> BTreeSet<ListenerKey> {
    desired
        .iter()
        .filter(|spec| spec.is_clients())
        .map(BindSpec::key)
        .collect()
}

/// Run one reconciliation pass, adjusting `registry` to match `desired`.
///
/// Every attempt, skip, and removal is reported to `sink`. The pass runs
/// each entry to completion: one bad spec never aborts the rest, and a
/// pass never fails as a whole. Severity is communicated through the
/// report's failure list.
pub fn reconcile(
    registry: &mut ListenerRegistry,
    desired: &[BindSpec],
    sink: &dyn BindEventSink,
) -> ReconcileReport {
    let old: BTreeSet<ListenerKey> = registry.snapshot().into_iter().collect();
    let started_with_nothing = old.is_empty();
    let new = desired_keys(desired);

    let mut report = ReconcileReport::default();

    for spec in desired.iter().filter(|spec| spec.is_clients()) {
        let key = spec.key();

        if old.contains(&key) {
            report.unchanged += 1;
            sink.record(BindEvent {
                address: key.display_address().to_string(),
                port: key.port,
                transport: spec.transport,
                outcome: BindOutcome::AlreadyBound,
                reason: None,
            });
            continue;
        }

        let attempt = binder::bind_listener(&key.address, key.port, spec.transport, spec.backlog)
            .map_err(|err| err.to_string())
            .and_then(|record| {
                registry
                    .insert(record)
                    .map_err(|err| err.to_string())
            });

        match attempt {
            Ok(()) => {
                report.bound += 1;
                sink.record(BindEvent {
                    address: key.display_address().to_string(),
                    port: key.port,
                    transport: spec.transport,
                    outcome: BindOutcome::Bound,
                    reason: None,
                });
            }
            Err(reason) => {
                sink.record(BindEvent {
                    address: key.display_address().to_string(),
                    port: key.port,
                    transport: spec.transport,
                    outcome: BindOutcome::Failed,
                    reason: Some(reason.clone()),
                });
                report.failures.push(BindFailure {
                    address: key.display_address().to_string(),
                    port: key.port,
                    reason,
                });
            }
        }
    }

    if !started_with_nothing && !desired.is_empty() {
        for key in old.difference(&new) {
            // Keys come from the snapshot and nothing else mutates the
            // registry during the pass, so removal cannot miss.
            let Ok(record) = registry.remove(key) else {
                continue;
            };
            sink.record(BindEvent {
                address: key.display_address().to_string(),
                port: key.port,
                transport: record.transport(),
                outcome: BindOutcome::Removed,
                reason: None,
            });
            drop(record);
            report.removed.push(key.clone());
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desired_keys_normalize_wildcard_spelling() {
        let specs = vec![
            BindSpec::client("*", 6667, 128),
            BindSpec::client("", 6697, 128),
        ];
        let keys = desired_keys(&specs);
        assert!(keys.contains(&ListenerKey::new("", 6667)));
        assert!(keys.contains(&ListenerKey::new("", 6697)));
    }

    #[test]
    fn desired_keys_ignore_non_client_kinds() {
        let specs = vec![
            BindSpec::client("", 6667, 128),
            BindSpec::new("", 7001, Transport::Stream, 128, "servers"),
        ];
        let keys = desired_keys(&specs);
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&ListenerKey::new("", 6667)));
    }

    #[test]
    fn spec_key_uses_textual_identity() {
        // "0.0.0.0" and "" resolve to the same interfaces but are distinct
        // listeners by key.
        let explicit = BindSpec::client("0.0.0.0", 6667, 128);
        let wildcard = BindSpec::client("", 6667, 128);
        assert_ne!(explicit.key(), wildcard.key());
    }

    #[test]
    fn quiescent_report_detection() {
        let mut report = ReconcileReport::default();
        report.unchanged = 3;
        assert!(report.is_quiescent());

        report.bound = 1;
        assert!(!report.is_quiescent());
    }
}
