//! Client connection identity and lifetime tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for log correlation
//! - Maintain the live session table consulted by shutdown draining
//! - Keep the active-connection gauge current

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is sufficient since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Live session table: every accepted connection is present from accept
/// until its guard drops. Guards drop on arbitrary worker tasks while
/// the control task reads counts, hence the concurrent map.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    sessions: Arc<DashMap<ConnectionId, SocketAddr>>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection. The returned guard removes the table
    /// entry and corrects the gauge when dropped.
    pub fn track(&self, peer: SocketAddr) -> ConnectionGuard {
        let id = ConnectionId::new();
        self.sessions.insert(id, peer);
        metrics::record_connection_opened();
        ConnectionGuard {
            sessions: Arc::clone(&self.sessions),
            id,
        }
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Snapshot of live connections, ordered by connection ID.
    pub fn peers(&self) -> Vec<(ConnectionId, SocketAddr)> {
        let mut entries: Vec<(ConnectionId, SocketAddr)> = self
            .sessions
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Wait for every tracked connection to close, up to `timeout`.
    /// Returns true when the table emptied in time.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while !self.sessions.is_empty() {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        true
    }
}

/// Guard tied to one connection's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    sessions: Arc<DashMap<ConnectionId, SocketAddr>>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.id);
        metrics::record_connection_closed();
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn tracker_counts_guard_lifetimes() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track(peer(50001));
        let guard2 = tracker.track(peer(50002));
        assert_eq!(tracker.active_count(), 2);

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn peers_snapshot_is_ordered_and_current() {
        let tracker = ConnectionTracker::new();
        let guard1 = tracker.track(peer(50001));
        let _guard2 = tracker.track(peer(50002));

        let live = tracker.peers();
        assert_eq!(live.len(), 2);
        assert!(live[0].0 < live[1].0);
        assert_eq!(live[0].1, peer(50001));

        drop(guard1);
        let live = tracker.peers();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].1, peer(50002));
    }

    #[tokio::test]
    async fn drain_returns_once_connections_close() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track(peer(50001));

        let waiter = tracker.clone();
        let handle = tokio::spawn(async move { waiter.drain(Duration::from_secs(5)).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn drain_times_out_with_connections_open() {
        let tracker = ConnectionTracker::new();
        let _guard = tracker.track(peer(50001));
        assert!(!tracker.drain(Duration::from_millis(100)).await);
    }
}
