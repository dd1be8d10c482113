//! Accept engine: one accept task per live stream listener.
//!
//! # Responsibilities
//! - Keep accept tasks in step with the listener registry after every
//!   reconciliation pass
//! - Enforce the global connection limit via semaphore permits
//! - Stop accepting on listeners the config dropped, promptly
//!
//! # Design Decisions
//! - Tasks run on duplicated descriptors; the registry record keeps sole
//!   ownership of the original, so closing semantics stay in one place
//! - A stopped worker ends its own task through a watch channel; the
//!   engine never blocks on task teardown
//! - Datagram listeners are bound but not served here; they carry no
//!   accept semantics

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, Semaphore};

use crate::net::connection::ConnectionTracker;
use crate::net::registry::{ListenerKey, ListenerRegistry};
use crate::net::socket::Transport;
use crate::server::session;

/// Accept-task supervisor, synchronized against the listener registry.
pub struct AcceptEngine {
    tracker: ConnectionTracker,
    connection_limit: Arc<Semaphore>,
    workers: HashMap<ListenerKey, ListenerWorker>,
    /// Daemon-wide stop for sessions. Removing one listener stops only
    /// its accept task; connections it already produced live on.
    session_stop_tx: watch::Sender<bool>,
}

struct ListenerWorker {
    stop_tx: watch::Sender<bool>,
}

impl AcceptEngine {
    /// Create an engine enforcing `max_connections` across all listeners.
    pub fn new(max_connections: usize, tracker: ConnectionTracker) -> Self {
        let (session_stop_tx, _) = watch::channel(false);
        Self {
            tracker,
            connection_limit: Arc::new(Semaphore::new(max_connections)),
            workers: HashMap::new(),
            session_stop_tx,
        }
    }

    /// Bring accept tasks in line with the registry: spawn tasks for new
    /// stream listeners, stop tasks for listeners no longer present.
    ///
    /// Must run inside a Tokio runtime.
    pub fn sync(&mut self, registry: &ListenerRegistry) {
        let live: Vec<ListenerKey> = registry
            .snapshot()
            .into_iter()
            .filter(|key| {
                registry
                    .get(key)
                    .map(|record| record.transport() == Transport::Stream)
                    .unwrap_or(false)
            })
            .collect();

        let stale: Vec<ListenerKey> = self
            .workers
            .keys()
            .filter(|key| !live.contains(key))
            .cloned()
            .collect();
        for key in stale {
            if let Some(worker) = self.workers.remove(&key) {
                let _ = worker.stop_tx.send(true);
                tracing::debug!(listener = %key, "Accept task stopped");
            }
        }

        for key in live {
            if self.workers.contains_key(&key) {
                continue;
            }
            let Some(record) = registry.get(&key) else {
                continue;
            };

            let listener = match record.clone_stream_listener() {
                Ok(std_listener) => match tokio::net::TcpListener::from_std(std_listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        tracing::error!(listener = %key, error = %e, "Failed to register listener with the runtime");
                        continue;
                    }
                },
                Err(e) => {
                    tracing::error!(listener = %key, error = %e, "Failed to duplicate listener descriptor");
                    continue;
                }
            };

            let (stop_tx, stop_rx) = watch::channel(false);
            let tracker = self.tracker.clone();
            let limit = Arc::clone(&self.connection_limit);
            let session_stop = self.session_stop_tx.subscribe();
            let task_key = key.clone();
            tokio::spawn(async move {
                accept_loop(task_key, listener, stop_rx, session_stop, tracker, limit).await;
            });

            self.workers.insert(key.clone(), ListenerWorker { stop_tx });
            tracing::debug!(listener = %key, "Accept task started");
        }
    }

    /// Stop every accept task and tell live sessions to finish up.
    pub fn stop_all(&mut self) {
        for (key, worker) in self.workers.drain() {
            let _ = worker.stop_tx.send(true);
            tracing::debug!(listener = %key, "Accept task stopped");
        }
        let _ = self.session_stop_tx.send(true);
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Connection slots still available under the global limit.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }
}

async fn accept_loop(
    key: ListenerKey,
    listener: tokio::net::TcpListener,
    mut stop_rx: watch::Receiver<bool>,
    session_stop: watch::Receiver<bool>,
    tracker: ConnectionTracker,
    limit: Arc<Semaphore>,
) {
    loop {
        // Acquire a slot before accepting so the limit backpressures the
        // kernel queue instead of our memory.
        let permit = tokio::select! {
            _ = stop_rx.changed() => break,
            permit = Arc::clone(&limit).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let (stream, peer) = tokio::select! {
            _ = stop_rx.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(listener = %key, error = %e, "Accept failed");
                    continue;
                }
            },
        };

        let guard = tracker.track(peer);
        tracing::debug!(
            listener = %key,
            peer = %peer,
            connection_id = %guard.id(),
            available_permits = limit.available_permits(),
            "Connection accepted"
        );
        tokio::spawn(session::run(stream, peer, guard, permit, session_stop.clone()));
    }
    tracing::debug!(listener = %key, "Accept loop exited");
}
