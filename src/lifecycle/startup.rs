//! Daemon orchestration: startup, rehash, run loop, shutdown.
//!
//! # Responsibilities
//! - Bind the configured listeners and refuse to start without any
//! - Apply rehashes from SIGHUP and the config file watcher
//! - Keep accept tasks, metrics, and the stored config in step with
//!   every reconciliation pass
//! - Drain connections on shutdown, with a forced path
//!
//! # Design Decisions
//! - Startup is fail-fast: zero bound listeners is fatal
//! - A failed rehash keeps the previous configuration and listeners
//! - The current config lives in an ArcSwap so background tasks read it
//!   without locking

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use thiserror::Error;

use crate::config::loader::load_config;
use crate::config::schema::DaemonConfig;
use crate::config::watcher::ConfigWatcher;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{ControlEvent, Signals};
use crate::net::connection::ConnectionTracker;
use crate::net::reconcile::{reconcile, ReconcileReport};
use crate::net::registry::ListenerRegistry;
use crate::observability::events::{BindEventSink, TracingSink};
use crate::observability::metrics;
use crate::server::engine::AcceptEngine;

/// How long shutdown waits for live connections before giving up.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("no listeners could be bound ({failed} attempts failed)")]
    NoListeners { failed: usize },
    #[error("signal handler registration failed: {0}")]
    Signals(#[from] std::io::Error),
}

/// The daemon: owns the listener registry, accept engine, and current
/// configuration for its whole lifetime.
pub struct Daemon {
    config: ArcSwap<DaemonConfig>,
    registry: ListenerRegistry,
    engine: AcceptEngine,
    tracker: ConnectionTracker,
    shutdown: Shutdown,
    sink: Box<dyn BindEventSink>,
}

impl Daemon {
    pub fn new(config: DaemonConfig) -> Self {
        Self::with_sink(config, Box::new(TracingSink))
    }

    /// Build a daemon reporting listener events to a caller-supplied sink.
    pub fn with_sink(config: DaemonConfig, sink: Box<dyn BindEventSink>) -> Self {
        let tracker = ConnectionTracker::new();
        let engine = AcceptEngine::new(config.limits.max_connections, tracker.clone());
        Self {
            config: ArcSwap::from_pointee(config),
            registry: ListenerRegistry::new(),
            engine,
            tracker,
            shutdown: Shutdown::new(),
            sink,
        }
    }

    /// Bind the configured listeners. Fatal when none bind; a daemon
    /// that cannot accept anything has no reason to keep running.
    ///
    /// Must run inside a Tokio runtime.
    pub fn start(&mut self) -> Result<ReconcileReport, StartupError> {
        let config = self.config.load_full();
        tracing::info!(
            server = %config.server.name,
            network = %config.server.network,
            bind_entries = config.bind.len(),
            "Binding listeners"
        );
        let report = self.reconcile_against(&config).unwrap_or_default();
        if self.registry.is_empty() {
            return Err(StartupError::NoListeners {
                failed: report.failures.len(),
            });
        }
        Ok(report)
    }

    /// Apply a new configuration: reconcile listeners, then publish the
    /// config. Per-entry failures are reported, never fatal. A config
    /// whose bind entries fail to expand is discarded whole; the
    /// previous configuration and listeners stay in effect.
    pub fn rehash(&mut self, config: DaemonConfig) -> ReconcileReport {
        match self.reconcile_against(&config) {
            Some(report) => {
                self.config.store(Arc::new(config));
                report
            }
            None => ReconcileReport::default(),
        }
    }

    /// Reconcile listeners against `config`; None means the bind entries
    /// could not be expanded and the live set was left untouched.
    fn reconcile_against(&mut self, config: &DaemonConfig) -> Option<ReconcileReport> {
        let specs = match config.bind_specs() {
            Ok(specs) => specs,
            Err(e) => {
                // Validated configs expand cleanly; reaching this means the
                // config skipped validation, so leave listeners alone.
                tracing::error!(error = %e, "Bind expansion failed, keeping current listeners");
                return None;
            }
        };

        let report = reconcile(&mut self.registry, &specs, self.sink.as_ref());
        self.engine.sync(&self.registry);
        metrics::record_reconcile(&report, self.registry.len());
        tracing::info!(
            bound = report.bound,
            unchanged = report.unchanged,
            failed = report.failures.len(),
            removed = report.removed.len(),
            live = self.registry.len(),
            "Listener reconciliation finished"
        );
        Some(report)
    }

    /// Serve until a shutdown signal arrives, rehashing on SIGHUP and on
    /// config file changes.
    pub async fn run(mut self, config_path: &Path) -> Result<(), StartupError> {
        let mut signals = Signals::new()?;

        let (watcher, mut updates) = ConfigWatcher::new(config_path);
        let _watcher_guard = match watcher.run() {
            Ok(guard) => Some(guard),
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher unavailable, rehash via SIGHUP only");
                None
            }
        };

        loop {
            tokio::select! {
                event = signals.next_signal() => match event {
                    ControlEvent::Rehash => {
                        tracing::info!("Rehash requested by signal");
                        match load_config(config_path) {
                            Ok(config) => {
                                self.rehash(config);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Rehash aborted, keeping current configuration");
                            }
                        }
                    }
                    ControlEvent::Shutdown => break,
                },
                update = updates.recv() => {
                    if let Some(config) = update {
                        tracing::info!("Rehash requested by config file change");
                        self.rehash(config);
                    }
                }
            }
        }

        self.shutdown_gracefully(&mut signals).await;
        Ok(())
    }

    async fn shutdown_gracefully(&mut self, signals: &mut Signals) {
        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Shutting down, draining connections"
        );
        self.engine.stop_all();
        self.shutdown.trigger();

        tokio::select! {
            drained = self.tracker.drain(DRAIN_TIMEOUT) => {
                if drained {
                    tracing::info!("Drain complete");
                } else {
                    tracing::warn!(
                        remaining = self.tracker.active_count(),
                        "Drain deadline passed, closing anyway"
                    );
                }
            }
            _ = wait_for_forced_shutdown(signals) => {
                tracing::warn!("Second shutdown signal, skipping drain");
            }
        }

        let closed = self.registry.clear();
        tracing::info!(listeners_closed = closed, "Shutdown complete");
    }

    /// Subscribe auxiliary tasks to the daemon's shutdown broadcast.
    pub fn shutdown_handle(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Listener keys currently bound, in key order.
    pub fn listeners(&self) -> Vec<crate::net::registry::ListenerKey> {
        self.registry.snapshot()
    }

    pub fn active_connections(&self) -> usize {
        self.tracker.active_count()
    }

    /// The configuration currently in effect.
    pub fn current_config(&self) -> Arc<DaemonConfig> {
        self.config.load_full()
    }
}

async fn wait_for_forced_shutdown(signals: &mut Signals) {
    loop {
        if signals.next_signal().await == ControlEvent::Shutdown {
            return;
        }
    }
}
