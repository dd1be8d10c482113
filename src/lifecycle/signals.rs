//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal control events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A second shutdown signal during drain forces immediate exit; that
//!   policy lives in the run loop, not here
//! - SIGHUP triggers a rehash, not shutdown

use std::io;

/// Control events derived from OS signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Reload configuration and reconcile listeners (SIGHUP).
    Rehash,
    /// Begin graceful shutdown (SIGTERM, SIGINT).
    Shutdown,
}

/// Registered signal streams, consumed by the daemon run loop.
#[cfg(unix)]
pub struct Signals {
    hangup: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    interrupt: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    pub fn new() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            hangup: signal(SignalKind::hangup())?,
            terminate: signal(SignalKind::terminate())?,
            interrupt: signal(SignalKind::interrupt())?,
        })
    }

    /// Wait for the next signal and translate it.
    ///
    /// A closed signal stream is treated as a shutdown request; there is
    /// nothing useful to wait for once the streams are gone.
    pub async fn next_signal(&mut self) -> ControlEvent {
        tokio::select! {
            result = self.hangup.recv() => match result {
                Some(()) => ControlEvent::Rehash,
                None => ControlEvent::Shutdown,
            },
            _ = self.terminate.recv() => ControlEvent::Shutdown,
            _ = self.interrupt.recv() => ControlEvent::Shutdown,
        }
    }
}

/// Fallback for platforms without Unix signals: Ctrl-C shuts down and
/// rehash is driven by the config watcher alone.
#[cfg(not(unix))]
pub struct Signals;

#[cfg(not(unix))]
impl Signals {
    pub fn new() -> io::Result<Self> {
        Ok(Self)
    }

    pub async fn next_signal(&mut self) -> ControlEvent {
        let _ = tokio::signal::ctrl_c().await;
        ControlEvent::Shutdown
    }
}

