//! Shared utilities for listener lifecycle integration tests.

use std::sync::Mutex;

use hearthd::net::reconcile::BindSpec;
use hearthd::observability::{BindEvent, BindEventSink, BindOutcome};

/// Ask the kernel for a port that is free right now.
///
/// The probe socket closes before the caller binds, so a parallel test
/// could race for the port; failures show up as bind errors, not hangs.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
    listener.local_addr().unwrap().port()
}

/// A loopback client listener spec with a small backlog.
pub fn client_spec(address: &str, port: u16) -> BindSpec {
    BindSpec::client(address, port, 8)
}

/// Sink that records every listener event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BindEvent>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BindEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Outcomes recorded for `port`, in emission order.
    pub fn outcomes_for(&self, port: u16) -> Vec<BindOutcome> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.port == port)
            .map(|event| event.outcome)
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl BindEventSink for RecordingSink {
    fn record(&self, event: BindEvent) {
        self.events.lock().unwrap().push(event);
    }
}
