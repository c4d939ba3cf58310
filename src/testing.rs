//! Shared test fixtures: two small capabilities, a journaling probe
//! listener, a panicking listener, and bounded-wait helpers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::Publisher;
use crate::events::{Capability, EventType};

// ---- Project capability ----

pub(crate) trait ProjectListener: Send + Sync {
    fn opened(&self, name: &str);
    fn saved(&self, name: &str, revision: u32);
}

pub(crate) struct ProjectEvents;

#[derive(Clone, Debug)]
pub(crate) enum ProjectCall {
    Opened(String),
    Saved(String, u32),
}

impl Capability for ProjectEvents {
    const NAME: &'static str = "project";
    type Listener = dyn ProjectListener;
    type Invocation = ProjectCall;

    fn deliver(invocation: &ProjectCall, listener: &dyn ProjectListener) {
        match invocation {
            ProjectCall::Opened(name) => listener.opened(name),
            ProjectCall::Saved(name, revision) => listener.saved(name, *revision),
        }
    }

    fn method(invocation: &ProjectCall) -> &'static str {
        match invocation {
            ProjectCall::Opened(_) => "opened",
            ProjectCall::Saved(..) => "saved",
        }
    }
}

pub(crate) const PROJECT: EventType<ProjectEvents> = EventType::of();

// Call-site sugar: publishing reads like invoking the listener directly.
impl ProjectListener for Publisher<ProjectEvents> {
    fn opened(&self, name: &str) {
        self.publish(ProjectCall::Opened(name.to_owned()));
    }

    fn saved(&self, name: &str, revision: u32) {
        self.publish(ProjectCall::Saved(name.to_owned(), revision));
    }
}

// ---- Audit capability (for cross-capability isolation tests) ----

pub(crate) trait AuditListener: Send + Sync {
    fn note(&self, line: &str);
}

pub(crate) struct AuditEvents;

#[derive(Clone, Debug)]
pub(crate) struct AuditCall(pub(crate) String);

impl Capability for AuditEvents {
    const NAME: &'static str = "audit";
    type Listener = dyn AuditListener;
    type Invocation = AuditCall;

    fn deliver(invocation: &AuditCall, listener: &dyn AuditListener) {
        listener.note(&invocation.0);
    }

    fn method(_invocation: &AuditCall) -> &'static str {
        "note"
    }
}

pub(crate) const AUDIT: EventType<AuditEvents> = EventType::of();

// ---- Probes ----

pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

pub(crate) fn journal() -> Journal {
    init_tracing();
    Arc::new(Mutex::new(Vec::new()))
}

/// Routes bus log output through the test harness; opt in with `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn lines(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Listener that appends `"<label>:<method>:<args>"` lines to a shared
/// journal, so tests can assert on cross-receiver ordering.
pub(crate) struct Probe {
    label: &'static str,
    journal: Journal,
}

impl Probe {
    pub(crate) fn listener(label: &'static str, journal: &Journal) -> Arc<dyn ProjectListener> {
        Arc::new(Self {
            label,
            journal: Arc::clone(journal),
        })
    }

    pub(crate) fn audit_listener(label: &'static str, journal: &Journal) -> Arc<dyn AuditListener> {
        Arc::new(Self {
            label,
            journal: Arc::clone(journal),
        })
    }

    fn push(&self, line: String) {
        self.journal.lock().unwrap().push(line);
    }
}

impl ProjectListener for Probe {
    fn opened(&self, name: &str) {
        self.push(format!("{}:opened:{name}", self.label));
    }

    fn saved(&self, name: &str, revision: u32) {
        self.push(format!("{}:saved:{name}:{revision}", self.label));
    }
}

impl AuditListener for Probe {
    fn note(&self, line: &str) {
        self.push(format!("{}:note:{line}", self.label));
    }
}

/// Listener that panics on its first callback and journals the rest.
pub(crate) struct TripWire {
    label: &'static str,
    journal: Journal,
    armed: AtomicBool,
}

impl TripWire {
    pub(crate) fn listener(label: &'static str, journal: &Journal) -> Arc<dyn ProjectListener> {
        Arc::new(Self {
            label,
            journal: Arc::clone(journal),
            armed: AtomicBool::new(true),
        })
    }

    fn record(&self, line: String) {
        if self.armed.swap(false, Ordering::SeqCst) {
            panic!("tripwire");
        }
        self.journal.lock().unwrap().push(line);
    }
}

impl ProjectListener for TripWire {
    fn opened(&self, name: &str) {
        self.record(format!("{}:opened:{name}", self.label));
    }

    fn saved(&self, name: &str, revision: u32) {
        self.record(format!("{}:saved:{name}:{revision}", self.label));
    }
}

/// Listener that panics on every callback.
pub(crate) struct Grenade;

impl ProjectListener for Grenade {
    fn opened(&self, _name: &str) {
        panic!("grenade");
    }

    fn saved(&self, _name: &str, _revision: u32) {
        panic!("grenade");
    }
}

// ---- Waiting helpers ----

/// Polls `condition` until it holds, failing the test after two seconds.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    let outcome = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(outcome.is_ok(), "condition not reached within 2s");
}

/// Gives in-flight deliveries time to land, for negative assertions.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
