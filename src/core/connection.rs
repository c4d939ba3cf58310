//! # Scoped connections: bulk unsubscription without bookkeeping.
//!
//! A [`Connection`] proxies `subscribe`/`unsubscribe` to its owning node
//! while remembering every pair registered through it. `disconnect` then
//! removes exactly those pairs — no more, no less — so a component can tear
//! down all of its subscriptions without tracking them individually.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::core::node::{NodeCore, ReceiverHandle};
use crate::events::{Capability, EventType, EventTypeId};

/// Scoped subscription handle bound to one bus node.
///
/// Lives exactly as long as the caller holds it; subscriptions made through
/// it must be released with [`Connection::disconnect`] (dropping the
/// connection does not unsubscribe).
pub struct Connection {
    node: Weak<NodeCore>,
    recorded: Mutex<Vec<(EventTypeId, ReceiverHandle)>>,
}

impl Connection {
    pub(crate) fn new(node: &Arc<NodeCore>) -> Self {
        Self {
            node: Arc::downgrade(node),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Subscribes `listener` on the owning node and records the pair.
    ///
    /// The pair is recorded before the node registration, so a panicking
    /// sticky replay still leaves the subscription covered by `disconnect`.
    /// No-op if the owning node is gone.
    pub fn subscribe<C: Capability>(&self, event_type: EventType<C>, listener: Arc<C::Listener>) {
        let Some(core) = self.node.upgrade() else {
            return;
        };
        let handle = ReceiverHandle::new::<C>(&listener);
        self.recorded_lock()
            .push((event_type.id(), handle.clone()));
        core.subscribe_handle(event_type.id(), handle);
    }

    /// Unsubscribes `listener` from the owning node and forgets the pair.
    pub fn unsubscribe<C: Capability>(
        &self,
        event_type: EventType<C>,
        listener: &Arc<C::Listener>,
    ) {
        let id = event_type.id();
        let key = ReceiverHandle::new::<C>(listener).key();
        self.recorded_lock()
            .retain(|(recorded_id, handle)| !(*recorded_id == id && handle.key() == key));
        if let Some(core) = self.node.upgrade() {
            core.unsubscribe_key(id, key);
        }
    }

    /// Unsubscribes every pair registered through this connection.
    ///
    /// Idempotent: the record is drained on the first call, so later calls
    /// are no-ops.
    pub fn disconnect(&self) {
        let pairs = std::mem::take(&mut *self.recorded_lock());
        if let Some(core) = self.node.upgrade() {
            for (id, handle) in pairs {
                core.unsubscribe_key(id, handle.key());
            }
        }
    }

    fn recorded_lock(&self) -> std::sync::MutexGuard<'_, Vec<(EventTypeId, ReceiverHandle)>> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::testing::{journal, lines, settle, wait_until, Probe, ProjectListener, PROJECT};
    use crate::EventBus;

    #[tokio::test]
    async fn test_disconnect_removes_connection_subscriptions() {
        let bus = EventBus::new();
        let connection = bus.connect();

        let log = journal();
        connection.subscribe(PROJECT, Probe::listener("r3", &log));
        connection.disconnect();

        bus.publisher_for(PROJECT).opened("x");
        settle().await;
        assert!(lines(&log).is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_leaves_direct_subscriptions_alone() {
        let bus = EventBus::new();
        let connection = bus.connect();

        let log = journal();
        bus.subscribe(PROJECT, Probe::listener("direct", &log));
        connection.subscribe(PROJECT, Probe::listener("scoped", &log));
        connection.disconnect();

        bus.publisher_for(PROJECT).opened("x");
        wait_until(|| lines(&log) == vec!["direct:opened:x"]).await;
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let bus = EventBus::new();
        let connection = bus.connect();

        let log = journal();
        connection.subscribe(PROJECT, Probe::listener("scoped", &log));
        connection.disconnect();
        connection.disconnect();

        // A fresh subscription after disconnect works as usual.
        bus.subscribe(PROJECT, Probe::listener("again", &log));
        bus.publisher_for(PROJECT).opened("x");
        wait_until(|| lines(&log) == vec!["again:opened:x"]).await;
    }

    #[tokio::test]
    async fn test_connection_unsubscribe_forgets_the_pair() {
        let bus = EventBus::new();
        let connection = bus.connect();

        let log = journal();
        let scoped = Probe::listener("scoped", &log);
        connection.subscribe(PROJECT, Arc::clone(&scoped));
        connection.unsubscribe(PROJECT, &scoped);

        // Re-subscribed directly: disconnect must not remove it, the pair
        // was already forgotten.
        bus.subscribe(PROJECT, Arc::clone(&scoped));
        connection.disconnect();

        bus.publisher_for(PROJECT).opened("x");
        wait_until(|| lines(&log) == vec!["scoped:opened:x"]).await;
    }

    #[tokio::test]
    async fn test_connection_subscription_gets_sticky_replay() {
        let bus = EventBus::new();
        bus.publisher_for(PROJECT).opened("x");

        let connection = bus.connect();
        let log = journal();
        connection.subscribe(PROJECT, Probe::listener("scoped", &log));
        assert_eq!(lines(&log), vec!["scoped:opened:x"]);
    }
}
