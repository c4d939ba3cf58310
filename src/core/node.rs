//! # Bus node: receiver sets, sticky cache, publisher cache, and the tree.
//!
//! [`EventBus`] is one node of the distribution mechanism. Nodes nest: a
//! child created via [`EventBus::child`] is owned by its parent (the parent
//! can cascade-close it), while the child only keeps a non-owning back
//! reference so the relation can never form a cycle.
//!
//! ## Architecture
//! ```text
//! Callers (many):                       One node:
//!   publisher.method(args)               ┌─────────────────────────────┐
//!        │                               │ RwLock over:                │
//!        ▼                               │   receivers: type → set     │
//!   Event::record ── dispatch ──────────►│   sticky:    type → Event   │
//!                       │                │   publishers: type → proxy  │
//!        stage 1 (write lock):           │   children, closed flag     │
//!          sticky.insert + snapshot      └──────────────┬──────────────┘
//!        stage 2 (no lock):                             │ shared per tree
//!          Dispatcher::enqueue ────► delivery worker ───┴► one callback
//!                                    (serialized)          at a time
//! ```
//!
//! ## Rules
//! - **Publish never blocks**: stage 1 is a short write-lock hold, stage 2 is
//!   a channel send. Receiver failures never reach the publisher.
//! - **Sticky before delivery**: the Nth publish's event becomes sticky under
//!   the same lock hold that snapshots the receivers, so sticky updates are
//!   linearized per capability.
//! - **Set semantics**: a receiver (by `Arc` identity) appears at most once
//!   per capability; snapshot iteration is insertion order.
//! - **Close is a barrier**: the `closed` flag stops new dispatch; `subscribe`,
//!   `publisher_for`, `connect`, and `child` on a closed node panic — using a
//!   node after close is a programmer error.
//!
//! A subscriber that registers between a publish's record phase and its
//! delivery phase may observe the same event twice: once via sticky replay
//! and once via live delivery. This is an accepted, documented race.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tracing::{debug, warn};

use crate::core::connection::Connection;
use crate::core::dispatch::Dispatcher;
use crate::core::publisher::Publisher;
use crate::events::{Capability, Event, EventType, EventTypeId};

/// One node of the hierarchical event bus.
///
/// Cheaply cloneable handle; clones refer to the same underlying node.
/// Created standalone via [`EventBus::new`] (the root of its own tree) or
/// nested via [`EventBus::child`].
///
/// ### Notes
/// Construction spawns the tree's delivery worker on first use, so a tree
/// root must be created inside a Tokio runtime.
#[derive(Clone)]
pub struct EventBus {
    core: Arc<NodeCore>,
}

impl EventBus {
    /// Creates a standalone node that is the root of its own tree.
    ///
    /// The node owns a fresh delivery worker shared with any children
    /// created under it.
    pub fn new() -> Self {
        Self {
            core: Arc::new(NodeCore {
                parent: Weak::new(),
                is_root: true,
                dispatcher: Dispatcher::start(),
                state: RwLock::new(NodeState::default()),
            }),
        }
    }

    /// Creates a nested node owned by this one.
    ///
    /// The child shares the tree's delivery worker and is closed recursively
    /// when this node closes. Its back reference to `self` is non-owning.
    pub fn child(&self) -> EventBus {
        let child = Arc::new(NodeCore {
            parent: Arc::downgrade(&self.core),
            is_root: false,
            dispatcher: self.core.dispatcher.clone(),
            state: RwLock::new(NodeState::default()),
        });
        let mut st = self.core.state_write();
        assert!(!st.closed, "event bus node used after close");
        st.children.push(Arc::clone(&child));
        EventBus { core: child }
    }

    /// Returns the parent node, if this node has one and it is still alive.
    pub fn parent(&self) -> Option<EventBus> {
        self.core.parent.upgrade().map(|core| EventBus { core })
    }

    /// Returns the topmost reachable node of this tree.
    pub fn root(&self) -> EventBus {
        let mut core = Arc::clone(&self.core);
        while let Some(parent) = core.parent.upgrade() {
            core = parent;
        }
        EventBus { core }
    }

    /// Returns the memoized publisher for `event_type`.
    ///
    /// The first call per capability synthesizes the publisher; every later
    /// call — including concurrent ones — observes the same underlying
    /// instance (compare with `==`). Invoking a capability method on the
    /// returned proxy records an [`Event`] and hands it to dispatch.
    pub fn publisher_for<C: Capability>(&self, event_type: EventType<C>) -> Publisher<C> {
        let id = event_type.id();
        {
            let st = self.core.state_read();
            assert!(!st.closed, "event bus node used after close");
            if let Some(publisher) = st
                .publishers
                .get(&id)
                .and_then(|cached| cached.downcast_ref::<Publisher<C>>())
            {
                return publisher.clone();
            }
        }

        let fresh = Publisher::new(Arc::downgrade(&self.core), event_type);
        let mut st = self.core.state_write();
        let slot = st
            .publishers
            .entry(id)
            .or_insert_with(|| Box::new(fresh.clone()));
        match slot.downcast_ref::<Publisher<C>>() {
            Some(publisher) => publisher.clone(),
            // Unreachable through the public API: the key embeds C's TypeId.
            None => {
                *slot = Box::new(fresh.clone());
                fresh
            }
        }
    }

    /// Registers `listener` for `event_type`.
    ///
    /// Membership is by `Arc` identity; subscribing the same listener twice
    /// is a membership no-op. If a sticky event exists for the capability it
    /// is replayed synchronously against this listener alone before the call
    /// returns (on a duplicate subscribe the replay still runs).
    ///
    /// ### Notes
    /// Membership is recorded before the sticky replay runs, so a panicking
    /// replay propagates to the subscriber but leaves the subscription in
    /// place — replay is a courtesy, not a precondition.
    pub fn subscribe<C: Capability>(&self, event_type: EventType<C>, listener: Arc<C::Listener>) {
        let handle = ReceiverHandle::new::<C>(&listener);
        self.core.subscribe_handle(event_type.id(), handle);
    }

    /// Removes `listener` from `event_type`'s receiver set; no-op if absent.
    pub fn unsubscribe<C: Capability>(
        &self,
        event_type: EventType<C>,
        listener: &Arc<C::Listener>,
    ) {
        self.core
            .unsubscribe_key(event_type.id(), receiver_key::<C>(listener));
    }

    /// Empties the receiver set for `event_type`.
    ///
    /// The sticky cache is left untouched: late subscribers still observe
    /// the last event published before the clear.
    pub fn clear_listeners<C: Capability>(&self, event_type: EventType<C>) {
        let mut st = self.core.state_write();
        if let Some(set) = st.receivers.get_mut(&event_type.id()) {
            set.clear();
        }
    }

    /// Returns a new scoped connection bound to this node.
    pub fn connect(&self) -> Connection {
        let st = self.core.state_read();
        assert!(!st.closed, "event bus node used after close");
        drop(st);
        Connection::new(&self.core)
    }

    /// Closes this node, or the whole tree.
    ///
    /// With `close_parent` set and a live parent, the close is delegated up
    /// the chain until it reaches the root, which then closes its entire
    /// subtree. Otherwise this node clears its receivers and sticky cache,
    /// recursively closes every child, and drops its children list.
    ///
    /// Closing twice is a no-op. Racing a close against an in-flight publish
    /// on the same node is a documented hazard: the publish either completes
    /// before the barrier or is dropped.
    pub fn close(&self, close_parent: bool) {
        if close_parent {
            if let Some(parent) = self.parent() {
                parent.close(true);
                return;
            }
        }
        self.core.do_close();
    }

    pub(crate) fn core(&self) -> &Arc<NodeCore> {
        &self.core
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the identity key of a listener: the address of its `Arc` data.
///
/// Stable across `Arc` clones and unsize coercions of the same allocation.
fn receiver_key<C: Capability>(listener: &Arc<C::Listener>) -> usize {
    Arc::as_ptr(listener) as *const () as usize
}

/// Erased receiver registration: identity key plus a downcastable handle
/// holding the typed `Arc<C::Listener>`.
#[derive(Clone)]
pub(crate) struct ReceiverHandle {
    key: usize,
    listener: Arc<dyn Any + Send + Sync>,
}

impl ReceiverHandle {
    pub(crate) fn new<C: Capability>(listener: &Arc<C::Listener>) -> Self {
        Self {
            key: receiver_key::<C>(listener),
            listener: Arc::new(Arc::clone(listener)),
        }
    }

    pub(crate) fn key(&self) -> usize {
        self.key
    }

    /// Erased view for [`Event::replay`].
    pub(crate) fn erased(&self) -> &(dyn Any + Send + Sync) {
        self.listener.as_ref()
    }
}

/// Insertion-ordered set of receivers for one capability.
#[derive(Default)]
struct ReceiverSet {
    entries: Vec<ReceiverHandle>,
}

impl ReceiverSet {
    /// Inserts unless a receiver with the same identity is present.
    fn insert(&mut self, handle: ReceiverHandle) {
        if !self.entries.iter().any(|e| e.key == handle.key) {
            self.entries.push(handle);
        }
    }

    fn remove(&mut self, key: usize) {
        self.entries.retain(|e| e.key != key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn snapshot(&self) -> Vec<ReceiverHandle> {
        self.entries.clone()
    }
}

#[derive(Default)]
struct NodeState {
    receivers: HashMap<EventTypeId, ReceiverSet>,
    sticky: HashMap<EventTypeId, Event>,
    publishers: HashMap<EventTypeId, Box<dyn Any + Send + Sync>>,
    children: Vec<Arc<NodeCore>>,
    closed: bool,
}

/// Shared state of one node. Public API types hold this behind `Arc`;
/// publishers and connections hold it behind `Weak`.
pub(crate) struct NodeCore {
    parent: Weak<NodeCore>,
    is_root: bool,
    dispatcher: Dispatcher,
    state: RwLock<NodeState>,
}

impl NodeCore {
    fn state_read(&self) -> RwLockReadGuard<'_, NodeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_write(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an erased receiver and replays the sticky event, if any.
    ///
    /// The get-or-create of the receiver set is atomic under the write lock;
    /// there is no check-then-insert window that could lose a concurrent
    /// registration. Replay runs after the lock is released so a listener
    /// callback may re-enter the bus.
    pub(crate) fn subscribe_handle(&self, id: EventTypeId, handle: ReceiverHandle) {
        let sticky = {
            let mut st = self.state_write();
            assert!(!st.closed, "event bus node used after close");
            st.receivers.entry(id).or_default().insert(handle.clone());
            st.sticky.get(&id).cloned()
        };

        if let Some(event) = sticky {
            if let Err(err) = event.replay(handle.erased()) {
                warn!(
                    capability = id.name(),
                    error = %err,
                    "sticky replay skipped"
                );
            }
        }
    }

    pub(crate) fn unsubscribe_key(&self, id: EventTypeId, key: usize) {
        let mut st = self.state_write();
        if let Some(set) = st.receivers.get_mut(&id) {
            set.remove(key);
        }
    }

    /// Two-stage dispatch: record sticky + snapshot under the write lock,
    /// then hand the snapshot to the shared delivery worker.
    ///
    /// Publishing with zero receivers still records the sticky event.
    pub(crate) fn dispatch(&self, event: Event) {
        let snapshot = {
            let mut st = self.state_write();
            if st.closed {
                debug!(
                    capability = event.event_type().name(),
                    method = event.method(),
                    "event dropped: node closed"
                );
                return;
            }
            st.sticky.insert(event.event_type(), event.clone());
            st.receivers
                .get(&event.event_type())
                .map(ReceiverSet::snapshot)
                .unwrap_or_default()
        };
        self.dispatcher.enqueue(event, snapshot);
    }

    /// Clears this node and recursively closes every child.
    ///
    /// The publisher cache is deliberately kept: cached proxies hold only a
    /// weak reference back to the node and publishing through them after
    /// close is a silent drop.
    fn do_close(&self) {
        let children = {
            let mut st = self.state_write();
            st.closed = true;
            st.receivers.clear();
            st.sticky.clear();
            std::mem::take(&mut st.children)
        };
        for child in children {
            child.do_close();
        }
        if self.is_root {
            self.dispatcher.shutdown();
        }
    }
}
