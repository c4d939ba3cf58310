//! # Typed publishers: the synthesized side of a capability.
//!
//! A [`Publisher`] stands in for "every receiver of this capability on this
//! node". Invoking a capability method on it does not call anyone directly;
//! it records an [`Event`](crate::Event) and hands it to dispatch, which
//! replays it asynchronously against the current receiver set.
//!
//! There is no runtime proxy generation in Rust, so the synthesized object
//! is an invocation recorder instead: [`Publisher::publish`] accepts the
//! capability's invocation record. Capability authors usually implement the
//! listener trait for `Publisher<C>` so call sites read like direct method
//! invocations:
//!
//! ```text
//! impl ProjectListener for Publisher<ProjectEvents> {
//!     fn opened(&self, name: &str) {
//!         self.publish(ProjectCall::Opened(name.to_owned()));
//!     }
//! }
//! ```
//!
//! Publishers are memoized per (node, capability) and hold only a weak
//! reference to their node: the node's cache cannot keep the node alive
//! through its own publishers.

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::core::node::NodeCore;
use crate::events::{Capability, Event, EventType};

/// Memoized, cloneable publisher for capability `C` on one bus node.
///
/// Two publishers compare equal iff they are the same underlying synthesized
/// instance, so memoization is observable with `==`.
pub struct Publisher<C: Capability> {
    inner: Arc<PublisherCore<C>>,
}

struct PublisherCore<C: Capability> {
    node: Weak<NodeCore>,
    event_type: EventType<C>,
}

impl<C: Capability> Publisher<C> {
    pub(crate) fn new(node: Weak<NodeCore>, event_type: EventType<C>) -> Self {
        Self {
            inner: Arc::new(PublisherCore { node, event_type }),
        }
    }

    /// Records one invocation and hands it to dispatch.
    ///
    /// Non-blocking and fire-and-forget: the sticky cache is updated and the
    /// receiver snapshot taken before this returns, delivery happens later on
    /// the tree's serialized worker. If the node is gone or closed the event
    /// is dropped.
    pub fn publish(&self, invocation: C::Invocation) {
        match self.inner.node.upgrade() {
            Some(core) => core.dispatch(Event::record(self.inner.event_type, invocation)),
            None => debug!(capability = C::NAME, "event dropped: bus node gone"),
        }
    }

    /// The capability this publisher was synthesized for.
    pub fn event_type(&self) -> EventType<C> {
        self.inner.event_type
    }
}

impl<C: Capability> Clone for Publisher<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Capability> PartialEq for Publisher<C> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<C: Capability> Eq for Publisher<C> {}

impl<C: Capability> fmt::Debug for Publisher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Publisher").field(&C::NAME).finish()
    }
}
