//! Runtime core: bus nodes, dispatch, and scoped subscriptions.
//!
//! This module contains the stateful half of the crate. The value types from
//! `events/` flow through it but never own anything; everything that locks,
//! caches, or schedules lives here.
//!
//! Internal modules:
//! - [`node`]: the bus node — receiver sets, sticky cache, publisher cache,
//!   parent/child links, close semantics;
//! - [`dispatch`]: shared delivery worker — pooled fan-out handoff plus the
//!   serialized execution context for receiver callbacks;
//! - [`publisher`]: memoized typed publishers that record invocations;
//! - [`connection`]: scoped subscription handles for bulk unsubscription.

mod connection;
mod dispatch;
mod node;
mod publisher;

pub use connection::Connection;
pub use node::EventBus;
pub use publisher::Publisher;
