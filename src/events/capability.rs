//! # Capabilities: listener interfaces described as data.
//!
//! A capability is a named set of callback methods that receivers implement
//! and publishers invoke. There is no runtime reflection in Rust, so a
//! capability describes itself in code instead of being discovered from an
//! interface object:
//!
//! - [`Capability::Listener`] is the object-safe trait receivers implement;
//! - [`Capability::Invocation`] records one method call with its arguments,
//!   typically an enum with one variant per method;
//! - [`Capability::deliver`] replays a recorded call against a listener.
//!
//! Because an `Invocation` value cannot name a method outside its own enum,
//! the "target method belongs to the capability" invariant holds by
//! construction.
//!
//! ## Example
//! ```rust
//! use eventree::Capability;
//!
//! trait ProjectListener: Send + Sync {
//!     fn opened(&self, name: &str);
//! }
//!
//! struct ProjectEvents;
//!
//! #[derive(Clone)]
//! enum ProjectCall {
//!     Opened(String),
//! }
//!
//! impl Capability for ProjectEvents {
//!     const NAME: &'static str = "project";
//!     type Listener = dyn ProjectListener;
//!     type Invocation = ProjectCall;
//!
//!     fn deliver(invocation: &ProjectCall, listener: &dyn ProjectListener) {
//!         match invocation {
//!             ProjectCall::Opened(name) => listener.opened(name),
//!         }
//!     }
//!
//!     fn method(invocation: &ProjectCall) -> &'static str {
//!         match invocation {
//!             ProjectCall::Opened(_) => "opened",
//!         }
//!     }
//! }
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Describes one listener capability: its name, listener trait, and the
/// record type for invocations of its methods.
///
/// Implementations are zero-sized marker types defined once per capability
/// by the code that owns the listener trait. The bus never instantiates a
/// capability; it only uses the associated items.
pub trait Capability: 'static {
    /// Stable capability identifier.
    ///
    /// Doubles as the manifest key during root bootstrap, so it should not
    /// change between releases.
    const NAME: &'static str;

    /// Object-safe callback interface receivers implement.
    type Listener: ?Sized + Send + Sync + 'static;

    /// One recorded method call with its captured arguments.
    type Invocation: Clone + Send + Sync + 'static;

    /// Replays one recorded call against a listener.
    fn deliver(invocation: &Self::Invocation, listener: &Self::Listener);

    /// Method identity of a recorded call, for diagnostics.
    fn method(invocation: &Self::Invocation) -> &'static str;
}

/// Typed handle identifying a capability `C`.
///
/// Zero-sized and const-constructible; defining code usually exposes one as
/// a `const`. Equality and hashing of the erased [`EventTypeId`] go by the
/// capability's `TypeId`, so the handle can key every per-node map.
pub struct EventType<C: Capability> {
    _capability: PhantomData<fn(C)>,
}

impl<C: Capability> EventType<C> {
    /// Returns the handle for capability `C`.
    pub const fn of() -> Self {
        Self {
            _capability: PhantomData,
        }
    }

    /// Erases the handle into a map key.
    pub fn id(self) -> EventTypeId {
        EventTypeId {
            type_id: TypeId::of::<C>(),
            name: C::NAME,
        }
    }
}

impl<C: Capability> Clone for EventType<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Capability> Copy for EventType<C> {}

impl<C: Capability> Default for EventType<C> {
    fn default() -> Self {
        Self::of()
    }
}

impl<C: Capability> fmt::Debug for EventType<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&C::NAME).finish()
    }
}

impl<C: Capability> PartialEq for EventType<C> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<C: Capability> Eq for EventType<C> {}

/// Erased capability identity: the key of every per-node map.
///
/// Compares and hashes by the capability's `TypeId`; carries the capability
/// name only for diagnostics.
#[derive(Clone, Copy, Eq)]
pub struct EventTypeId {
    type_id: TypeId,
    name: &'static str,
}

impl EventTypeId {
    /// Capability name this id was erased from.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Hash for EventTypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for EventTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventTypeId").field(&self.name).finish()
    }
}
