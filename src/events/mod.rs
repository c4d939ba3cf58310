//! Event data model: capabilities, typed event keys, and recorded events.
//!
//! This module groups the **value types** of the bus. Nothing here owns state
//! or schedules work; that is the job of the node runtime in `core/`.
//!
//! ## Contents
//! - [`Capability`] describes one listener interface as data: a name, an
//!   object-safe listener trait, and an invocation record type
//! - [`EventType`], [`EventTypeId`] typed/erased keys identifying a capability
//! - [`Event`] an immutable, replayable record of one capability method call
//!
//! ## Quick reference
//! - **Producers**: `Publisher::publish` records an [`Event`] per method call.
//! - **Consumers**: the delivery worker and sticky replay call `Event::replay`
//!   against erased receiver handles.
//!
//! See `core/mod.rs` for the system-level wiring diagram.

mod capability;
mod event;

pub use capability::{Capability, EventType, EventTypeId};
pub use event::Event;
