//! # eventree
//!
//! **Eventree** is a hierarchical, typed, in-process event bus for Rust.
//!
//! It lets independent components publish domain events without knowing
//! their subscribers, and lets subscribers register typed listeners without
//! knowing publishers. Nodes nest into a tree with scoped teardown, the last
//! event per capability is replayed to late subscribers ("sticky"), and all
//! receiver callbacks run on one serialized delivery context.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Publisher   │   │  Publisher   │   │  Publisher   │
//!     │ (capability  │   │ (capability  │   │ (capability  │
//!     │   "project") │   │   "vfs")     │   │   "audit")   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ publish()        │                  │
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus node                                                    │
//! │  - receivers:  EventTypeId → insertion-ordered receiver set       │
//! │  - sticky:     EventTypeId → last Event (replayed to late subs)   │
//! │  - publishers: EventTypeId → memoized Publisher                   │
//! │  - children:   owned child nodes (closed recursively)             │
//! └──────────────┬────────────────────────────────────────────────────┘
//!                │ stage 1 (write lock): sticky.insert + snapshot
//!                │ stage 2 (channel):    fan-out job
//!                ▼
//!      ┌──────────────────────┐
//!      │   delivery worker    │   one per tree, callbacks strictly
//!      │     (serialized)     │   one-at-a-time, panics isolated
//!      └──────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! RootBus::bootstrap(registry, manifest)
//!   ├─► EventBus::new()                 (tree root + delivery worker)
//!   ├─► self connection = bus.connect()
//!   └─► for each manifest entry:        (best-effort, logged, reported)
//!         registry binder ──► connection.subscribe(type, factory())
//!
//! bus.child() ──► nested node, shares the delivery worker
//! bus.close(false) ──► clear receivers + sticky, cascade into children
//! bus.close(true)  ──► delegate up to the root, close the whole tree
//! root.close()     ──► disconnect self connection, then close(false)
//! ```
//!
//! ## Features
//! | Area            | Description                                                      | Key types / traits                      |
//! |-----------------|------------------------------------------------------------------|-----------------------------------------|
//! | **Capabilities**| Listener interfaces described as data, no runtime codegen.       | [`Capability`], [`EventType`]           |
//! | **Publishing**  | Memoized typed publishers recording replayable events.           | [`Publisher`], [`Event`]                |
//! | **Sticky**      | Late subscribers synchronously observe the last event per type.  | [`EventBus::subscribe`]                 |
//! | **Scoping**     | Bulk unsubscription via connections; tree-wide teardown.         | [`Connection`], [`EventBus::close`]     |
//! | **Bootstrap**   | Manifest-driven built-in subscribers, best-effort per entry.     | [`RootBus`], [`BootstrapRegistry`]      |
//! | **Errors**      | Typed errors for replay and bootstrap.                           | [`BusError`], [`BootstrapError`]        |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use eventree::{Capability, EventBus, EventType};
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
//!
//! const PROJECT: EventType<ProjectEvents> = EventType::of();
//!
//! struct Print;
//!
//! impl ProjectListener for Print {
//!     fn opened(&self, name: &str) {
//!         println!("opened {name}");
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bus = EventBus::new();
//!
//!     // Publish before anyone listens: the event still becomes sticky.
//!     bus.publisher_for(PROJECT)
//!         .publish(ProjectCall::Opened("demo".into()));
//!
//!     // The late subscriber catches up synchronously via sticky replay.
//!     bus.subscribe(PROJECT, Arc::new(Print) as Arc<dyn ProjectListener>);
//!
//!     bus.close(false);
//! }
//! ```

mod core;
mod error;
mod events;
mod root;

// ---- Public re-exports ----

pub use crate::core::{Connection, EventBus, Publisher};
pub use crate::error::{BootstrapError, BusError};
pub use crate::events::{Capability, Event, EventType, EventTypeId};
pub use crate::root::{BootstrapRegistry, BootstrapReport, Manifest, RootBus};

#[cfg(test)]
pub(crate) mod testing;
