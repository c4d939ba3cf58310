//! Root bus: bootstrap of built-in subscribers from a static manifest.
//!
//! The root is an ordinary bus node with one extra behavior at construction:
//! it reads a manifest mapping capability identifiers to implementation
//! identifiers and subscribes a default-constructed instance of each
//! implementation through a self-owned connection. There is no reflection in
//! Rust, so the name-to-constructor resolution goes through an explicit
//! [`BootstrapRegistry`] populated by the host before building the root.
//!
//! Internal modules:
//! - [`bus`]: [`RootBus`] and the per-entry best-effort [`BootstrapReport`];
//! - [`manifest`]: the JSON manifest document;
//! - [`registry`]: capability/implementation binders.

mod bus;
mod manifest;
mod registry;

pub use bus::{BootstrapReport, RootBus};
pub use manifest::Manifest;
pub use registry::BootstrapRegistry;
