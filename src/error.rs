//! Error types used by the bus runtime and root bootstrap.
//!
//! This module defines two error enums:
//!
//! - [`BusError`] — failures inside the dispatch/replay machinery.
//! - [`BootstrapError`] — per-entry failures while the root bus binds
//!   manifest-declared subscribers.
//!
//! Both types provide `as_label` for stable snake_case identifiers in
//! logs and assertions.

use thiserror::Error;

/// # Errors produced by event replay.
///
/// Replay validates the stored receiver handle against the capability that
/// recorded the event. The maps are keyed so a mismatch cannot arise through
/// the public API; it is still surfaced as a typed error rather than trusted
/// blindly at retrieval time.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// The receiver handle does not implement the event's capability.
    #[error("receiver does not implement capability `{capability}` (method `{method}`)")]
    CapabilityMismatch {
        /// Capability name the event was recorded under.
        capability: &'static str,
        /// Method the event would have invoked.
        method: &'static str,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::CapabilityMismatch { .. } => "capability_mismatch",
        }
    }
}

/// # Errors produced by root bootstrap.
///
/// Bootstrap is best-effort: each value here describes one manifest entry
/// that could not be bound. None of them aborts the remaining entries; they
/// are logged and collected into the [`BootstrapReport`](crate::BootstrapReport).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The manifest document could not be parsed as JSON.
    #[error("manifest is not valid JSON: {0}")]
    Manifest(#[from] serde_json::Error),

    /// The manifest file could not be read.
    #[error("manifest is unreadable: {0}")]
    ManifestIo(#[from] std::io::Error),

    /// The manifest names a capability with no registry entry.
    #[error("no capability `{capability}` in the bootstrap registry")]
    UnknownCapability {
        /// Capability identifier as it appears in the manifest.
        capability: String,
    },

    /// The manifest names an implementation that is not bound for its capability.
    #[error("no implementation `{implementation}` bound for capability `{capability}`")]
    UnknownImplementation {
        /// Capability identifier as it appears in the manifest.
        capability: String,
        /// Implementation identifier as it appears in the manifest.
        implementation: String,
    },
}

impl BootstrapError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BootstrapError::Manifest(_) => "manifest_invalid",
            BootstrapError::ManifestIo(_) => "manifest_unreadable",
            BootstrapError::UnknownCapability { .. } => "unknown_capability",
            BootstrapError::UnknownImplementation { .. } => "unknown_implementation",
        }
    }
}
