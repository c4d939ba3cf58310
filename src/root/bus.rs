//! # Root bus: a tree root that bootstraps its built-in subscribers.
//!
//! Construction walks the manifest, resolves every entry against the
//! registry, and subscribes each resolved implementation through a
//! self-owned connection. Bootstrap is best-effort per entry: a bad entry is
//! logged, recorded in the [`BootstrapReport`], and skipped — it never
//! aborts the remaining entries.
//!
//! On close, the root disconnects the self-owned connection before the
//! normal close sequence, so bootstrapped subscribers are bulk-unsubscribed
//! exactly like any other scoped subscription.

use std::path::Path;

use tracing::{error, warn};

use crate::core::{Connection, EventBus};
use crate::error::BootstrapError;
use crate::root::manifest::Manifest;
use crate::root::registry::BootstrapRegistry;

/// Outcome of a best-effort bootstrap.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    /// Number of implementations successfully constructed and subscribed.
    pub bound: usize,
    /// Per-entry failures, in deterministic (sorted) capability order.
    pub errors: Vec<BootstrapError>,
}

/// The distinguished top-level bus node of a process.
///
/// Owns the tree root plus the connection holding every bootstrapped
/// subscription. Construct once at startup, inside a Tokio runtime, before
/// any publisher or subscriber; pass it (or child nodes) to consumers by
/// reference rather than through ambient global lookup.
pub struct RootBus {
    bus: EventBus,
    connection: Connection,
    report: BootstrapReport,
}

impl RootBus {
    /// Builds the root and binds every manifest entry it can resolve.
    pub fn bootstrap(registry: &BootstrapRegistry, manifest: &Manifest) -> Self {
        let bus = EventBus::new();
        let connection = bus.connect();
        let mut report = BootstrapReport::default();

        for (capability, implementations) in &manifest.extensions {
            let Some(binders) = registry.capability(capability) else {
                warn!(capability = %capability, "bootstrap entry skipped: unknown capability");
                report.errors.push(BootstrapError::UnknownCapability {
                    capability: capability.clone(),
                });
                continue;
            };
            for implementation in implementations {
                match binders.get(implementation) {
                    Some(binder) => {
                        binder(&connection);
                        report.bound += 1;
                    }
                    None => {
                        warn!(
                            capability = %capability,
                            implementation = %implementation,
                            "bootstrap entry skipped: unknown implementation"
                        );
                        report.errors.push(BootstrapError::UnknownImplementation {
                            capability: capability.clone(),
                            implementation: implementation.clone(),
                        });
                    }
                }
            }
        }

        Self {
            bus,
            connection,
            report,
        }
    }

    /// Builds the root from an inline JSON manifest.
    ///
    /// An unparseable manifest yields a root with zero bootstrapped
    /// subscribers and the parse failure in the report.
    pub fn bootstrap_json(registry: &BootstrapRegistry, text: &str) -> Self {
        match Manifest::from_json(text) {
            Ok(manifest) => Self::bootstrap(registry, &manifest),
            Err(err) => Self::failed_bootstrap(registry, err),
        }
    }

    /// Builds the root from a manifest file.
    pub fn bootstrap_path(registry: &BootstrapRegistry, path: impl AsRef<Path>) -> Self {
        match Manifest::from_path(path) {
            Ok(manifest) => Self::bootstrap(registry, &manifest),
            Err(err) => Self::failed_bootstrap(registry, err),
        }
    }

    fn failed_bootstrap(registry: &BootstrapRegistry, err: BootstrapError) -> Self {
        error!(error = %err, "bootstrap manifest unusable, starting with no built-in subscribers");
        let mut root = Self::bootstrap(registry, &Manifest::default());
        root.report.errors.push(err);
        root
    }

    /// The underlying bus node; create children and publishers through it.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// What bootstrap managed to bind, and what it skipped.
    pub fn report(&self) -> &BootstrapReport {
        &self.report
    }

    /// Disconnects the bootstrapped subscribers, then closes the tree.
    pub fn close(&self) {
        self.connection.disconnect();
        self.bus.close(false);
    }
}
