//! # Bootstrap registry: explicit name-to-constructor resolution.
//!
//! The manifest speaks in strings; the registry turns them back into typed
//! subscriptions. Hosts register each built-in implementation under its
//! capability's `NAME` with a factory; bootstrap later looks entries up by
//! the identifiers the manifest declares and subscribes a fresh instance
//! through the root's self-owned connection.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::Connection;
use crate::events::{Capability, EventType};

/// Binds one implementation: constructs it and subscribes it through the
/// given connection.
type Binder = Box<dyn Fn(&Connection) + Send + Sync>;

/// Maps capability identifiers to named implementation binders.
#[derive(Default)]
pub struct BootstrapRegistry {
    bindings: HashMap<&'static str, HashMap<String, Binder>>,
}

impl BootstrapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `implementation` as a bindable subscriber of capability `C`.
    ///
    /// `factory` is called once per manifest occurrence; each call must
    /// produce a fresh, fully-initialized listener (the "default
    /// construction" of the bootstrap contract).
    pub fn bind<C, F>(&mut self, implementation: impl Into<String>, factory: F)
    where
        C: Capability,
        F: Fn() -> Arc<C::Listener> + Send + Sync + 'static,
    {
        let binder: Binder = Box::new(move |connection| {
            connection.subscribe(EventType::<C>::of(), factory());
        });
        self.bindings
            .entry(C::NAME)
            .or_default()
            .insert(implementation.into(), binder);
    }

    /// Looks up the binders registered for a capability identifier.
    pub(crate) fn capability(&self, name: &str) -> Option<&HashMap<String, Binder>> {
        self.bindings.get(name)
    }
}

impl fmt::Debug for BootstrapRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut capabilities: Vec<_> = self
            .bindings
            .iter()
            .map(|(name, impls)| (name, impls.len()))
            .collect();
        capabilities.sort();
        f.debug_struct("BootstrapRegistry")
            .field("capabilities", &capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{journal, Probe, ProjectEvents};

    #[test]
    fn test_bindings_are_keyed_by_capability_name() {
        let log = journal();
        let mut registry = BootstrapRegistry::new();
        registry.bind::<ProjectEvents, _>("LogListener", move || Probe::listener("log", &log));

        assert!(registry.capability("project").is_some());
        assert!(registry.capability("project").unwrap().contains_key("LogListener"));
        assert!(registry.capability("ghost").is_none());
    }

    #[test]
    fn test_debug_lists_capability_counts() {
        let log = journal();
        let mut registry = BootstrapRegistry::new();
        registry.bind::<ProjectEvents, _>("A", {
            let log = log.clone();
            move || Probe::listener("a", &log)
        });
        registry.bind::<ProjectEvents, _>("B", move || Probe::listener("b", &log));

        let debug = format!("{registry:?}");
        assert!(debug.contains("project"));
        assert!(debug.contains('2'));
    }
}
