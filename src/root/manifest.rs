//! # Manifest document for root bootstrap.
//!
//! A manifest is a JSON object with one top-level `extensions` object whose
//! keys are capability identifiers and whose values are ordered lists of
//! implementation identifiers:
//!
//! ```json
//! {
//!     "extensions": {
//!         "project": ["LogListener", "IndexListener"],
//!         "vfs": ["WatchListener"]
//!     }
//! }
//! ```
//!
//! Parsing is all-or-nothing; resolving the entries against the registry is
//! best-effort per entry and happens in [`RootBus`](crate::RootBus).

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::BootstrapError;

/// Parsed bootstrap manifest.
///
/// `BTreeMap` keeps capability iteration deterministic, which keeps
/// bootstrap logs and reports stable across runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Capability identifier → implementation identifiers, in bind order.
    #[serde(default)]
    pub extensions: BTreeMap<String, Vec<String>>,
}

impl Manifest {
    /// Parses a manifest from a JSON string.
    pub fn from_json(text: &str) -> Result<Self, BootstrapError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BootstrapError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Total number of implementation entries across all capabilities.
    pub fn len(&self) -> usize {
        self.extensions.values().map(Vec::len).sum()
    }

    /// True if the manifest declares no implementations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_capabilities_and_implementations_in_order() {
        let manifest = Manifest::from_json(
            r#"{ "extensions": { "project": ["LogListener", "IndexListener"] } }"#,
        )
        .unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.extensions["project"],
            vec!["LogListener", "IndexListener"]
        );
    }

    #[test]
    fn test_missing_extensions_key_is_an_empty_manifest() {
        let manifest = Manifest::from_json("{}").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_invalid_json_is_a_typed_error() {
        let err = Manifest::from_json("{ nope").unwrap_err();
        assert_eq!(err.as_label(), "manifest_invalid");
    }

    #[test]
    fn test_unreadable_file_is_a_typed_error() {
        let err = Manifest::from_path("/definitely/not/here.json").unwrap_err();
        assert_eq!(err.as_label(), "manifest_unreadable");
    }
}
