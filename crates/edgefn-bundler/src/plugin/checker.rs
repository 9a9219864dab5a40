// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Compatibility checker
//!
//! Records every unsupported runtime module the build asks to resolve. It
//! never claims or rejects a request.

use super::{Plugin, ResolveRequest, Resolution};
use crate::error::Result;
use crate::registry::{ModuleClass, RuntimeRegistry};
use dashmap::DashSet;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Set of module names shared between the checker and its owner.
///
/// Resolution runs on worker threads, so insertion is lock-free.
#[derive(Debug, Clone, Default)]
pub struct ModuleSet(Arc<DashSet<String>>);

impl ModuleSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module; returns whether it was new
    pub fn insert(&self, name: &str) -> bool {
        self.0.insert(name.to_string())
    }

    /// Whether `name` was recorded
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Number of recorded modules
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted copy of the contents
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.0.iter().map(|name| name.key().clone()).collect()
    }
}

/// Observes resolution requests for unsupported modules
#[derive(Debug, Clone)]
pub struct CompatibilityChecker {
    registry: Arc<RuntimeRegistry>,
    found: ModuleSet,
}

impl CompatibilityChecker {
    /// Create a checker recording into `found`
    pub fn new(registry: Arc<RuntimeRegistry>, found: ModuleSet) -> Self {
        Self { registry, found }
    }
}

impl Plugin for CompatibilityChecker {
    fn name(&self) -> &'static str {
        "compatibility-checker"
    }

    fn on_resolve(&self, request: &ResolveRequest<'_>) -> Result<Option<Resolution>> {
        if self.registry.classify(request.specifier) == ModuleClass::Unsupported
            && self.found.insert(request.specifier)
        {
            debug!("Unsupported module requested: {}", request.specifier);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ImportKind;

    fn request(specifier: &str) -> ResolveRequest<'_> {
        ResolveRequest {
            specifier,
            importer: None,
            kind: ImportKind::ImportStatement,
        }
    }

    #[test]
    fn test_records_original_form() {
        let found = ModuleSet::new();
        let checker = CompatibilityChecker::new(RuntimeRegistry::edge(), found.clone());

        for specifier in ["fs", "node:child_process", "crypto", "lodash", "fs"] {
            assert_eq!(checker.on_resolve(&request(specifier)).unwrap(), None);
        }

        assert_eq!(
            found.snapshot().into_iter().collect::<Vec<_>>(),
            vec!["fs".to_string(), "node:child_process".to_string()]
        );
    }

    #[test]
    fn test_concurrent_insertion() {
        use rayon::prelude::*;

        let found = ModuleSet::new();
        let checker = CompatibilityChecker::new(RuntimeRegistry::edge(), found.clone());
        (0..256).into_par_iter().for_each(|i| {
            let name = if i % 2 == 0 { "net" } else { "tls" };
            checker.on_resolve(&request(name)).unwrap();
        });
        assert_eq!(found.len(), 2);
    }
}
