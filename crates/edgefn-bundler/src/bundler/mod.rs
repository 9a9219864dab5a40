// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bundling engine
//!
//! Turns an entry file into a single ES module. With `bundle` enabled the
//! whole dependency graph is resolved and linked; otherwise only the entry
//! file is transformed and its imports are left as written.

pub mod graph;
pub mod lexer;
pub mod link;
pub mod minify;
pub mod resolver;
pub mod scan;

pub use graph::{Dependency, GraphBuilder, Module, ModuleGraph, ModuleId};
pub use resolver::ModuleResolver;

use crate::error::{BundleError, Result};
use crate::plugin::{ImportKind, PluginChain, ResolveRequest};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Engine options
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Resolve and inline the dependency graph
    pub bundle: bool,
    /// Minify the output
    pub minify: bool,
    /// Source prepended to the output
    pub banner: Option<String>,
    /// package.json fields consulted for package entries
    pub main_fields: Vec<String>,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            bundle: true,
            minify: true,
            banner: None,
            main_fields: vec!["browser".into(), "module".into(), "main".into()],
        }
    }
}

/// Single-entry JavaScript bundler
#[derive(Debug, Clone)]
pub struct Bundler {
    options: BundleOptions,
    resolver: ModuleResolver,
}

impl Bundler {
    /// Create a bundler
    pub fn new(options: BundleOptions) -> Self {
        let resolver = ModuleResolver::new(options.main_fields.clone());
        Self { options, resolver }
    }

    /// Options in effect
    pub fn options(&self) -> &BundleOptions {
        &self.options
    }

    /// Build `entry`, driving `plugins` through the whole lifecycle
    #[instrument(skip(self, plugins), fields(bundle = self.options.bundle))]
    pub fn build(&self, entry: &Path, plugins: &PluginChain) -> Result<String> {
        let started = Instant::now();
        plugins.start();

        let result = self.compile(entry, plugins);
        plugins.end(result.is_ok());

        match &result {
            Ok(code) => info!(
                "Built {} ({} bytes) in {:?}",
                entry.display(),
                code.len(),
                started.elapsed()
            ),
            Err(e) => debug!("Build of {} failed: {}", entry.display(), e),
        }
        result
    }

    fn compile(&self, entry: &Path, plugins: &PluginChain) -> Result<String> {
        let code = if self.options.bundle {
            let graph = GraphBuilder::new(plugins, &self.resolver).build(entry)?;
            link::link(&graph)
        } else {
            self.transform(entry, plugins)?
        };

        let code = if self.options.minify {
            minify::minify(&code).map_err(|e| BundleError::syntax(entry, e.describe(&code)))?
        } else {
            code
        };

        Ok(match &self.options.banner {
            Some(banner) => format!("{banner}{code}"),
            None => code,
        })
    }

    /// Transform the entry file alone
    fn transform(&self, entry: &Path, plugins: &PluginChain) -> Result<String> {
        let raw = std::fs::read_to_string(entry)?;
        // Observed by its absolute path, as in bundle mode, so a file named
        // like a built-in is never mistaken for one
        let canonical = entry.canonicalize()?;
        plugins.resolve(&ResolveRequest {
            specifier: &canonical.to_string_lossy(),
            importer: None,
            kind: ImportKind::EntryPoint,
        });

        let source = plugins.load(entry, raw);
        let segments =
            lexer::segment(&source).map_err(|e| BundleError::syntax(entry, e.describe(&source)))?;

        // Imports stay in the output; requests are only offered for observation
        let syntax = scan::scan(&source, &segments);
        for specifier in syntax.specifiers() {
            plugins.resolve(&ResolveRequest {
                specifier,
                importer: Some(entry),
                kind: syntax.import_kind(specifier),
            });
        }
        plugins.progress(90);

        Ok(source)
    }
}

impl Default for Bundler {
    fn default() -> Self {
        Self::new(BundleOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{Plugin, Resolution};
    use parking_lot::Mutex;
    use std::fs;
    use std::sync::Arc;

    fn chain() -> PluginChain {
        PluginChain::new(Arc::new(|_: &BundleError| {}))
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(String, ImportKind)>>>);

    impl Plugin for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn on_resolve(&self, request: &ResolveRequest<'_>) -> Result<Option<Resolution>> {
            self.0.lock().push((request.specifier.to_string(), request.kind));
            Ok(None)
        }
    }

    #[test]
    fn test_transform_observes_canonical_entry_and_calls() {
        // relative, extensionless and named like a built-in
        let dir = tempfile::tempdir_in(".").unwrap();
        let entry = dir.path().join("crypto");
        fs::write(&entry, "import a from './a.js';\nexport const lazy = () => import('fs');\n").unwrap();

        let recorder = Recorder::default();
        let plugins = chain().with(recorder.clone());
        let bundler = Bundler::new(BundleOptions {
            bundle: false,
            ..Default::default()
        });
        bundler.build(&entry, &plugins).unwrap();

        let seen = recorder.0.lock().clone();
        assert_eq!(seen[0].1, ImportKind::EntryPoint);
        assert!(Path::new(&seen[0].0).is_absolute());
        assert!(seen[0].0.ends_with("crypto"));
        assert_eq!(
            seen[1..].to_vec(),
            vec![
                ("./a.js".to_string(), ImportKind::ImportStatement),
                ("fs".to_string(), ImportKind::DynamicImport),
            ]
        );
    }

    #[test]
    fn test_transform_keeps_imports() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main.js");
        fs::write(&entry, "import { a } from './missing.js';\n\nexport default a;\n").unwrap();

        let bundler = Bundler::new(BundleOptions {
            bundle: false,
            ..Default::default()
        });
        let code = bundler.build(&entry, &chain()).unwrap();
        assert_eq!(code, "import{a}from'./missing.js';export default a;\n");
    }

    #[test]
    fn test_banner_comes_first() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main.js");
        fs::write(&entry, "export default 1;\n").unwrap();

        let bundler = Bundler::new(BundleOptions {
            banner: Some("globalThis.edgefn={env:{}};\n".into()),
            minify: false,
            ..Default::default()
        });
        let code = bundler.build(&entry, &chain()).unwrap();
        assert_eq!(code, "globalThis.edgefn={env:{}};\nexport default 1;\n");
    }

    #[test]
    fn test_bundle_fails_on_unresolved_import() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main.js");
        fs::write(&entry, "import fs from 'fs';\n").unwrap();

        let err = Bundler::default().build(&entry, &chain()).unwrap_err();
        assert!(err.to_string().contains("Could not resolve \"fs\""));
    }
}
