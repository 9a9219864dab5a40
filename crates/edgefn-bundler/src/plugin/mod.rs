// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Build plugins
//!
//! A plugin observes or alters the build through hooks invoked by the
//! engine in a fixed order:
//!
//! - `on_start` once before any module is loaded
//! - `on_resolve` for every import request; the first plugin returning a
//!   [`Resolution`] decides it, otherwise the file resolver runs
//! - `on_load` for every loaded module; transformations compose in order
//! - `on_progress` as the dependency graph is walked
//! - `on_end` once, on success or failure
//!
//! Hook errors never abort the build. They are handed to the chain's error
//! callback and the hook is treated as if it had declined.

mod checker;
mod polyfill;
mod progress;
mod rewriter;

pub use checker::{CompatibilityChecker, ModuleSet};
pub use polyfill::AsyncLocalStoragePolyfill;
pub use progress::{IndicatifProgress, NoProgress, ProgressPlugin, ProgressReporter};
pub use rewriter::SpecifierRewriter;

use crate::error::{BundleError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// How a module was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// The build entry point
    EntryPoint,
    /// Static `import` or `export ... from`
    ImportStatement,
    /// CommonJS `require()` call
    RequireCall,
    /// Dynamic `import()` call
    DynamicImport,
}

/// A module resolution request
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    /// Specifier as written in the importing file
    pub specifier: &'a str,
    /// File making the request; `None` for the entry point
    pub importer: Option<&'a Path>,
    /// How the module was requested
    pub kind: ImportKind,
}

/// A plugin's answer to a resolution request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Leave the import in the output, pointing at this specifier
    External(String),
    /// Substitute an in-memory module
    Virtual {
        /// Unique name used as the module key
        name: String,
        /// Module source
        contents: String,
    },
    /// Load this file instead
    Path(PathBuf),
}

/// A build plugin
pub trait Plugin: Send + Sync {
    /// Plugin name, used in diagnostics
    fn name(&self) -> &'static str;

    /// Called once before the build starts
    fn on_start(&self) -> Result<()> {
        Ok(())
    }

    /// Claim a resolution request
    fn on_resolve(&self, _request: &ResolveRequest<'_>) -> Result<Option<Resolution>> {
        Ok(None)
    }

    /// Transform a loaded module; `None` leaves it unchanged
    fn on_load(&self, _path: &Path, _contents: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// Build progress, 0 to 100
    fn on_progress(&self, _percent: u8) {}

    /// Called once when the build finishes
    fn on_end(&self, _success: bool) {}
}

/// Callback receiving plugin hook errors
pub type ErrorCallback = Arc<dyn Fn(&BundleError) + Send + Sync>;

/// Ordered set of plugins driven by the engine
pub struct PluginChain {
    plugins: Vec<Box<dyn Plugin>>,
    on_error: ErrorCallback,
}

impl PluginChain {
    /// Create an empty chain reporting hook errors to `on_error`
    pub fn new(on_error: ErrorCallback) -> Self {
        Self {
            plugins: Vec::new(),
            on_error,
        }
    }

    /// Append a plugin
    pub fn push(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.push(Box::new(plugin));
    }

    /// Append a plugin, builder style
    pub fn with(mut self, plugin: impl Plugin + 'static) -> Self {
        self.push(plugin);
        self
    }

    /// Plugin names in invocation order
    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Number of plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the chain has no plugins
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run every `on_start` hook
    pub fn start(&self) {
        for plugin in &self.plugins {
            if let Err(e) = plugin.on_start() {
                self.report(plugin.as_ref(), e);
            }
        }
    }

    /// Offer a request to each plugin; the first claim wins
    pub fn resolve(&self, request: &ResolveRequest<'_>) -> Option<Resolution> {
        for plugin in &self.plugins {
            match plugin.on_resolve(request) {
                Ok(Some(resolution)) => {
                    debug!(
                        "Plugin '{}' resolved '{}' to {:?}",
                        plugin.name(),
                        request.specifier,
                        resolution
                    );
                    return Some(resolution);
                }
                Ok(None) => {}
                Err(e) => self.report(plugin.as_ref(), e),
            }
        }
        None
    }

    /// Pass module contents through every `on_load` hook in order
    pub fn load(&self, path: &Path, contents: String) -> String {
        let mut current = contents;
        for plugin in &self.plugins {
            match plugin.on_load(path, &current) {
                Ok(Some(transformed)) => current = transformed,
                Ok(None) => {}
                Err(e) => self.report(plugin.as_ref(), e),
            }
        }
        current
    }

    /// Broadcast progress
    pub fn progress(&self, percent: u8) {
        let percent = percent.min(100);
        for plugin in &self.plugins {
            plugin.on_progress(percent);
        }
    }

    /// Run every `on_end` hook
    pub fn end(&self, success: bool) {
        for plugin in &self.plugins {
            plugin.on_end(success);
        }
    }

    fn report(&self, plugin: &dyn Plugin, error: BundleError) {
        let error = match error {
            e @ BundleError::Plugin { .. } => e,
            other => BundleError::plugin(plugin.name(), other.to_string()),
        };
        (self.on_error)(&error);
    }
}

impl fmt::Debug for PluginChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginChain")
            .field("plugins", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Upper;

    impl Plugin for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn on_load(&self, _path: &Path, contents: &str) -> Result<Option<String>> {
            Ok(Some(contents.to_uppercase()))
        }
    }

    struct Failing;

    impl Plugin for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn on_resolve(&self, _request: &ResolveRequest<'_>) -> Result<Option<Resolution>> {
            Err(BundleError::Config("resolve exploded".into()))
        }

        fn on_load(&self, _path: &Path, _contents: &str) -> Result<Option<String>> {
            Err(BundleError::plugin("failing", "load exploded"))
        }
    }

    struct ClaimAll(&'static str);

    impl Plugin for ClaimAll {
        fn name(&self) -> &'static str {
            self.0
        }

        fn on_resolve(&self, request: &ResolveRequest<'_>) -> Result<Option<Resolution>> {
            Ok(Some(Resolution::External(format!("{}:{}", self.0, request.specifier))))
        }
    }

    fn collecting_chain() -> (PluginChain, Arc<Mutex<Vec<String>>>) {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let chain = PluginChain::new(Arc::new(move |e: &BundleError| sink.lock().push(e.to_string())));
        (chain, errors)
    }

    fn request(specifier: &str) -> ResolveRequest<'_> {
        ResolveRequest {
            specifier,
            importer: None,
            kind: ImportKind::ImportStatement,
        }
    }

    #[test]
    fn test_load_errors_pass_contents_through() {
        let (chain, errors) = collecting_chain();
        let chain = chain.with(Failing).with(Upper);

        let out = chain.load(Path::new("a.js"), "let a;".to_string());
        assert_eq!(out, "LET A;");
        assert_eq!(errors.lock().len(), 1);
        assert!(errors.lock()[0].contains("load exploded"));
    }

    #[test]
    fn test_first_resolution_wins() {
        let (chain, errors) = collecting_chain();
        let chain = chain.with(Failing).with(ClaimAll("first")).with(ClaimAll("second"));

        assert_eq!(
            chain.resolve(&request("x")),
            Some(Resolution::External("first:x".into()))
        );
        assert_eq!(errors.lock().len(), 1);
        assert!(errors.lock()[0].contains("Plugin 'failing' failed"));
        assert_eq!(chain.names(), vec!["failing", "first", "second"]);
    }
}
