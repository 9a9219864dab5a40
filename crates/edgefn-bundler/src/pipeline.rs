// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Pipeline facade consumed by deployment commands

use crate::bundler::lexer;
use crate::config::BuildConfig;
use crate::error::{BundleError, Result};
use crate::orchestrator::{BuildOrchestrator, BuildRequest, BuildResult};
use crate::plugin::ProgressReporter;
use crate::registry::{RuntimeRegistry, normalize};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{instrument, warn};

static REQUIRE_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brequire\s*\([^)]*\)").expect("valid require regex"));

/// Receives user-facing warnings
pub trait Diagnostics: Send + Sync {
    /// An unsupported runtime module was used
    fn unsupported_module(&self, name: &str);

    /// The entry uses CommonJS `require()` calls
    fn require_syntax(&self, path: &Path);
}

/// Logs warnings through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn unsupported_module(&self, name: &str) {
        warn!("Module '{}' is not supported by the edge runtime", name);
    }

    fn require_syntax(&self, path: &Path) {
        warn!(
            "{} uses require(); use ES module import syntax instead",
            path.display()
        );
    }
}

/// Public entry point of the bundling pipeline
pub struct Pipeline {
    orchestrator: BuildOrchestrator,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Pipeline {
    /// Create a pipeline for the edge runtime
    pub fn new(config: BuildConfig) -> Self {
        Self {
            orchestrator: BuildOrchestrator::new(config),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Deliver warnings to `diagnostics`
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Report progress to `progress`
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.orchestrator = self.orchestrator.with_progress(progress);
        self
    }

    /// Use a different module registry
    pub fn with_registry(mut self, registry: Arc<RuntimeRegistry>) -> Self {
        self.orchestrator = self.orchestrator.with_registry(registry);
        self
    }

    /// The underlying orchestrator
    pub fn orchestrator(&self) -> &BuildOrchestrator {
        &self.orchestrator
    }

    /// Build `request` and return the artifact path.
    ///
    /// Unsupported-module warnings are delivered on every outcome. A failed
    /// single-file transform is not an error: the original source path is
    /// returned instead.
    #[instrument(skip(self, request), fields(path = %request.source_path.display()))]
    pub fn bundle(&self, request: &BuildRequest) -> Result<PathBuf> {
        let source = std::fs::read_to_string(&request.source_path)
            .map_err(|_| BundleError::PathNotValid(request.source_path.clone()))?;

        if uses_require(&source) {
            self.diagnostics.require_syntax(&request.source_path);
        }

        let result = self.orchestrator.run(request);
        self.report_unsupported(&result);

        match result {
            BuildResult::Success { artifact_path, .. } => Ok(artifact_path),
            BuildResult::Failure { error_message, .. } if request.bundle => match error_message {
                Some(message) => Err(BundleError::BundlingFailed(message)),
                None => Err(BundleError::Unknown),
            },
            BuildResult::Failure { error_message, .. } => {
                warn!(
                    "Transform failed ({}); deploying the original source",
                    error_message.as_deref().unwrap_or("no message")
                );
                Ok(request.source_path.clone())
            }
        }
    }

    /// One warning per distinct module, `fs` and `node:fs` counting once
    fn report_unsupported(&self, result: &BuildResult) {
        let mut seen = HashSet::new();
        for name in result.unsupported_modules_used() {
            if seen.insert(normalize(name)) {
                self.diagnostics.unsupported_module(name);
            }
        }
    }
}

/// Whether code outside strings and comments calls `require()`
fn uses_require(source: &str) -> bool {
    match lexer::segment(source) {
        Ok(segments) => {
            let masked = lexer::mask(source, &segments);
            REQUIRE_CALL_RE
                .find_iter(&masked)
                .any(|m| lexer::is_code(&segments, m.start()))
        }
        Err(_) => REQUIRE_CALL_RE.is_match(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_require() {
        assert!(uses_require("const x = require('x');"));
        assert!(!uses_require("// require('x')\nconst s = \"require(y)\";"));
        assert!(!uses_require("import x from 'x';"));
    }

    #[test]
    fn test_missing_path_is_not_valid() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let pipeline = Pipeline::new(BuildConfig {
            scratch_dir: scratch.clone(),
            ..Default::default()
        });

        let err = pipeline
            .bundle(&BuildRequest::new(dir.path().join("nope.js")))
            .unwrap_err();
        assert!(matches!(err, BundleError::PathNotValid(_)));
        assert!(!scratch.exists());
    }
}
