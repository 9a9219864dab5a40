// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Build orchestration
//!
//! One [`BuildOrchestrator::run`] call drives a complete transform from an
//! entry file to a single artifact in the scratch directory and reports the
//! outcome as a [`BuildResult`]. Failures are reported, never raised: the
//! caller decides what a failure means.

use crate::bundler::{BundleOptions, Bundler};
use crate::config::BuildConfig;
use crate::env::{EnvironmentVariables, build_banner};
use crate::error::{BundleError, Result};
use crate::plugin::{
    AsyncLocalStoragePolyfill, CompatibilityChecker, ErrorCallback, ModuleSet, NoProgress,
    PluginChain, ProgressPlugin, ProgressReporter, SpecifierRewriter,
};
use crate::registry::RuntimeRegistry;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Message used when a failure carries no description
pub const UNKNOWN_BUILD_ERROR: &str = "unknown build error";

/// One request to turn a source file into an artifact
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Entry module
    pub source_path: PathBuf,
    /// Resolve and inline the full dependency graph
    pub bundle: bool,
    /// Variables exposed to the artifact
    pub environment: EnvironmentVariables,
}

impl BuildRequest {
    /// Bundle `source_path` with an empty environment
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            bundle: true,
            environment: EnvironmentVariables::new(),
        }
    }

    /// Set whether the dependency graph is bundled
    pub fn bundle(mut self, bundle: bool) -> Self {
        self.bundle = bundle;
        self
    }

    /// Set the injected environment
    pub fn environment(mut self, environment: EnvironmentVariables) -> Self {
        self.environment = environment;
        self
    }
}

/// Outcome of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildResult {
    /// The artifact was written
    Success {
        /// The emitted file
        artifact_path: PathBuf,
        /// Unsupported modules requested during the build
        unsupported_modules_used: BTreeSet<String>,
    },
    /// The build failed
    Failure {
        /// Where the artifact would have been written
        attempted_path: PathBuf,
        /// Unsupported modules requested before the failure
        unsupported_modules_used: BTreeSet<String>,
        /// Description of the failure, when one was available
        error_message: Option<String>,
    },
}

impl BuildResult {
    /// Whether the build succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, BuildResult::Success { .. })
    }

    /// Unsupported modules observed, on either outcome
    pub fn unsupported_modules_used(&self) -> &BTreeSet<String> {
        match self {
            BuildResult::Success {
                unsupported_modules_used,
                ..
            }
            | BuildResult::Failure {
                unsupported_modules_used,
                ..
            } => unsupported_modules_used,
        }
    }

    /// Artifact path on success, attempted path on failure
    pub fn path(&self) -> &Path {
        match self {
            BuildResult::Success { artifact_path, .. } => artifact_path,
            BuildResult::Failure { attempted_path, .. } => attempted_path,
        }
    }

    /// Failure description, falling back to a generic message
    pub fn error_message(&self) -> Option<&str> {
        match self {
            BuildResult::Success { .. } => None,
            BuildResult::Failure { error_message, .. } => {
                Some(error_message.as_deref().unwrap_or(UNKNOWN_BUILD_ERROR))
            }
        }
    }
}

/// Drives builds into a scratch directory
pub struct BuildOrchestrator {
    config: BuildConfig,
    registry: Arc<RuntimeRegistry>,
    progress: Arc<dyn ProgressReporter>,
    on_error: ErrorCallback,
}

impl BuildOrchestrator {
    /// Create an orchestrator for the edge runtime, without progress output
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            registry: RuntimeRegistry::edge(),
            progress: Arc::new(NoProgress),
            on_error: Arc::new(|e: &BundleError| warn!("{}", e)),
        }
    }

    /// Use a different module registry
    pub fn with_registry(mut self, registry: Arc<RuntimeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Report progress to `progress`
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Receive plugin hook errors
    pub fn with_error_callback(mut self, on_error: ErrorCallback) -> Self {
        self.on_error = on_error;
        self
    }

    /// Configuration in effect
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Create the scratch directory if needed and return it
    pub fn ensure_scratch_location(&self) -> Result<PathBuf> {
        let dir = &self.config.scratch_dir;
        if !dir.is_dir() {
            debug!("Creating scratch directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
        }
        Ok(dir.clone())
    }

    /// Ordered plugin chain for a build, recording into `found`
    pub fn assemble_plugins(&self, bundle: bool, found: &ModuleSet) -> PluginChain {
        let mut chain = PluginChain::new(Arc::clone(&self.on_error))
            .with(CompatibilityChecker::new(Arc::clone(&self.registry), found.clone()))
            .with(SpecifierRewriter::new(Arc::clone(&self.registry)))
            .with(ProgressPlugin::new(Arc::clone(&self.progress)));
        if bundle {
            chain.push(AsyncLocalStoragePolyfill);
        }
        chain
    }

    /// Where the artifact for `entry` is written.
    ///
    /// The name carries a digest of the entry's canonical path, so distinct
    /// entries never share an artifact.
    pub fn artifact_path(&self, entry: &Path) -> PathBuf {
        let canonical = entry.canonicalize().unwrap_or_else(|_| entry.to_path_buf());
        let digest = Sha256::digest(canonical.to_string_lossy().as_bytes());
        let hash = hex::encode(&digest[..4]);
        let stem = entry
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "function".to_string());
        self.config.scratch_dir.join(format!("{stem}.{hash}.js"))
    }

    /// Run one build
    #[instrument(skip(self, request), fields(path = %request.source_path.display(), bundle = request.bundle))]
    pub fn run(&self, request: &BuildRequest) -> BuildResult {
        let found = ModuleSet::new();
        let attempted_path = self.artifact_path(&request.source_path);

        let outcome = self.execute(request, &found, &attempted_path);
        let unsupported_modules_used = found.snapshot();

        match outcome {
            Ok(()) => BuildResult::Success {
                artifact_path: attempted_path,
                unsupported_modules_used,
            },
            Err(e) => {
                let message = match e {
                    BundleError::BundlingFailed(message) => message,
                    other => other.to_string(),
                };
                BuildResult::Failure {
                    attempted_path,
                    unsupported_modules_used,
                    error_message: (!message.is_empty()).then_some(message),
                }
            }
        }
    }

    fn execute(&self, request: &BuildRequest, found: &ModuleSet, artifact: &Path) -> Result<()> {
        self.ensure_scratch_location()?;

        let plugins = self.assemble_plugins(request.bundle, found);
        debug!("Plugins: {:?}", plugins.names());

        let bundler = Bundler::new(BundleOptions {
            bundle: request.bundle,
            minify: self.config.minify,
            banner: build_banner(&request.environment, &self.config.global_name),
            main_fields: self.config.main_fields.clone(),
        });
        let code = bundler.build(&request.source_path, &plugins)?;

        std::fs::write(artifact, code)?;
        debug!("Wrote {}", artifact.display());
        Ok(())
    }
}
