// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # edgefn-bundler
//!
//! Turns an edge function's source file into a single deployable ES module.
//!
//! The pipeline:
//!
//! - checks every module request against the runtime's built-in modules and
//!   records the ones the edge runtime cannot provide
//! - rewrites imports of supported built-ins to their `node:` form
//! - resolves and links the dependency graph into one file (or transforms
//!   the entry file alone)
//! - prepends a banner exposing environment variables on `globalThis`
//! - minifies the result into a scratch directory
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use edgefn_bundler::{BuildConfig, BuildRequest, EnvironmentVariables, Pipeline};
//!
//! fn main() -> edgefn_bundler::Result<()> {
//!     let pipeline = Pipeline::new(BuildConfig::load()?);
//!     let request = BuildRequest::new("src/index.js")
//!         .environment(EnvironmentVariables::from_pairs(["API_KEY=abc"])?);
//!     let artifact = pipeline.bundle(&request)?;
//!     println!("{}", artifact.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bundler;
pub mod config;
pub mod env;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod plugin;
pub mod registry;

// Re-exports
pub use config::BuildConfig;
pub use env::{EnvironmentVariables, build_banner};
pub use error::{BundleError, Result};
pub use orchestrator::{BuildOrchestrator, BuildRequest, BuildResult};
pub use pipeline::{Diagnostics, Pipeline, TracingDiagnostics};
pub use plugin::{IndicatifProgress, NoProgress, ProgressReporter};
pub use registry::{ModuleClass, RuntimeRegistry};
