// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the bundling pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type for bundling operations
pub type Result<T> = std::result::Result<T, BundleError>;

/// Errors that can occur while preparing a function artifact
#[derive(Debug, Error)]
pub enum BundleError {
    /// The entry path does not exist or cannot be read
    #[error("Function path is not valid: {}", .0.display())]
    PathNotValid(PathBuf),

    /// The underlying bundle/transform step failed
    #[error("Failed to bundle function code: {0}")]
    BundlingFailed(String),

    /// A failure was reported without a message
    #[error("Unknown error while bundling function code")]
    Unknown,

    /// A module specifier could not be resolved
    #[error("Could not resolve \"{specifier}\" from {}", .importer.display())]
    Resolve {
        /// The requested specifier
        specifier: String,
        /// File that made the request
        importer: PathBuf,
    },

    /// Source text could not be tokenized
    #[error("Syntax error in {}: {message}", .path.display())]
    Syntax {
        /// File containing the error
        path: PathBuf,
        /// Description of the problem
        message: String,
    },

    /// Malformed environment variable input
    #[error("Invalid environment variable: {0}")]
    InvalidEnvironment(String),

    /// A plugin hook failed
    #[error("Plugin '{plugin}' failed: {message}")]
    Plugin {
        /// Plugin name
        plugin: &'static str,
        /// Failure description
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BundleError {
    /// Create a resolution error
    pub fn resolve(specifier: impl Into<String>, importer: impl Into<PathBuf>) -> Self {
        Self::Resolve {
            specifier: specifier.into(),
            importer: importer.into(),
        }
    }

    /// Create a syntax error
    pub fn syntax(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Syntax {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a plugin error
    pub fn plugin(plugin: &'static str, message: impl Into<String>) -> Self {
        Self::Plugin {
            plugin,
            message: message.into(),
        }
    }
}
