// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Build configuration
//!
//! Values are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. User config file (`<config dir>/edgefn/config.toml`)
//! 3. Project config file (`edgefn.toml` in the working directory)
//! 4. `EDGEFN_*` environment variables
//!
//! Command-line flags are applied last by the CLI.

use crate::error::{BundleError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project-level configuration file name
pub const PROJECT_CONFIG_FILE: &str = "edgefn.toml";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "EDGEFN_";

/// Configuration for a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Scratch directory the artifact is written to
    pub scratch_dir: PathBuf,

    /// Name of the global object that receives `env`
    pub global_name: String,

    /// Whether to minify the output
    pub minify: bool,

    /// package.json fields consulted when resolving a package entry
    pub main_fields: Vec<String>,

    /// Whether to render a progress bar
    pub progress: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from(".edgefn"),
            global_name: "edgefn".to_string(),
            minify: true,
            main_fields: vec!["browser".into(), "module".into(), "main".into()],
            progress: true,
        }
    }
}

impl BuildConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = user_config_path() {
            if path.is_file() {
                config = config.merge_file(&path)?;
            }
        }

        let project = PathBuf::from(PROJECT_CONFIG_FILE);
        if project.is_file() {
            config = config.merge_file(&project)?;
        }

        config.merge_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay the keys present in a TOML file
    pub fn merge_file(self, path: &Path) -> Result<Self> {
        debug!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let overlay: toml::Table = toml::from_str(&content)?;

        let mut base = match toml::Value::try_from(&self)
            .map_err(|e| BundleError::Config(e.to_string()))?
        {
            toml::Value::Table(table) => table,
            _ => return Err(BundleError::Config("configuration is not a table".into())),
        };
        base.extend(overlay);

        let merged: Self = toml::Value::Table(base).try_into()?;
        Ok(merged)
    }

    /// Apply `EDGEFN_*` variables from the given iterator
    pub fn merge_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                self.set(&name.to_lowercase().replace('_', "-"), &value)?;
            }
        }
        Ok(())
    }

    /// Set a single configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "scratch-dir" => self.scratch_dir = PathBuf::from(value),
            "global-name" => self.global_name = value.to_string(),
            "minify" => self.minify = parse_bool(key, value)?,
            "progress" => self.progress = parse_bool(key, value)?,
            "main-fields" => {
                self.main_fields = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            // Unrelated EDGEFN_* variables are not configuration
            _ => debug!("Ignoring unknown configuration key '{}'", key),
        }
        Ok(())
    }

    /// Check invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.scratch_dir.as_os_str().is_empty() {
            return Err(BundleError::Config("scratch-dir cannot be empty".into()));
        }
        let valid_global = self
            .global_name
            .chars()
            .enumerate()
            .all(|(i, c)| c == '_' || c == '$' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
        if self.global_name.is_empty() || !valid_global {
            return Err(BundleError::Config(format!(
                "global-name '{}' is not a valid identifier",
                self.global_name
            )));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(BundleError::Config(format!("{key}: expected a boolean, got '{value}'"))),
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("edgefn").join("config.toml"))
}
