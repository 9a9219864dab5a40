// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime module registry
//!
//! Classifies Node.js built-in module names against what the edge runtime
//! can provide:
//!
//! - **Supported** modules exist in the runtime, but only under the
//!   `node:`-qualified specifier
//! - **Unsupported** modules can never be provided by the runtime
//!
//! Anything else is an ordinary dependency and is left to normal resolution.

use crate::error::{BundleError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

/// Prefix the runtime requires on built-in module specifiers
pub const RUNTIME_PREFIX: &str = "node:";

/// Built-ins available in the edge runtime (without the `node:` prefix)
pub const SUPPORTED_MODULES: &[&str] = &[
    "buffer",
    "crypto",
    "domain",
    "events",
    "http",
    "https",
    "path",
    "punycode",
    "stream",
    "string_decoder",
    "url",
    "util",
    "zlib",
];

/// Built-ins the edge runtime cannot provide (without the `node:` prefix)
pub const UNSUPPORTED_MODULES: &[&str] = &[
    "assert/strict",
    "child_process",
    "cluster",
    "constants",
    "dgram",
    "diagnostics_channel",
    "dns",
    "fs",
    "fs/promises",
    "http2",
    "inspector",
    "module",
    "net",
    "os",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "querystring",
    "readline",
    "repl",
    "stream/promises",
    "stream/web",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "v8",
    "vm",
    "wasi",
    "webcrypto",
    "worker_threads",
];

static EDGE_REGISTRY: LazyLock<Arc<RuntimeRegistry>> = LazyLock::new(|| {
    Arc::new(RuntimeRegistry::from_lists(SUPPORTED_MODULES, UNSUPPORTED_MODULES))
});

/// Classification of a module name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleClass {
    /// Provided by the runtime under a qualified alias
    Supported,
    /// Never available in the runtime
    Unsupported,
    /// Not a runtime built-in; resolved like any other dependency
    Unlisted,
}

/// Immutable lookup of supported and unsupported runtime modules
#[derive(Debug, Clone)]
pub struct RuntimeRegistry {
    aliases: HashMap<String, String>,
    unsupported: HashSet<String>,
}

impl RuntimeRegistry {
    /// Build a registry from two disjoint name lists.
    ///
    /// Names may be given bare or `node:`-qualified.
    pub fn new<S, U>(supported: S, unsupported: U) -> Result<Self>
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        let mut aliases = HashMap::new();
        for name in supported {
            let bare = normalize(name.as_ref());
            if bare.is_empty() {
                return Err(BundleError::Config("empty module name in registry".into()));
            }
            aliases.insert(bare.to_string(), format!("{RUNTIME_PREFIX}{bare}"));
        }

        let mut unsupported_set = HashSet::new();
        for name in unsupported {
            let bare = normalize(name.as_ref());
            if bare.is_empty() {
                return Err(BundleError::Config("empty module name in registry".into()));
            }
            if aliases.contains_key(bare) {
                return Err(BundleError::Config(format!(
                    "module '{bare}' cannot be both supported and unsupported"
                )));
            }
            unsupported_set.insert(bare.to_string());
        }

        Ok(Self {
            aliases,
            unsupported: unsupported_set,
        })
    }

    // The static lists are known to be disjoint and non-empty.
    fn from_lists(supported: &[&str], unsupported: &[&str]) -> Self {
        Self {
            aliases: supported
                .iter()
                .map(|name| (name.to_string(), format!("{RUNTIME_PREFIX}{name}")))
                .collect(),
            unsupported: unsupported.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// The registry describing the edge runtime, shared process-wide
    pub fn edge() -> Arc<Self> {
        Arc::clone(&EDGE_REGISTRY)
    }

    /// Classify a module name, with or without the `node:` prefix
    pub fn classify(&self, name: &str) -> ModuleClass {
        let bare = normalize(name);
        if self.aliases.contains_key(bare) {
            ModuleClass::Supported
        } else if self.unsupported.contains(bare) {
            ModuleClass::Unsupported
        } else {
            ModuleClass::Unlisted
        }
    }

    /// Runtime-qualified specifier for a supported module
    pub fn alias_for(&self, name: &str) -> Option<&str> {
        self.aliases.get(normalize(name)).map(String::as_str)
    }

    /// Supported module names (bare), sorted
    pub fn supported(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.aliases.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Unsupported module names (bare), sorted
    pub fn unsupported(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.unsupported.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::from_lists(SUPPORTED_MODULES, UNSUPPORTED_MODULES)
    }
}

/// Strip the runtime prefix from a module name
pub fn normalize(name: &str) -> &str {
    name.strip_prefix(RUNTIME_PREFIX).unwrap_or(name)
}
