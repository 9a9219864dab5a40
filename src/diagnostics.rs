// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Terminal rendering of pipeline warnings

use edgefn_bundler::Diagnostics;
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Printed once, after the first unsupported-module warning
const UNSUPPORTED_HINT: &str =
    "Run `edgefn modules` to list the built-in modules the edge runtime provides.";

/// Prints warnings to stderr
#[derive(Debug, Default)]
pub struct TerminalDiagnostics {
    hinted: AtomicBool,
}

impl TerminalDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Diagnostics for TerminalDiagnostics {
    fn unsupported_module(&self, name: &str) {
        eprintln!(
            "{}: module {} is not supported by the edge runtime",
            "Warning".yellow().bold(),
            name.cyan()
        );
        if !self.hinted.swap(true, Ordering::Relaxed) {
            eprintln!("  {}", UNSUPPORTED_HINT.dimmed());
        }
    }

    fn require_syntax(&self, path: &Path) {
        eprintln!(
            "{}: {} uses {}; use ES module {} syntax instead",
            "Warning".yellow().bold(),
            path.display().cyan(),
            "require()".bold(),
            "import".bold()
        );
    }
}
