// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Specifier rewriter
//!
//! The edge runtime only exposes its built-ins under `node:`-qualified
//! specifiers. This plugin rewrites imports of supported built-ins to the
//! qualified form and keeps them out of the bundle.
//!
//! Matching is textual and scoped to a single import statement (which may
//! span lines). Only the quoted specifier is replaced.

use super::{Plugin, ResolveRequest, Resolution};
use crate::error::Result;
use crate::registry::{RUNTIME_PREFIX, RuntimeRegistry};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::path::Path;
use std::sync::{Arc, LazyLock};

static IMPORT_SPECIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?P<head>\b(?:import|export)\b[^;"'`]*?\bfrom\s*|\bimport\s*(?:\(\s*)?|\brequire\s*\(\s*)(?P<spec>"[^"\n]*"|'[^'\n]*')"#,
    )
    .expect("valid import specifier regex")
});

/// Rewrites supported built-in imports to their runtime aliases
#[derive(Debug, Clone)]
pub struct SpecifierRewriter {
    registry: Arc<RuntimeRegistry>,
}

impl SpecifierRewriter {
    /// Create a rewriter backed by `registry`
    pub fn new(registry: Arc<RuntimeRegistry>) -> Self {
        Self { registry }
    }

    /// Rewrite supported built-in specifiers in `contents`.
    ///
    /// Text without a matching import is returned unchanged, and rewriting
    /// already-rewritten text is a no-op.
    pub fn rewrite(&self, contents: &str) -> String {
        self.rewrite_cow(contents).into_owned()
    }

    fn rewrite_cow<'a>(&self, contents: &'a str) -> Cow<'a, str> {
        IMPORT_SPECIFIER_RE.replace_all(contents, |caps: &Captures<'_>| {
            let head = &caps["head"];
            let quoted = &caps["spec"];
            match self.registry.alias_for(&quoted[1..quoted.len() - 1]) {
                Some(alias) => format!("{head}\"{alias}\""),
                None => caps[0].to_string(),
            }
        })
    }
}

impl Plugin for SpecifierRewriter {
    fn name(&self) -> &'static str {
        "specifier-rewriter"
    }

    fn on_resolve(&self, request: &ResolveRequest<'_>) -> Result<Option<Resolution>> {
        if request.specifier.starts_with(RUNTIME_PREFIX) {
            return Ok(Some(Resolution::External(request.specifier.to_string())));
        }
        Ok(self
            .registry
            .alias_for(request.specifier)
            .map(|alias| Resolution::External(alias.to_string())))
    }

    fn on_load(&self, _path: &Path, contents: &str) -> Result<Option<String>> {
        Ok(match self.rewrite_cow(contents) {
            Cow::Owned(rewritten) if rewritten != contents => Some(rewritten),
            _ => None,
        })
    }
}
