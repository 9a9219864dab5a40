// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Dependency graph construction
//!
//! The graph is walked breadth-first from the entry module. Every module in
//! a frontier is loaded, transformed and scanned in parallel; ids are handed
//! out afterwards in discovery order, so the same input always produces the
//! same graph. Resolution failures do not stop the walk: the rest of the
//! graph is still visited (and observed by plugins) before the build fails
//! with every collected error.

use super::lexer;
use super::resolver::{FileKind, ModuleResolver};
use super::scan::{self, ModuleSyntax};
use crate::error::{BundleError, Result};
use crate::plugin::{ImportKind, PluginChain, ResolveRequest, Resolution};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Index of a module in the graph; the entry module is always 0
pub type ModuleId = usize;

/// Id of the entry module
pub const ENTRY_ID: ModuleId = 0;

/// Where an import points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// A module inside the bundle
    Module(ModuleId),
    /// Left as an import of this specifier
    External(String),
}

/// A loaded module
#[derive(Debug, Clone)]
pub struct Module {
    /// Graph index
    pub id: ModuleId,
    /// Canonical path, or the virtual module name
    pub key: String,
    /// File path; for virtual modules, the name as a path
    pub path: PathBuf,
    /// Script or JSON
    pub kind: FileKind,
    /// Source after `on_load` transforms
    pub source: String,
    /// Import/export records
    pub syntax: ModuleSyntax,
    /// Resolved target of each specifier
    pub dependencies: HashMap<String, Dependency>,
}

impl Module {
    /// Target of `specifier`, if it was resolved
    pub fn dependency(&self, specifier: &str) -> Option<&Dependency> {
        self.dependencies.get(specifier)
    }
}

/// Every module reachable from the entry
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    /// Modules indexed by id
    pub modules: Vec<Module>,
}

impl ModuleGraph {
    /// The entry module
    pub fn entry(&self) -> &Module {
        &self.modules[ENTRY_ID]
    }

    /// Module by id
    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the graph is empty (never, once built)
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Something to load
#[derive(Debug, Clone)]
enum Target {
    File(PathBuf),
    Virtual { name: String, contents: String },
}

impl Target {
    fn key(&self) -> String {
        match self {
            Target::File(path) => path.display().to_string(),
            Target::Virtual { name, .. } => name.clone(),
        }
    }
}

/// How one specifier of a loaded module resolved
enum Edge {
    External(String),
    Internal(Target),
}

/// A module loaded but not yet linked into the graph
struct Loaded {
    id: ModuleId,
    key: String,
    path: PathBuf,
    kind: FileKind,
    source: String,
    syntax: ModuleSyntax,
    edges: Vec<(String, Edge)>,
    errors: Vec<BundleError>,
}

/// Builds a [`ModuleGraph`]
pub struct GraphBuilder<'a> {
    plugins: &'a PluginChain,
    resolver: &'a ModuleResolver,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder
    pub fn new(plugins: &'a PluginChain, resolver: &'a ModuleResolver) -> Self {
        Self { plugins, resolver }
    }

    /// Walk the graph from `entry`
    #[instrument(skip(self))]
    pub fn build(&self, entry: &Path) -> Result<ModuleGraph> {
        let entry = entry.canonicalize()?;
        // The entry is always loaded from disk; plugins only observe it.
        self.plugins.resolve(&ResolveRequest {
            specifier: &entry.to_string_lossy(),
            importer: None,
            kind: ImportKind::EntryPoint,
        });

        let mut ids: HashMap<String, ModuleId> = HashMap::new();
        let entry_target = Target::File(entry);
        ids.insert(entry_target.key(), ENTRY_ID);

        let mut frontier = vec![(ENTRY_ID, entry_target)];
        let mut modules: Vec<Option<Module>> = vec![None];
        let mut errors: Vec<BundleError> = Vec::new();

        while !frontier.is_empty() {
            let loaded: Vec<Result<Loaded>> = frontier
                .par_iter()
                .map(|(id, target)| self.load(*id, target))
                .collect();

            let mut next = Vec::new();
            for result in loaded {
                let loaded = match result {
                    Ok(loaded) => loaded,
                    Err(e) => {
                        errors.push(e);
                        continue;
                    }
                };
                errors.extend(loaded.errors);

                let mut dependencies = HashMap::new();
                for (specifier, edge) in loaded.edges {
                    let dependency = match edge {
                        Edge::External(name) => Dependency::External(name),
                        Edge::Internal(target) => {
                            let key = target.key();
                            let id = match ids.get(&key) {
                                Some(id) => *id,
                                None => {
                                    let id = modules.len();
                                    ids.insert(key, id);
                                    modules.push(None);
                                    next.push((id, target));
                                    id
                                }
                            };
                            Dependency::Module(id)
                        }
                    };
                    dependencies.insert(specifier, dependency);
                }

                modules[loaded.id] = Some(Module {
                    id: loaded.id,
                    key: loaded.key,
                    path: loaded.path,
                    kind: loaded.kind,
                    source: loaded.source,
                    syntax: loaded.syntax,
                    dependencies,
                });
            }

            let done = modules.iter().filter(|m| m.is_some()).count();
            self.plugins.progress(progress_percent(done, next.len()));
            frontier = next;
        }

        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            return Err(BundleError::BundlingFailed(message));
        }

        let modules: Vec<Module> = modules.into_iter().flatten().collect();
        debug!("Dependency graph has {} modules", modules.len());
        Ok(ModuleGraph { modules })
    }

    fn load(&self, id: ModuleId, target: &Target) -> Result<Loaded> {
        let (path, raw) = match target {
            Target::File(path) => (path.clone(), std::fs::read_to_string(path)?),
            Target::Virtual { name, contents } => (PathBuf::from(name), contents.clone()),
        };
        let kind = FileKind::of(&path);
        debug!("Loading {}", path.display());

        let source = self.plugins.load(&path, raw);

        let syntax = match kind {
            FileKind::Json => {
                serde_json::from_str::<serde_json::Value>(&source)
                    .map_err(|e| BundleError::syntax(&path, e.to_string()))?;
                ModuleSyntax::default()
            }
            FileKind::Script => {
                let segments = lexer::segment(&source)
                    .map_err(|e| BundleError::syntax(&path, e.describe(&source)))?;
                scan::scan(&source, &segments)
            }
        };

        let mut edges = Vec::new();
        let mut errors = Vec::new();
        for specifier in syntax.specifiers() {
            let kind = syntax.import_kind(specifier);
            match self.resolve(specifier, &path, kind) {
                Ok(edge) => edges.push((specifier.to_string(), edge)),
                Err(e) => errors.push(e),
            }
        }

        Ok(Loaded {
            id,
            key: target.key(),
            path,
            kind,
            source,
            syntax,
            edges,
            errors,
        })
    }

    fn resolve(&self, specifier: &str, importer: &Path, kind: ImportKind) -> Result<Edge> {
        let request = ResolveRequest {
            specifier,
            importer: Some(importer),
            kind,
        };
        Ok(match self.plugins.resolve(&request) {
            Some(Resolution::External(name)) => Edge::External(name),
            Some(Resolution::Virtual { name, contents }) => {
                Edge::Internal(Target::Virtual { name, contents })
            }
            Some(Resolution::Path(path)) => {
                Edge::Internal(Target::File(path.canonicalize().unwrap_or(path)))
            }
            None => Edge::Internal(Target::File(self.resolver.resolve(specifier, importer)?)),
        })
    }
}

/// Progress between 10% (started) and 90% (graph loaded)
fn progress_percent(done: usize, pending: usize) -> u8 {
    let total = (done + pending).max(1);
    (10 + 80 * done / total) as u8
}
