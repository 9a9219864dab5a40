// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Linking a module graph into a single ES module
//!
//! Output layout:
//!
//! ```text
//! import * as __ext0 from "node:crypto";   // externals used by dependencies
//! <runtime helpers>
//! var __rt_modules = { 1: function (...) { ... }, ... };
//! <entry module code>
//! ```
//!
//! Dependencies become factories evaluated on first `__rt_require`. ES module
//! dependencies publish their exports as getters, CommonJS ones through
//! `module.exports`. The entry module stays at the top level so its own
//! `import`/`export` declarations of externals remain native. Dynamic
//! `import()` of a bundled module resolves to its module object on a later
//! tick; dynamic imports of externals are kept.

use super::graph::{Dependency, ENTRY_ID, Module, ModuleGraph, ModuleId};
use super::resolver::FileKind;
use super::scan::{ImportClause, ReExport, Record, Statement};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::ops::Range;
use tracing::debug;

const RUNTIME: &str = r#"var __rt_cache = {};
function __rt_require(id) {
  var cached = __rt_cache[id];
  if (cached) return cached.exports;
  var module = (__rt_cache[id] = { exports: {} });
  __rt_modules[id](module.exports, module);
  return module.exports;
}
function __rt_export(target, getters) {
  Object.defineProperty(target, "__esModule", { value: true });
  for (var name in getters)
    Object.defineProperty(target, name, { get: getters[name], enumerable: true });
}
function __rt_default(mod) {
  return mod && mod.__esModule ? mod.default : mod;
}
function __rt_ns(mod) {
  return mod && mod.__esModule ? mod : Object.assign({}, mod, { default: mod });
}
function __rt_star(target, source) {
  Object.keys(source).forEach(function (name) {
    if (name !== "default" && !Object.prototype.hasOwnProperty.call(target, name))
      Object.defineProperty(target, name, { get: function () { return source[name]; }, enumerable: true });
  });
}
"#;

/// How the default export of a module object is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interop {
    /// A bundled module: CommonJS exports are their own default
    Runtime,
    /// An external namespace object
    Namespace,
}

impl Interop {
    fn default_of(self, object: &str) -> String {
        match self {
            Interop::Runtime => format!("__rt_default({object})"),
            Interop::Namespace => format!("{object}.default"),
        }
    }

    fn member(self, object: &str, name: &str) -> String {
        if name == "default" {
            self.default_of(object)
        } else {
            format!("{object}.{name}")
        }
    }
}

/// Link `graph` into one ES module
pub fn link(graph: &ModuleGraph) -> String {
    Linker::new(graph).run()
}

struct Linker<'g> {
    graph: &'g ModuleGraph,
    externals: Vec<String>,
    external_index: HashMap<String, usize>,
}

impl<'g> Linker<'g> {
    fn new(graph: &'g ModuleGraph) -> Self {
        Self {
            graph,
            externals: Vec::new(),
            external_index: HashMap::new(),
        }
    }

    fn run(mut self) -> String {
        let graph = self.graph;
        let entry = graph.entry();
        // A CommonJS entry is wrapped like any dependency and re-exported
        let wrap_entry = entry.kind == FileKind::Json
            || (!entry.syntax.is_esm() && entry.syntax.commonjs_exports);

        let mut factories = String::new();
        for module in &graph.modules {
            if module.id == ENTRY_ID && !wrap_entry {
                continue;
            }
            let (params, body) = self.factory(module);
            let _ = write!(
                factories,
                "// {}\n{}: function ({}) {{\n{}\n}},\n",
                module.key, module.id, params, body
            );
        }

        let entry_code = if wrap_entry {
            format!("export default __rt_require({ENTRY_ID});\n")
        } else {
            self.module_body(entry, true)
        };

        let mut out = String::new();
        for (index, name) in self.externals.iter().enumerate() {
            let _ = writeln!(out, "import * as __ext{index} from {};", quote(name));
        }
        if !factories.is_empty() {
            out.push_str(RUNTIME);
            out.push_str("var __rt_modules = {\n");
            out.push_str(&factories);
            out.push_str("};\n");
        }
        out.push_str(&entry_code);
        if !out.ends_with('\n') {
            out.push('\n');
        }

        debug!(
            "Linked {} modules with {} hoisted externals",
            graph.len(),
            self.externals.len()
        );
        out
    }

    /// Parameter list and body of a module factory
    fn factory(&mut self, module: &Module) -> (&'static str, String) {
        match module.kind {
            FileKind::Json => (
                "exports, module",
                format!("module.exports = {};", module.source.trim()),
            ),
            FileKind::Script if module.syntax.is_esm() => ("__exports", self.module_body(module, false)),
            FileKind::Script => ("exports, module", self.module_body(module, false)),
        }
    }

    /// Namespace variable of a hoisted external import
    fn external(&mut self, name: &str) -> String {
        let next = self.externals.len();
        let index = *self.external_index.entry(name.to_string()).or_insert_with(|| {
            self.externals.push(name.to_string());
            next
        });
        format!("__ext{index}")
    }

    /// Module object expression and default interop for a dependency
    fn target(&mut self, dependency: &Dependency) -> (String, Interop) {
        match dependency {
            Dependency::Module(id) => (format!("__rt_require({id})"), Interop::Runtime),
            Dependency::External(name) => (self.external(name), Interop::Namespace),
        }
    }

    fn module_body(&mut self, module: &Module, as_entry: bool) -> String {
        let source = module.source.as_str();
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        let mut exported: Vec<(String, String)> = Vec::new();
        let mut temps = 0usize;
        let mut temp = |prefix: &str| {
            temps += 1;
            format!("__{prefix}{}_{}", module.id, temps)
        };

        if source.starts_with("#!") {
            let end = source.find('\n').unwrap_or(source.len());
            edits.push((0..end, String::new()));
        }

        for record in &module.syntax.records {
            let dependency = record
                .statement
                .specifier()
                .and_then(|specifier| module.dependency(specifier));

            match (&record.statement, dependency) {
                (Statement::Import { .. } | Statement::ExportFrom { .. }, Some(Dependency::External(name)))
                    if as_entry =>
                {
                    edits.extend(specifier_edit(record, name));
                }
                (Statement::Import { clause, .. }, Some(dependency)) => {
                    let (object, interop) = self.target(dependency);
                    let text = if clause.is_empty() {
                        match dependency {
                            // the hoisted import already evaluates it
                            Dependency::External(_) => String::new(),
                            Dependency::Module(_) => format!("{object};"),
                        }
                    } else {
                        bindings(clause, &object, &temp("im"), interop)
                    };
                    edits.push((record.span.clone(), text));
                }
                (Statement::DynamicImport { .. }, Some(Dependency::External(name))) => {
                    edits.extend(specifier_edit(record, name));
                }
                (Statement::DynamicImport { .. }, Some(Dependency::Module(id))) => {
                    edits.push((
                        record.span.clone(),
                        format!("Promise.resolve().then(() => __rt_ns(__rt_require({id})))"),
                    ));
                }
                (Statement::Require { .. }, Some(Dependency::Module(id))) => {
                    edits.push((record.span.clone(), format!("__rt_require({id})")));
                }
                (Statement::Require { .. }, Some(Dependency::External(name))) => {
                    let object = self.external(name);
                    edits.push((record.span.clone(), format!("({object}.default ?? {object})")));
                }
                (Statement::ExportFrom { kind, .. }, Some(Dependency::Module(id))) if as_entry => {
                    let text = self.entry_reexport(*id, kind, &temp("re"));
                    edits.push((record.span.clone(), text));
                }
                (Statement::ExportFrom { kind, .. }, Some(dependency)) => {
                    let (object, interop) = self.target(dependency);
                    let text = match kind {
                        ReExport::All => format!("__rt_star(__exports, {object});"),
                        ReExport::Namespace(ns) => {
                            let tmp = temp("re");
                            exported.push((ns.clone(), tmp.clone()));
                            format!("const {tmp} = {object};")
                        }
                        ReExport::Named(list) => {
                            let tmp = temp("re");
                            for (imported, name) in list {
                                exported.push((name.clone(), interop.member(&tmp, imported)));
                            }
                            format!("const {tmp} = {object};")
                        }
                    };
                    edits.push((record.span.clone(), text));
                }
                (_, _) if as_entry => {}
                (Statement::ExportDecl(names), _) => {
                    edits.push((record.span.clone(), String::new()));
                    exported.extend(names.iter().map(|n| (n.clone(), n.clone())));
                }
                (Statement::ExportDefault(Some(name)), _) => {
                    edits.push((record.span.clone(), String::new()));
                    exported.push(("default".into(), name.clone()));
                }
                (Statement::ExportDefault(None), _) => {
                    edits.push((record.span.clone(), "const __default = ".into()));
                    exported.push(("default".into(), "__default".into()));
                }
                (Statement::ExportList(list), _) => {
                    edits.push((record.span.clone(), String::new()));
                    exported.extend(list.iter().map(|(local, name)| (name.clone(), local.clone())));
                }
                _ => {}
            }
        }

        let body = apply_edits(source, edits);
        if as_entry || !module.syntax.is_esm() {
            return body;
        }

        let getters: Vec<String> = exported
            .iter()
            .map(|(name, expr)| format!("{}: () => {}", quote(name), expr))
            .collect();
        format!("__rt_export(__exports, {{ {} }});\n{}", getters.join(", "), body)
    }

    /// `export ... from` an internal module, kept as native exports of the entry
    fn entry_reexport(&mut self, id: ModuleId, kind: &ReExport, tmp: &str) -> String {
        let mut out = format!("const {tmp} = __rt_require({id});");
        let pairs: Vec<(String, String)> = match kind {
            ReExport::Namespace(ns) => {
                let _ = write!(out, " export {{ {tmp} as {ns} }};");
                return out;
            }
            ReExport::Named(list) => list.clone(),
            ReExport::All => {
                let mut visited = HashSet::from([id]);
                self.star_names(id, &mut visited)
                    .into_iter()
                    .map(|name| (name.clone(), name))
                    .collect()
            }
        };

        let mut specifiers = Vec::new();
        for (index, (imported, exported)) in pairs.iter().enumerate() {
            let local = format!("{tmp}_{index}");
            let _ = write!(out, " const {local} = {};", Interop::Runtime.member(tmp, imported));
            specifiers.push(format!("{local} as {exported}"));
        }
        let _ = write!(out, " export {{ {} }};", specifiers.join(", "));
        out
    }

    /// Names an internal module exposes through `export *`
    fn star_names(&self, id: ModuleId, visited: &mut HashSet<ModuleId>) -> Vec<String> {
        let Some(module) = self.graph.get(id) else {
            return Vec::new();
        };
        if module.kind == FileKind::Json || !module.syntax.is_esm() {
            debug!("Cannot list exports of CommonJS module {}", module.key);
            return Vec::new();
        }

        let (direct, stars) = module.syntax.export_names();
        let mut names: Vec<String> = direct.into_iter().filter(|n| n != "default").collect();
        for specifier in stars {
            if let Some(Dependency::Module(target)) = module.dependency(specifier) {
                if visited.insert(*target) {
                    names.extend(self.star_names(*target, visited));
                }
            }
        }

        let mut seen = HashSet::new();
        names.retain(|name| seen.insert(name.clone()));
        names
    }
}

/// Declarations binding an import clause to `object`
fn bindings(clause: &ImportClause, object: &str, tmp: &str, interop: Interop) -> String {
    let mut out = format!("const {tmp} = {object};");
    if let Some(default) = &clause.default {
        let _ = write!(out, " const {default} = {};", interop.default_of(tmp));
    }
    if let Some(namespace) = &clause.namespace {
        let _ = write!(out, " const {namespace} = {tmp};");
    }

    let mut destructured = Vec::new();
    for (imported, local) in &clause.named {
        if imported == "default" {
            let _ = write!(out, " const {local} = {};", interop.default_of(tmp));
        } else if imported == local {
            destructured.push(local.clone());
        } else {
            destructured.push(format!("{imported}: {local}"));
        }
    }
    if !destructured.is_empty() {
        let _ = write!(out, " const {{ {} }} = {tmp};", destructured.join(", "));
    }
    out
}

/// Replace the quoted specifier of `record` when it differs from `name`
fn specifier_edit(record: &Record, name: &str) -> Option<(Range<usize>, String)> {
    if record.statement.specifier() == Some(name) {
        return None;
    }
    record.specifier_span.clone().map(|span| (span, quote(name)))
}

fn apply_edits(source: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(span, _)| span.start);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for (span, replacement) in edits {
        if span.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..span.start]);
        out.push_str(&replacement);
        cursor = span.end;
    }
    out.push_str(&source[cursor..]);
    out
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}
