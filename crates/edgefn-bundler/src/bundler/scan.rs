// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Import/export scanning
//!
//! Extracts module-level statements the linker needs to rewrite:
//! - `import` declarations (default, named, namespace, side-effect)
//! - `export` declarations and lists
//! - `export ... from` re-exports
//! - CommonJS `require("...")` calls with a literal specifier
//! - dynamic `import("...")` calls with a literal specifier
//!
//! Scanning runs on masked source (see [`lexer::mask`]) and only accepts
//! matches that start in code, so text inside strings and comments never
//! produces a record.

use super::lexer::{self, Segment};
use crate::plugin::ImportKind;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

const SPEC: &str = r#"(?P<spec>"[^"\n]*"|'[^'\n]*')"#;

static IMPORT_FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"\bimport\b\s*(?P<clause>[\w$\s{{}},*]*?)\s*\bfrom\s*{SPEC}[ \t]*;?"#
    ))
    .expect("valid import regex")
});

static IMPORT_BARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"\bimport\s*{SPEC}[ \t]*;?"#)).expect("valid import regex")
});

static EXPORT_FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"\bexport\s*(?:(?P<star>\*)\s*(?:as\s+(?P<ns>[\w$]+)\s*)?|\{{(?P<names>[^}}]*)\}}\s*)from\s*{SPEC}[ \t]*;?"#
    ))
    .expect("valid export regex")
});

static EXPORT_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bexport\s*\{(?P<names>[^}]*)\}[ \t]*;?"#).expect("valid export regex")
});

static EXPORT_DEFAULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bexport\s+default\b\s*"#).expect("valid export regex")
});

static NAMED_DEFAULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:async\s+)?(?:function\b\s*\*?\s*|class\b\s*)(?P<name>[\w$]+)?"#)
        .expect("valid export regex")
});

static EXPORT_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bexport\s+(?P<kw>const|let|var|async\s+function\s*\*?|function\s*\*?|class)\s*"#)
        .expect("valid export regex")
});

static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"\brequire\s*\(\s*{SPEC}\s*\)"#)).expect("valid require regex")
});

static DYNAMIC_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"\bimport\s*\(\s*{SPEC}\s*\)"#)).expect("valid import regex")
});

static CJS_EXPORTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:module\s*\.\s*exports\b|exports\s*(?:\.\s*[\w$]+|\[[^\]]*\])\s*=[^=])"#)
        .expect("valid exports regex")
});

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[\w$]+"#).expect("valid identifier regex"));

/// Bindings introduced by an import clause
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportClause {
    /// `import foo from '...'`
    pub default: Option<String>,
    /// `import * as ns from '...'`
    pub namespace: Option<String>,
    /// `import { a as b } from '...'` as (imported, local)
    pub named: Vec<(String, String)>,
}

impl ImportClause {
    /// Whether the import binds nothing
    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.namespace.is_none() && self.named.is_empty()
    }
}

/// What an `export ... from` statement re-exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReExport {
    /// `export * from '...'`
    All,
    /// `export * as ns from '...'`
    Namespace(String),
    /// `export { a as b } from '...'` as (imported, exported)
    Named(Vec<(String, String)>),
}

/// A statement the linker may rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Static import
    Import {
        /// Module specifier
        specifier: String,
        /// Bindings; empty for side-effect imports
        clause: ImportClause,
    },
    /// Re-export from another module
    ExportFrom {
        /// Module specifier
        specifier: String,
        /// What is re-exported
        kind: ReExport,
    },
    /// `export { a, b as c }` as (local, exported)
    ExportList(Vec<(String, String)>),
    /// `export const|let|var|function|class ...`; the span covers `export `
    ExportDecl(Vec<String>),
    /// `export default`; the span covers the keywords.
    /// Holds the declared name for `export default function name` and
    /// `export default class Name`.
    ExportDefault(Option<String>),
    /// `require("...")`
    Require {
        /// Module specifier
        specifier: String,
    },
    /// `import("...")`; the span covers the whole call
    DynamicImport {
        /// Module specifier
        specifier: String,
    },
}

impl Statement {
    /// Specifier referenced by the statement, if any
    pub fn specifier(&self) -> Option<&str> {
        match self {
            Statement::Import { specifier, .. }
            | Statement::ExportFrom { specifier, .. }
            | Statement::Require { specifier }
            | Statement::DynamicImport { specifier } => Some(specifier.as_str()),
            _ => None,
        }
    }
}

/// A scanned statement and where it sits in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Byte range to replace when rewriting
    pub span: Range<usize>,
    /// Byte range of the quoted specifier, quotes included
    pub specifier_span: Option<Range<usize>>,
    /// The statement
    pub statement: Statement,
}

/// Module-level syntax of one source file
#[derive(Debug, Clone, Default)]
pub struct ModuleSyntax {
    /// Records in source order, non-overlapping
    pub records: Vec<Record>,
    /// Whether the module assigns to `module.exports` or `exports.*`
    pub commonjs_exports: bool,
}

impl ModuleSyntax {
    /// Whether the module uses `import`/`export` syntax
    pub fn is_esm(&self) -> bool {
        self.records.iter().any(|r| {
            !matches!(
                r.statement,
                Statement::Require { .. } | Statement::DynamicImport { .. }
            )
        })
    }

    /// How `specifier` is requested; static imports win over calls
    pub fn import_kind(&self, specifier: &str) -> ImportKind {
        let mut kinds = self
            .records
            .iter()
            .filter(|r| r.statement.specifier() == Some(specifier))
            .map(|r| match r.statement {
                Statement::Require { .. } => ImportKind::RequireCall,
                Statement::DynamicImport { .. } => ImportKind::DynamicImport,
                _ => ImportKind::ImportStatement,
            });
        let Some(first) = kinds.next() else {
            return ImportKind::ImportStatement;
        };
        if kinds.all(|kind| kind == first) {
            first
        } else {
            ImportKind::ImportStatement
        }
    }

    /// Distinct specifiers in order of first appearance
    pub fn specifiers(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for spec in self.records.iter().filter_map(|r| r.statement.specifier()) {
            if !seen.contains(&spec) {
                seen.push(spec);
            }
        }
        seen
    }

    /// Names this module exports directly, plus modules it star-re-exports
    pub fn export_names(&self) -> (Vec<String>, Vec<&str>) {
        let mut names = Vec::new();
        let mut stars = Vec::new();
        for record in &self.records {
            match &record.statement {
                Statement::ExportList(list) => {
                    names.extend(list.iter().map(|(_, exported)| exported.clone()))
                }
                Statement::ExportDecl(decl) => names.extend(decl.iter().cloned()),
                Statement::ExportDefault(_) => names.push("default".to_string()),
                Statement::ExportFrom { specifier, kind } => match kind {
                    ReExport::All => stars.push(specifier.as_str()),
                    ReExport::Namespace(ns) => names.push(ns.clone()),
                    ReExport::Named(list) => {
                        names.extend(list.iter().map(|(_, exported)| exported.clone()))
                    }
                },
                _ => {}
            }
        }
        (names, stars)
    }
}

/// Scan `source`, given its lexical segments
pub fn scan(source: &str, segments: &[Segment]) -> ModuleSyntax {
    let masked = lexer::mask(source, segments);
    let mut records: Vec<Record> = Vec::new();

    let accept = |start: usize| lexer::is_code(segments, start) && !preceded_by_dot(&masked, start);

    for cap in EXPORT_FROM_RE.captures_iter(&masked) {
        let (Some(whole), Some(spec)) = (cap.get(0), cap.name(SPEC_GROUP)) else {
            continue;
        };
        if !accept(whole.start()) {
            continue;
        }
        let kind = if cap.name("star").is_some() {
            match cap.name("ns") {
                Some(ns) => ReExport::Namespace(ns.as_str().to_string()),
                None => ReExport::All,
            }
        } else {
            ReExport::Named(parse_specifier_list(
                cap.name("names").map(|m| m.as_str()).unwrap_or_default(),
            ))
        };
        records.push(Record {
            span: whole.range(),
            specifier_span: Some(spec.range()),
            statement: Statement::ExportFrom {
                specifier: unquote(spec.as_str()),
                kind,
            },
        });
    }

    for cap in IMPORT_FROM_RE.captures_iter(&masked) {
        let (Some(whole), Some(spec)) = (cap.get(0), cap.name(SPEC_GROUP)) else {
            continue;
        };
        if !accept(whole.start()) {
            continue;
        }
        let clause = parse_import_clause(cap.name("clause").map(|m| m.as_str()).unwrap_or_default());
        records.push(Record {
            span: whole.range(),
            specifier_span: Some(spec.range()),
            statement: Statement::Import {
                specifier: unquote(spec.as_str()),
                clause,
            },
        });
    }

    for cap in IMPORT_BARE_RE.captures_iter(&masked) {
        let (Some(whole), Some(spec)) = (cap.get(0), cap.name(SPEC_GROUP)) else {
            continue;
        };
        if !accept(whole.start()) {
            continue;
        }
        records.push(Record {
            span: whole.range(),
            specifier_span: Some(spec.range()),
            statement: Statement::Import {
                specifier: unquote(spec.as_str()),
                clause: ImportClause::default(),
            },
        });
    }

    for cap in EXPORT_LIST_RE.captures_iter(&masked) {
        let Some(whole) = cap.get(0) else { continue };
        if !accept(whole.start()) || masked[whole.end()..].trim_start().starts_with("from") {
            continue;
        }
        let list = parse_specifier_list(cap.name("names").map(|m| m.as_str()).unwrap_or_default());
        records.push(Record {
            span: whole.range(),
            specifier_span: None,
            statement: Statement::ExportList(list),
        });
    }

    for m in EXPORT_DEFAULT_RE.find_iter(&masked) {
        if !accept(m.start()) {
            continue;
        }
        let name = NAMED_DEFAULT_RE
            .captures(&masked[m.end()..])
            .and_then(|cap| cap.name("name"))
            .map(|n| n.as_str())
            .filter(|n| *n != "extends")
            .map(str::to_string);
        records.push(Record {
            span: m.range(),
            specifier_span: None,
            statement: Statement::ExportDefault(name),
        });
    }

    for cap in EXPORT_DECL_RE.captures_iter(&masked) {
        let (Some(whole), Some(kw)) = (cap.get(0), cap.name("kw")) else {
            continue;
        };
        if !accept(whole.start()) {
            continue;
        }
        let rest = &masked[whole.end()..];
        let names = if kw.as_str().starts_with("const")
            || kw.as_str().starts_with("let")
            || kw.as_str().starts_with("var")
        {
            binding_names(rest)
        } else {
            IDENT_RE
                .find(rest)
                .map(|m| vec![m.as_str().to_string()])
                .unwrap_or_default()
        };
        // keep the declaration keyword, drop only `export `
        let keyword_start = kw.start();
        records.push(Record {
            span: whole.start()..keyword_start,
            specifier_span: None,
            statement: Statement::ExportDecl(names),
        });
    }

    for cap in REQUIRE_RE.captures_iter(&masked) {
        let (Some(whole), Some(spec)) = (cap.get(0), cap.name(SPEC_GROUP)) else {
            continue;
        };
        if !accept(whole.start()) {
            continue;
        }
        records.push(Record {
            span: whole.range(),
            specifier_span: Some(spec.range()),
            statement: Statement::Require {
                specifier: unquote(spec.as_str()),
            },
        });
    }

    for cap in DYNAMIC_IMPORT_RE.captures_iter(&masked) {
        let (Some(whole), Some(spec)) = (cap.get(0), cap.name(SPEC_GROUP)) else {
            continue;
        };
        if !accept(whole.start()) {
            continue;
        }
        records.push(Record {
            span: whole.range(),
            specifier_span: Some(spec.range()),
            statement: Statement::DynamicImport {
                specifier: unquote(spec.as_str()),
            },
        });
    }

    // Earlier patterns win on overlap (e.g. `export {} from` over `export {}`)
    let mut accepted: Vec<Record> = Vec::with_capacity(records.len());
    for record in records {
        let overlaps = accepted
            .iter()
            .any(|r| r.span.start < record.span.end && record.span.start < r.span.end);
        if !overlaps {
            accepted.push(record);
        }
    }
    accepted.sort_by_key(|r| r.span.start);

    let commonjs_exports = CJS_EXPORTS_RE
        .find_iter(&masked)
        .any(|m| accept(m.start()));

    ModuleSyntax {
        records: accepted,
        commonjs_exports,
    }
}

// Capture group holding the quoted specifier
const SPEC_GROUP: &str = "spec";

fn preceded_by_dot(text: &str, start: usize) -> bool {
    text[..start].trim_end().ends_with('.')
}

fn unquote(quoted: &str) -> String {
    quoted[1..quoted.len() - 1].to_string()
}

/// Parse `a, b as c` into (name, alias) pairs; alias defaults to name
fn parse_specifier_list(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let part = part.strip_prefix("type ").unwrap_or(part).trim();
            let mut words = part.split_whitespace();
            let name = words.next()?.to_string();
            match (words.next(), words.next()) {
                (Some("as"), Some(alias)) => Some((name, alias.to_string())),
                _ => Some((name.clone(), name)),
            }
        })
        .collect()
}

fn parse_import_clause(clause: &str) -> ImportClause {
    let clause = clause.trim();
    let clause = clause.strip_prefix("type ").unwrap_or(clause);
    let mut result = ImportClause::default();

    let (outside, named) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if open < close => (
            format!("{}{}", &clause[..open], &clause[close + 1..]),
            Some(&clause[open + 1..close]),
        ),
        _ => (clause.to_string(), None),
    };

    if let Some(named) = named {
        result.named = parse_specifier_list(named);
    }

    for part in outside.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(ns) = part.strip_prefix('*') {
            let ns = ns.trim().strip_prefix("as").unwrap_or(ns).trim();
            result.namespace = Some(ns.to_string());
        } else {
            result.default = Some(part.to_string());
        }
    }

    result
}

/// Names bound by every declarator of a `const`/`let`/`var` statement
fn binding_names(rest: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = rest;
    loop {
        let Some((target, after)) = declarator_target(rest) else {
            break;
        };
        names.extend(target_names(target));
        match next_declarator(after) {
            Some(next) => rest = next,
            None => break,
        }
    }
    names
}

/// Split the binding target of a declarator from what follows it
fn declarator_target(rest: &str) -> Option<(&str, &str)> {
    let rest = rest.trim_start();
    let end = match rest.as_bytes().first()? {
        b'{' => matching_close(rest, b'{', b'}')? + 1,
        b'[' => matching_close(rest, b'[', b']')? + 1,
        _ => IDENT_RE.find(rest)?.end(),
    };
    Some(rest.split_at(end))
}

/// Skip a declarator's initializer; the text after a depth-0 comma, or
/// `None` once the statement ends
fn next_declarator(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_quoted(bytes, i);
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' if depth == 0 => return None,
            b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => return Some(&text[i + 1..]),
            b';' if depth == 0 => return None,
            b'\n' if depth == 0 && !continues_after_newline(&text[..i], &text[i + 1..]) => {
                return None;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Whether a line break inside an initializer keeps the statement going
fn continues_after_newline(before: &str, after: &str) -> bool {
    let ends_with_operator = before
        .trim_end()
        .ends_with(['=', '+', '-', '*', '/', '%', '&', '|', '^', '!', '?', ':', '<', '>', ',', '.', '(']);
    let starts_with_operator = after
        .trim_start()
        .starts_with([',', '.', '?', ':', '+', '-', '*', '/', '%', '&', '|', '^', '=', '<', '>']);
    ends_with_operator || starts_with_operator
}

/// Index just past the literal opening at `start`
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Names bound by a single binding target
fn target_names(target: &str) -> Vec<String> {
    let target = target.trim_start();
    match target.as_bytes().first() {
        Some(b'{') | Some(b'[') => {
            let (open, close) = if target.starts_with('{') {
                (b'{', b'}')
            } else {
                (b'[', b']')
            };
            match matching_close(target, open, close) {
                Some(end) => pattern_names(&target[1..end]),
                None => Vec::new(),
            }
        }
        _ => IDENT_RE
            .find(target)
            .map(|m| vec![m.as_str().to_string()])
            .unwrap_or_default(),
    }
}

fn matching_close(text: &str, open: u8, close: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_quoted(bytes, i);
                continue;
            }
            b if b == open => depth += 1,
            b if b == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Identifiers bound by a destructuring pattern body
fn pattern_names(body: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut parts = Vec::new();
    for (i, c) in body.char_indices() {
        match c {
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);

    for part in parts {
        let part = part.trim().trim_start_matches("...");
        // drop a default value
        let part = match part.find('=') {
            Some(eq) if !part[..eq].contains(['{', '[']) => &part[..eq],
            _ => part,
        };
        // `key: target` binds the target
        let target = match part.find(':') {
            Some(colon) if !part[..colon].contains(['{', '[']) => part[colon + 1..].trim(),
            _ => part.trim(),
        };
        if target.starts_with('{') || target.starts_with('[') {
            names.extend(target_names(target));
        } else if let Some(m) = IDENT_RE.find(target) {
            names.push(m.as_str().to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_source(source: &str) -> ModuleSyntax {
        let segments = lexer::segment(source).unwrap();
        scan(source, &segments)
    }

    #[test]
    fn test_parse_imports() {
        let syntax = scan_source(
            r#"
            import foo from 'foo';
            import { bar, baz as qux } from "bar";
            import * as all from 'all';
            import def, { named } from './mixed.js';
            import 'side-effect';
            "#,
        );

        let imports: Vec<_> = syntax
            .records
            .iter()
            .map(|r| match &r.statement {
                Statement::Import { specifier, clause } => (specifier.as_str(), clause.clone()),
                other => panic!("unexpected {other:?}"),
            })
            .collect();

        assert_eq!(imports.len(), 5);
        assert_eq!(imports[0].0, "foo");
        assert_eq!(imports[0].1.default.as_deref(), Some("foo"));
        assert_eq!(
            imports[1].1.named,
            vec![("bar".into(), "bar".into()), ("baz".into(), "qux".into())]
        );
        assert_eq!(imports[2].1.namespace.as_deref(), Some("all"));
        assert_eq!(imports[3].1.default.as_deref(), Some("def"));
        assert_eq!(imports[3].1.named, vec![("named".into(), "named".into())]);
        assert!(imports[4].1.is_empty());
        assert_eq!(imports[4].0, "side-effect");
    }

    #[test]
    fn test_multiline_import() {
        let syntax = scan_source("import {\n  a,\n  b as c,\n} from './x.js';\nconsole.log(a);");
        assert_eq!(syntax.records.len(), 1);
        assert_eq!(syntax.specifiers(), vec!["./x.js"]);
    }

    #[test]
    fn test_parse_exports() {
        let syntax = scan_source(
            r#"
            export default function main() {}
            export { foo, bar as baz };
            export * from 'reexport';
            export * as ns from 'namespace';
            export { a as b } from './ab.js';
            export const { x, y: z, ...rest } = obj;
            export async function handler() {}
            export class Widget {}
            "#,
        );

        let (names, stars) = syntax.export_names();
        assert_eq!(stars, vec!["reexport"]);
        for expected in ["default", "foo", "baz", "ns", "b", "x", "z", "rest", "handler", "Widget"] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(syntax
            .records
            .iter()
            .any(|r| r.statement == Statement::ExportDefault(Some("main".into()))));
    }

    #[test]
    fn test_export_every_declarator() {
        let syntax = scan_source(
            "export const a = 1, b = 2;\n\
             export let f = (x, y) => ({ x, y }), [first, , third] = list, s = 'q, r';\n\
             export var total = a +\n  b, last = 'end'\n\
             const notExported = 1, other = 2;",
        );
        let (names, _) = syntax.export_names();
        assert_eq!(names, vec!["a", "b", "f", "first", "third", "s", "total", "last"]);
    }

    #[test]
    fn test_export_declaration_ends_at_line_break() {
        let syntax = scan_source("export let value = compute()\nlog(value, other)");
        let (names, _) = syntax.export_names();
        assert_eq!(names, vec!["value"]);
    }

    #[test]
    fn test_export_decl_span_covers_keyword_only() {
        let source = "export const answer = 42;";
        let syntax = scan_source(source);
        assert_eq!(&source[syntax.records[0].span.clone()], "export ");
    }

    #[test]
    fn test_require_calls() {
        let syntax = scan_source("const a = require('a');\nconst b = obj.require('b');");
        assert_eq!(syntax.specifiers(), vec!["a"]);
        assert!(!syntax.is_esm());
        assert!(!syntax.commonjs_exports);
    }

    #[test]
    fn test_commonjs_exports() {
        assert!(scan_source("module.exports = { a: 1 };").commonjs_exports);
        assert!(scan_source("exports.answer = 42;").commonjs_exports);
        assert!(!scan_source("if (exports.answer === 42) {}").commonjs_exports);
        assert!(!scan_source("const s = 'module.exports';").commonjs_exports);
    }

    #[test]
    fn test_ignores_strings_and_comments() {
        let syntax = scan_source(
            "const s = \"import x from 'nope'\";\n// import y from 'nope2'\n/* require('nope3') */",
        );
        assert!(syntax.records.is_empty());
    }

    #[test]
    fn test_dynamic_import() {
        let source = "const m = await import('./lazy.js');\nconsole.log(import.meta.url, import(name));";
        let syntax = scan_source(source);
        assert_eq!(syntax.records.len(), 1);
        assert_eq!(&source[syntax.records[0].span.clone()], "import('./lazy.js')");
        assert_eq!(syntax.specifiers(), vec!["./lazy.js"]);
        assert_eq!(syntax.import_kind("./lazy.js"), ImportKind::DynamicImport);
        assert!(!syntax.is_esm());
    }

    #[test]
    fn test_import_kind_prefers_static() {
        let syntax = scan_source("import x from 'a';\nconst y = require('a');\nconst z = require('b');");
        assert_eq!(syntax.import_kind("a"), ImportKind::ImportStatement);
        assert_eq!(syntax.import_kind("b"), ImportKind::RequireCall);
    }
}
