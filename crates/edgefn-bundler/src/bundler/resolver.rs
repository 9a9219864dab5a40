// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution (Node.js algorithm, browser-flavored)
//!
//! Runtime built-ins are not known here: plugins claim them before the
//! resolver runs. Anything that reaches this point must exist on disk.

use crate::error::{BundleError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Extensions probed, in order, for extensionless specifiers
pub const EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "json"];

/// package.json `exports` conditions honored, in priority order
const CONDITIONS: &[&str] = &["browser", "import", "module", "default"];

/// Kind of file a specifier resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// JavaScript source
    Script,
    /// JSON data
    Json,
}

impl FileKind {
    /// Kind of a resolved path, judged by its extension
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => FileKind::Json,
            _ => FileKind::Script,
        }
    }
}

/// Resolves specifiers to files on disk
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    /// package.json fields consulted for a package entry
    main_fields: Vec<String>,
}

impl ModuleResolver {
    /// Create a resolver consulting `main_fields` in order
    pub fn new(main_fields: Vec<String>) -> Self {
        Self { main_fields }
    }

    /// Resolve a specifier imported from `importer`
    pub fn resolve(&self, specifier: &str, importer: &Path) -> Result<PathBuf> {
        let not_found = || BundleError::resolve(specifier, importer);

        let resolved = if is_path_specifier(specifier) {
            let parent_dir = importer.parent().unwrap_or(Path::new("."));
            self.resolve_file(&parent_dir.join(specifier))
        } else if specifier.starts_with("node:") || specifier.contains(':') {
            // Scheme-qualified specifiers only resolve through plugins
            None
        } else {
            self.resolve_node_modules(specifier, importer)
        };

        let path = resolved.ok_or_else(not_found)?;
        if path.extension().is_some_and(|e| e == "node") {
            return Err(BundleError::syntax(
                &path,
                "native addons cannot be bundled for the edge runtime",
            ));
        }
        Ok(path.canonicalize().unwrap_or(path))
    }

    /// Resolve a file path, probing extensions and directory indexes
    fn resolve_file(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }

        for ext in EXTENSIONS {
            // Append rather than replace: `./lib.min` -> `./lib.min.js`
            let mut name = path.file_name()?.to_os_string();
            name.push(".");
            name.push(ext);
            let candidate = path.with_file_name(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if path.is_dir() {
            return self.resolve_directory(path);
        }

        None
    }

    /// Resolve a directory (package.json entry, then index files)
    fn resolve_directory(&self, dir: &Path) -> Option<PathBuf> {
        if let Some(pkg) = PackageJson::read(dir) {
            if let Some(entry) = pkg.exports_entry(".") {
                if let Some(found) = self.resolve_file(&dir.join(entry)) {
                    return Some(found);
                }
            }
            for field in &self.main_fields {
                if let Some(entry) = pkg.field(field) {
                    if let Some(found) = self.resolve_file(&dir.join(entry)) {
                        return Some(found);
                    }
                }
            }
        }

        EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("index.{ext}")))
            .find(|index| index.is_file())
    }

    /// Resolve a module from node_modules
    fn resolve_node_modules(&self, specifier: &str, importer: &Path) -> Option<PathBuf> {
        let (package_name, subpath) = parse_package_specifier(specifier);

        // Walk up directory tree looking for node_modules
        let mut current = importer.parent();
        while let Some(dir) = current {
            let package_dir = dir.join("node_modules").join(package_name);

            if package_dir.is_dir() {
                return match subpath {
                    Some(sub) => {
                        let exported = PackageJson::read(&package_dir).and_then(|pkg| {
                            pkg.exports_entry(&format!("./{sub}")).map(str::to_owned)
                        });
                        match exported {
                            Some(entry) => self.resolve_file(&package_dir.join(entry)),
                            None => self.resolve_file(&package_dir.join(sub)),
                        }
                    }
                    None => self.resolve_directory(&package_dir),
                };
            }

            current = dir.parent();
        }

        None
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new(vec!["browser".into(), "module".into(), "main".into()])
    }
}

/// Whether a specifier names a path rather than a package
pub fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || specifier.starts_with('/')
        || (cfg!(windows) && specifier.chars().nth(1) == Some(':'))
}

/// Parse a package specifier into name and optional subpath
fn parse_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    if specifier.starts_with('@') {
        // Scoped package: @scope/name or @scope/name/subpath
        if let Some(slash_pos) = specifier[1..].find('/') {
            let after_scope = &specifier[slash_pos + 2..];
            if let Some(subpath_pos) = after_scope.find('/') {
                let name_end = slash_pos + 2 + subpath_pos;
                return (&specifier[..name_end], Some(&specifier[name_end + 1..]));
            }
        }
        (specifier, None)
    } else {
        match specifier.split_once('/') {
            Some((name, sub)) => (name, Some(sub)),
            None => (specifier, None),
        }
    }
}

/// The parts of package.json that matter for resolution
#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    exports: Option<serde_json::Value>,
    #[serde(flatten)]
    fields: serde_json::Map<String, serde_json::Value>,
}

impl PackageJson {
    fn read(dir: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(dir.join("package.json")).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// A string-valued entry field such as `main` or `module`
    fn field(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            serde_json::Value::String(entry) => Some(entry),
            _ => None,
        }
    }

    /// Target of `subpath` in the `exports` map
    fn exports_entry(&self, subpath: &str) -> Option<&str> {
        let exports = self.exports.as_ref()?;
        match exports {
            serde_json::Value::String(entry) if subpath == "." => Some(entry),
            serde_json::Value::Object(map) => {
                let is_subpath_map = map.keys().any(|k| k.starts_with('.'));
                if is_subpath_map {
                    map.get(subpath).and_then(select_condition)
                } else if subpath == "." {
                    select_condition(exports)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Pick the first honored condition from a conditional export
fn select_condition(value: &serde_json::Value) -> Option<&str> {
    match value {
        serde_json::Value::String(entry) => Some(entry),
        serde_json::Value::Object(map) => CONDITIONS
            .iter()
            .filter_map(|condition| map.get(*condition))
            .find_map(select_condition),
        serde_json::Value::Array(options) => options.iter().find_map(select_condition),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_package_specifier() {
        assert_eq!(parse_package_specifier("lodash"), ("lodash", None));
        assert_eq!(parse_package_specifier("lodash/get"), ("lodash", Some("get")));
        assert_eq!(parse_package_specifier("@types/node"), ("@types/node", None));
        assert_eq!(
            parse_package_specifier("@babel/core/lib/index"),
            ("@babel/core", Some("lib/index"))
        );
    }

    #[test]
    fn test_resolve_relative_with_extension_probe() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.js"), "").unwrap();
        fs::write(dir.path().join("util.mjs"), "").unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/index.js"), "").unwrap();

        let resolver = ModuleResolver::default();
        let importer = dir.path().join("main.js");

        let util = resolver.resolve("./util", &importer).unwrap();
        assert!(util.ends_with("util.mjs"));

        let lib = resolver.resolve("./lib", &importer).unwrap();
        assert!(lib.ends_with("lib/index.js"));

        assert!(matches!(
            resolver.resolve("./missing", &importer),
            Err(BundleError::Resolve { .. })
        ));
    }

    #[test]
    fn test_resolve_package_main_fields() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/pkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{"main": "cjs.js", "module": "esm.js"}"#,
        )
        .unwrap();
        fs::write(pkg.join("cjs.js"), "").unwrap();
        fs::write(pkg.join("esm.js"), "").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let importer = dir.path().join("src/main.js");

        let resolved = ModuleResolver::default().resolve("pkg", &importer).unwrap();
        assert!(resolved.ends_with("esm.js"));

        let cjs_only = ModuleResolver::new(vec!["main".into()]);
        assert!(cjs_only.resolve("pkg", &importer).unwrap().ends_with("cjs.js"));
    }

    #[test]
    fn test_resolve_package_exports() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/@scope/pkg");
        fs::create_dir_all(pkg.join("dist")).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{
                "main": "dist/node.js",
                "exports": {
                    ".": { "node": "./dist/node.js", "import": "./dist/index.mjs" },
                    "./feature": { "default": "./dist/feature.js" }
                }
            }"#,
        )
        .unwrap();
        fs::write(pkg.join("dist/node.js"), "").unwrap();
        fs::write(pkg.join("dist/index.mjs"), "").unwrap();
        fs::write(pkg.join("dist/feature.js"), "").unwrap();
        let importer = dir.path().join("main.js");

        let resolver = ModuleResolver::default();
        assert!(resolver.resolve("@scope/pkg", &importer).unwrap().ends_with("dist/index.mjs"));
        assert!(resolver
            .resolve("@scope/pkg/feature", &importer)
            .unwrap()
            .ends_with("dist/feature.js"));
    }

    #[test]
    fn test_resolve_subpath_prefers_exports_map() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/pkg");
        fs::create_dir_all(pkg.join("lib")).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{"exports": {".": "./lib/index.js", "./sub": "./lib/sub-impl.js"}}"#,
        )
        .unwrap();
        fs::write(pkg.join("lib/index.js"), "").unwrap();
        fs::write(pkg.join("lib/sub-impl.js"), "").unwrap();
        fs::write(pkg.join("sub.js"), "").unwrap();
        let importer = dir.path().join("main.js");

        let resolver = ModuleResolver::default();
        assert!(resolver.resolve("pkg/sub", &importer).unwrap().ends_with("lib/sub-impl.js"));
        // Subpaths missing from the map fall back to the package directory
        fs::write(pkg.join("other.js"), "").unwrap();
        assert!(resolver.resolve("pkg/other", &importer).unwrap().ends_with("other.js"));
    }

    #[test]
    fn test_bare_builtin_is_not_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let importer = dir.path().join("main.js");
        let resolver = ModuleResolver::default();
        assert!(resolver.resolve("fs", &importer).is_err());
        assert!(resolver.resolve("node:crypto", &importer).is_err());
    }
}
