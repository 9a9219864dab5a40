// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! End-to-end tests for the bundling pipeline

use edgefn_bundler::{
    BuildConfig, BuildOrchestrator, BuildRequest, BundleError, Diagnostics, EnvironmentVariables,
    Pipeline,
};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Default)]
struct Collected {
    unsupported: Mutex<Vec<String>>,
    require_warnings: Mutex<Vec<PathBuf>>,
}

impl Diagnostics for Collected {
    fn unsupported_module(&self, name: &str) {
        self.unsupported.lock().push(name.to_string());
    }

    fn require_syntax(&self, path: &Path) {
        self.require_warnings.lock().push(path.to_path_buf());
    }
}

struct Fixture {
    dir: TempDir,
    diagnostics: Arc<Collected>,
    pipeline: Pipeline,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(|_| {})
    }

    fn with_config(adjust: impl FnOnce(&mut BuildConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BuildConfig {
            scratch_dir: dir.path().join("scratch"),
            progress: false,
            ..Default::default()
        };
        adjust(&mut config);

        let diagnostics = Arc::new(Collected::default());
        let pipeline = Pipeline::new(config).with_diagnostics(diagnostics.clone());
        Self {
            dir,
            diagnostics,
            pipeline,
        }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    fn unsupported(&self) -> Vec<String> {
        let mut names = self.diagnostics.unsupported.lock().clone();
        names.sort();
        names
    }
}

#[test]
fn supported_builtin_becomes_runtime_import() {
    let fx = Fixture::new();
    let entry = fx.write(
        "index.js",
        "import { createHash } from 'crypto';\n\
         export default function handler(body) {\n  return createHash('sha256').update(body).digest('hex');\n}\n",
    );

    let artifact = fx.pipeline.bundle(&BuildRequest::new(&entry)).unwrap();
    let code = fs::read_to_string(&artifact).unwrap();

    assert!(artifact.starts_with(fx.dir.path().join("scratch")));
    assert!(code.contains("node:crypto"));
    assert!(!code.contains("\"crypto\""));
    assert!(!code.contains("'crypto'"));
    assert!(fx.unsupported().is_empty());
}

#[test]
fn local_modules_are_inlined() {
    let fx = Fixture::with_config(|c| c.minify = false);
    fx.write("lib/greet.js", "export function greet(name) { return `hi ${name}`; }\n");
    fx.write("lib/data.json", "{ \"who\": \"edge\" }\n");
    let entry = fx.write(
        "main.js",
        "import { greet } from './lib/greet.js';\n\
         import data from './lib/data.json';\n\
         export default function handler() { return greet(data.who); }\n",
    );

    let artifact = fx.pipeline.bundle(&BuildRequest::new(&entry)).unwrap();
    let code = fs::read_to_string(artifact).unwrap();

    assert!(code.contains("function greet(name)"));
    assert!(code.contains("\"edge\""));
    assert!(!code.contains("./lib/greet.js"));
    assert!(code.contains("export default"));
}

#[test]
fn banner_reflects_environment() {
    let fx = Fixture::new();
    let entry = fx.write("index.js", "export default () => globalThis.edgefn.env.API_KEY;\n");

    let env = EnvironmentVariables::from_pairs(["API_KEY=abc", "MODE=prod"]).unwrap();
    let with_env = fx
        .pipeline
        .bundle(&BuildRequest::new(&entry).environment(env))
        .unwrap();
    let code = fs::read_to_string(&with_env).unwrap();
    assert!(code.starts_with("globalThis.edgefn={env:{"));
    assert!(code.contains("\"API_KEY\":\"abc\""));
    assert!(code.contains("\"MODE\":\"prod\""));

    let without_env = fx.pipeline.bundle(&BuildRequest::new(&entry)).unwrap();
    let code = fs::read_to_string(&without_env).unwrap();
    assert!(!code.contains("globalThis.edgefn={"));
}

#[test]
fn unsupported_modules_reported_on_failure() {
    let fx = Fixture::new();
    let entry = fx.write(
        "index.js",
        "import { readFileSync } from 'node:fs';\nimport net from 'net';\nexport default () => 1;\n",
    );

    let err = fx.pipeline.bundle(&BuildRequest::new(&entry)).unwrap_err();

    match err {
        BundleError::BundlingFailed(message) => assert!(message.contains("net")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fx.unsupported(), vec!["net".to_string(), "node:fs".to_string()]);
}

#[test]
fn duplicate_forms_warn_once() {
    let fx = Fixture::new();
    let entry = fx.write(
        "index.js",
        "import 'node:os';\nimport os from 'os';\nexport default () => os;\n",
    );

    let _ = fx.pipeline.bundle(&BuildRequest::new(&entry));

    assert_eq!(fx.unsupported().len(), 1);
}

#[test]
fn failed_transform_returns_source_path() {
    let fx = Fixture::new();
    let entry = fx.write(
        "index.js",
        "const broken = \"never closed;\nexport default broken;\n",
    );

    let path = fx
        .pipeline
        .bundle(&BuildRequest::new(&entry).bundle(false))
        .unwrap();

    assert_eq!(path, entry);
}

#[test]
fn transform_keeps_imports_unresolved() {
    let fx = Fixture::with_config(|c| c.minify = false);
    let entry = fx.write(
        "index.js",
        "import { join } from 'path';\nimport helper from './missing.js';\nexport default () => join(helper, 'x');\n",
    );

    let artifact = fx
        .pipeline
        .bundle(&BuildRequest::new(&entry).bundle(false))
        .unwrap();
    let code = fs::read_to_string(&artifact).unwrap();

    assert_ne!(artifact, entry);
    assert!(code.contains("from \"node:path\""));
    assert!(code.contains("from './missing.js'"));
}

#[test]
fn require_usage_is_flagged() {
    let fx = Fixture::new();
    let entry = fx.write(
        "index.js",
        "const { createHash } = require('crypto');\nmodule.exports = () => createHash('md5');\n",
    );

    let _ = fx.pipeline.bundle(&BuildRequest::new(&entry));

    assert_eq!(*fx.diagnostics.require_warnings.lock(), vec![entry]);
}

#[test]
fn sequential_requests_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BuildOrchestrator::new(BuildConfig {
        scratch_dir: dir.path().join("scratch"),
        progress: false,
        ..Default::default()
    });

    fs::create_dir(dir.path().join("a")).unwrap();
    fs::create_dir(dir.path().join("b")).unwrap();
    let first = dir.path().join("a/index.js");
    let second = dir.path().join("b/index.js");
    fs::write(&first, "import 'node:dns';\nexport default () => 1;\n").unwrap();
    fs::write(&second, "import 'node:url';\nexport default () => 2;\n").unwrap();

    let a = orchestrator.run(&BuildRequest::new(&first).bundle(false));
    let b = orchestrator.run(&BuildRequest::new(&second).bundle(false));

    assert!(a.is_success() && b.is_success());
    assert_ne!(a.path(), b.path());
    assert_eq!(
        a.unsupported_modules_used().iter().cloned().collect::<Vec<_>>(),
        vec!["node:dns".to_string()]
    );
    assert!(b.unsupported_modules_used().is_empty());
    assert!(fs::read_to_string(a.path()).unwrap().contains("node:dns"));
    assert!(fs::read_to_string(b.path()).unwrap().contains("node:url"));
}

#[test]
fn dynamic_imports_are_bundled() {
    let fx = Fixture::with_config(|c| c.minify = false);
    fx.write("lazy.js", "export const answer = 42, question = '?';\n");
    let entry = fx.write(
        "index.js",
        "export default async () => (await import('./lazy.js')).answer;\n",
    );

    let artifact = fx.pipeline.bundle(&BuildRequest::new(&entry)).unwrap();
    let code = fs::read_to_string(artifact).unwrap();

    assert!(!code.contains("./lazy.js"));
    assert!(code.contains("__rt_require(1)"));
    assert!(code.contains(r#""answer": () => answer, "question": () => question"#));
}

#[test]
fn dynamic_import_of_unsupported_module_is_reported() {
    let fx = Fixture::new();
    let entry = fx.write(
        "index.js",
        "export default async () => (await import('fs')).readFileSync('x');\n",
    );

    let err = fx.pipeline.bundle(&BuildRequest::new(&entry)).unwrap_err();

    assert!(matches!(err, BundleError::BundlingFailed(_)));
    assert_eq!(fx.unsupported(), vec!["fs".to_string()]);
}

#[test]
fn async_hooks_is_polyfilled_when_bundling() {
    let fx = Fixture::new();
    let entry = fx.write(
        "index.js",
        "import { AsyncLocalStorage } from 'async_hooks';\n\
         const store = new AsyncLocalStorage();\n\
         export default () => store.run(1, () => store.getStore());\n",
    );

    let artifact = fx.pipeline.bundle(&BuildRequest::new(&entry)).unwrap();
    let code = fs::read_to_string(artifact).unwrap();

    assert!(code.contains("AsyncLocalStorage"));
    assert!(!code.contains("node:async_hooks"));
}
