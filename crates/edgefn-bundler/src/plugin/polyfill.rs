// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `async_hooks` polyfill
//!
//! The edge runtime has no `async_hooks`. When bundling, imports of it are
//! served by an in-memory module with a synchronous `AsyncLocalStorage`.

use super::{Plugin, ResolveRequest, Resolution};
use crate::error::Result;

/// Module key of the replacement module
pub const POLYFILL_NAME: &str = "virtual:async_hooks";

const ASYNC_LOCAL_STORAGE: &str = r#"export class AsyncLocalStorage {
  constructor() {
    this._store = undefined;
  }
  getStore() {
    return this._store;
  }
  run(store, callback, ...args) {
    const previous = this._store;
    this._store = store;
    try {
      return callback(...args);
    } finally {
      this._store = previous;
    }
  }
  exit(callback, ...args) {
    return this.run(undefined, callback, ...args);
  }
  enterWith(store) {
    this._store = store;
  }
  disable() {
    this._store = undefined;
  }
}
export default { AsyncLocalStorage };
"#;

/// Serves `async_hooks` from memory
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncLocalStoragePolyfill;

impl Plugin for AsyncLocalStoragePolyfill {
    fn name(&self) -> &'static str {
        "async-local-storage-polyfill"
    }

    fn on_resolve(&self, request: &ResolveRequest<'_>) -> Result<Option<Resolution>> {
        if request.specifier != "async_hooks" {
            return Ok(None);
        }
        Ok(Some(Resolution::Virtual {
            name: POLYFILL_NAME.to_string(),
            contents: ASYNC_LOCAL_STORAGE.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::ImportKind;

    #[test]
    fn test_serves_async_hooks_only() {
        let polyfill = AsyncLocalStoragePolyfill;
        let request = |specifier| ResolveRequest {
            specifier,
            importer: None,
            kind: ImportKind::ImportStatement,
        };

        match polyfill.on_resolve(&request("async_hooks")).unwrap() {
            Some(Resolution::Virtual { name, contents }) => {
                assert_eq!(name, POLYFILL_NAME);
                assert!(contents.contains("export class AsyncLocalStorage"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(polyfill.on_resolve(&request("events")).unwrap(), None);
    }
}
