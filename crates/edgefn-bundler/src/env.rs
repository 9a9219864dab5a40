// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Environment variables injected into the function artifact
//!
//! Variables come from `KEY=VALUE` pairs and/or a dotenv-style file and are
//! exposed to the deployed function as `globalThis.<global>.env`, through a
//! banner prepended to the compiled output.

use crate::error::{BundleError, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Name/value mapping injected into the artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentVariables {
    vars: BTreeMap<String, String>,
}

impl EnvironmentVariables {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `KEY=VALUE` pairs; the value may itself contain `=`
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut env = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| BundleError::InvalidEnvironment(format!("expected KEY=VALUE, got '{pair}'")))?;
            env.insert(key.trim(), value)?;
        }
        Ok(env)
    }

    /// Parse a dotenv-style file
    pub fn from_env_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut env = Self::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=').ok_or_else(|| {
                BundleError::InvalidEnvironment(format!(
                    "{}:{}: expected KEY=VALUE",
                    path.display(),
                    index + 1
                ))
            })?;

            env.insert(key.trim(), unquote(value.trim()))?;
        }

        debug!("Loaded {} variables from {}", env.len(), path.display());
        Ok(env)
    }

    /// Merge an optional env file with explicit pairs; pairs win on conflict
    pub fn load<S: AsRef<str>>(pairs: &[S], env_file: Option<&Path>) -> Result<Self> {
        let mut env = match env_file {
            Some(path) => Self::from_env_file(path)?,
            None => Self::new(),
        };
        env.vars.extend(Self::from_pairs(pairs)?.vars);
        Ok(env)
    }

    /// Insert a variable
    pub fn insert(&mut self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(BundleError::InvalidEnvironment("variable name cannot be empty".into()));
        }
        self.vars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Look up a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether there are no variables
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentVariables {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Build the source preamble exposing `env` on `globalThis.<global_name>`.
///
/// Returns `None` for an empty mapping so no global is touched. Keys and
/// values are emitted as JSON string literals.
pub fn build_banner(env: &EnvironmentVariables, global_name: &str) -> Option<String> {
    if env.is_empty() {
        return None;
    }

    let entries: Vec<String> = env
        .iter()
        .map(|(key, value)| format!("{}:{}", quote(key), quote(value)))
        .collect();

    Some(format!(
        "globalThis.{global_name}={{env:{{{}}}}};\n",
        entries.join(",")
    ))
}

fn quote(text: &str) -> String {
    // Serializing a &str cannot fail
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_pairs() {
        let env = EnvironmentVariables::from_pairs(["API_KEY=abc", "URL=https://x?a=b"]).unwrap();
        assert_eq!(env.get("API_KEY"), Some("abc"));
        assert_eq!(env.get("URL"), Some("https://x?a=b"));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_from_pairs_rejects_malformed() {
        assert!(matches!(
            EnvironmentVariables::from_pairs(["NOPE"]),
            Err(BundleError::InvalidEnvironment(_))
        ));
        assert!(matches!(
            EnvironmentVariables::from_pairs(["=value"]),
            Err(BundleError::InvalidEnvironment(_))
        ));
    }

    #[test]
    fn test_env_file_and_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "export TOKEN=\"secret\"").unwrap();
        writeln!(file, "REGION='eu'").unwrap();
        writeln!(file, "MODE=dev").unwrap();

        let env = EnvironmentVariables::load(&["MODE=prod"], Some(file.path())).unwrap();
        assert_eq!(env.get("TOKEN"), Some("secret"));
        assert_eq!(env.get("REGION"), Some("eu"));
        assert_eq!(env.get("MODE"), Some("prod"));
    }

    #[test]
    fn test_empty_env_has_no_banner() {
        assert_eq!(build_banner(&EnvironmentVariables::new(), "edgefn"), None);
    }

    #[test]
    fn test_banner_exposes_values() {
        let env: EnvironmentVariables = [("API_KEY", "abc"), ("B", "2")].into_iter().collect();
        let banner = build_banner(&env, "edgefn").unwrap();
        assert_eq!(banner, "globalThis.edgefn={env:{\"API_KEY\":\"abc\",\"B\":\"2\"}};\n");
    }

    #[test]
    fn test_banner_escapes_quotes() {
        let env: EnvironmentVariables = [("MSG", "say \"hi\"")].into_iter().collect();
        let banner = build_banner(&env, "edgefn").unwrap();
        assert!(banner.contains(r#""MSG":"say \"hi\"""#));
    }
}
