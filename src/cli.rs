// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CLI argument parsing for edgefn.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// edgefn - bundle function code for the edge runtime
#[derive(Parser, Debug)]
#[command(name = "edgefn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (no progress bar or summary)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bundle a function into a single deployable file
    #[command(alias = "b")]
    Bundle(BundleArgs),

    /// List the runtime's supported and unsupported built-in modules
    Modules(ModulesArgs),
}

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Entry file of the function
    pub path: PathBuf,

    /// Transform the entry file only; imports are left unresolved
    #[arg(long)]
    pub no_bundle: bool,

    /// Environment variable exposed to the function (repeatable)
    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Read environment variables from a dotenv file
    #[arg(long, value_name = "FILE")]
    pub env_file: Option<PathBuf>,

    /// Directory the artifact is written to
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Keep whitespace and comments in the output
    #[arg(long)]
    pub no_minify: bool,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ModulesArgs {
    /// Only list supported modules
    #[arg(long, conflicts_with = "unsupported")]
    pub supported: bool,

    /// Only list unsupported modules
    #[arg(long)]
    pub unsupported: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bundle() {
        let cli = Cli::parse_from([
            "edgefn", "bundle", "src/index.js", "--no-bundle", "-e", "A=1", "--env", "B=2", "--timeout", "30",
        ]);
        match cli.command {
            Commands::Bundle(args) => {
                assert_eq!(args.path, PathBuf::from("src/index.js"));
                assert!(args.no_bundle);
                assert_eq!(args.env, vec!["A=1", "B=2"]);
                assert_eq!(args.timeout, Some(30));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_modules_flags_conflict() {
        assert!(Cli::try_parse_from(["edgefn", "modules", "--supported", "--unsupported"]).is_err());
    }
}
