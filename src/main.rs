// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! edgefn - bundle function code for the edge runtime
//!
//! This is the main entry point for the edgefn binary. The pipeline itself
//! lives in the `edgefn-bundler` crate.

mod cli;
mod diagnostics;

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use cli::{BundleArgs, Cli, Commands, ModulesArgs};
use diagnostics::TerminalDiagnostics;
use edgefn_bundler::registry::RUNTIME_PREFIX;
use edgefn_bundler::{
    BuildConfig, BuildRequest, EnvironmentVariables, IndicatifProgress, Pipeline, RuntimeRegistry,
};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Bundle(args) => run_bundle(args, &cli).await,
        Commands::Modules(args) => {
            run_modules(args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        // An interrupted or timed-out build may still occupy a blocking thread
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "edgefn=debug,edgefn_bundler=debug"
    } else {
        "edgefn=warn,edgefn_bundler=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();
}

async fn run_bundle(args: &BundleArgs, cli: &Cli) -> anyhow::Result<()> {
    let mut config = BuildConfig::load().context("failed to load configuration")?;
    if let Some(dir) = &args.scratch_dir {
        config.scratch_dir = dir.clone();
    }
    if args.no_minify {
        config.minify = false;
    }
    if cli.quiet || !atty::is(atty::Stream::Stderr) {
        config.progress = false;
    }
    config.validate()?;
    debug!(?config, "Resolved build configuration");

    let environment = EnvironmentVariables::load(&args.env, args.env_file.as_deref())?;
    let request = BuildRequest::new(&args.path)
        .bundle(!args.no_bundle)
        .environment(environment);

    let action = if request.bundle {
        "Bundling function code"
    } else {
        "Transforming function code"
    };
    let show_progress = config.progress;
    let mut pipeline =
        Pipeline::new(config).with_diagnostics(Arc::new(TerminalDiagnostics::new()));
    if show_progress {
        pipeline = pipeline.with_progress(Arc::new(IndicatifProgress::new(action)));
    }

    let task = tokio::task::spawn_blocking(move || pipeline.bundle(&request));
    let build = async {
        let result = task.await.context("bundling task failed")?;
        result.map_err(anyhow::Error::from)
    };
    let bounded = async {
        match args.timeout {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), build)
                .await
                .unwrap_or_else(|_| Err(anyhow!("build timed out after {secs}s"))),
            None => build.await,
        }
    };

    let artifact: PathBuf = tokio::select! {
        result = bounded => result?,
        _ = tokio::signal::ctrl_c() => bail!("interrupted"),
    };

    if !cli.quiet {
        eprintln!("{} {}", "✓".green().bold(), "Function code ready".bold());
    }
    println!("{}", artifact.display());
    Ok(())
}

fn run_modules(args: &ModulesArgs) {
    let registry = RuntimeRegistry::edge();

    if !args.unsupported {
        println!("{}", "Supported (imported as node:<name>):".bold());
        for name in registry.supported() {
            println!("  {}", format!("{RUNTIME_PREFIX}{name}").green());
        }
    }
    if !args.supported {
        if !args.unsupported {
            println!();
        }
        println!("{}", "Unsupported:".bold());
        for name in registry.unsupported() {
            println!("  {}", name.red());
        }
    }
}
