// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Build progress reporting

use super::Plugin;
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::sync::Arc;

/// Percentage shown as soon as the build starts
const INITIAL_PERCENT: u8 = 10;

/// Receives build progress
pub trait ProgressReporter: Send + Sync {
    /// The build started
    fn on_start(&self);

    /// Percentage complete, 0 to 100
    fn on_progress(&self, percent: u8);

    /// The build finished or failed
    fn on_stop(&self);
}

/// Discards progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_start(&self) {}
    fn on_progress(&self, _percent: u8) {}
    fn on_stop(&self) {}
}

/// Terminal progress bar
pub struct IndicatifProgress {
    message: String,
    bar: Mutex<Option<ProgressBar>>,
}

impl IndicatifProgress {
    /// Create a bar labelled with `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            bar: Mutex::new(None),
        }
    }
}

impl ProgressReporter for IndicatifProgress {
    fn on_start(&self) {
        let pb = ProgressBar::new(100);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}% ({elapsed})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(self.message.clone());
        pb.set_position(u64::from(INITIAL_PERCENT));
        *self.bar.lock() = Some(pb);
    }

    fn on_progress(&self, percent: u8) {
        if let Some(pb) = self.bar.lock().as_ref() {
            // never move backwards
            pb.set_position(pb.position().max(u64::from(percent)));
        }
    }

    fn on_stop(&self) {
        if let Some(pb) = self.bar.lock().take() {
            pb.finish_and_clear();
        }
    }
}

/// Plugin forwarding build lifecycle to a [`ProgressReporter`]
#[derive(Clone)]
pub struct ProgressPlugin {
    reporter: Arc<dyn ProgressReporter>,
}

impl ProgressPlugin {
    /// Wrap a reporter
    pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self { reporter }
    }
}

impl Plugin for ProgressPlugin {
    fn name(&self) -> &'static str {
        "progress"
    }

    fn on_start(&self) -> Result<()> {
        self.reporter.on_start();
        self.reporter.on_progress(INITIAL_PERCENT);
        Ok(())
    }

    fn on_progress(&self, percent: u8) {
        self.reporter.on_progress(percent);
    }

    fn on_end(&self, success: bool) {
        if success {
            self.reporter.on_progress(100);
        }
        self.reporter.on_stop();
    }
}
