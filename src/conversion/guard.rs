//! Exit-time repair for interrupted runs.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use webpforge_common::paths::to_derived_path;

use super::artifact::repair_artifact;

/// State scoped to one batch run.
#[derive(Debug, Default)]
pub struct RunContext {
    in_flight: Option<PathBuf>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` as the file currently being converted, replacing the previous one.
    pub fn begin(&mut self, path: &Path) {
        self.in_flight = Some(path.to_path_buf());
    }

    /// The most recently attempted original.
    pub fn in_flight(&self) -> Option<&Path> {
        self.in_flight.as_deref()
    }
}

/// Repairs the in-flight artifact if the run never reached its normal end.
///
/// The runner creates the guard before its loop and calls [`CrashGuard::disarm`]
/// after it. If a panic unwinds through the loop instead, `Drop` inspects the
/// artifact of the last attempted file and swaps a zero-byte or oversized
/// output for a fallback link so the next run does not serve or retry it.
#[derive(Debug)]
pub struct CrashGuard {
    context: RunContext,
    armed: bool,
}

impl CrashGuard {
    pub fn arm() -> Self {
        Self {
            context: RunContext::new(),
            armed: true,
        }
    }

    /// Mark `path` as in flight.
    pub fn track(&mut self, path: &Path) {
        self.context.begin(path);
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// End the run normally; no repair happens on drop.
    pub fn disarm(mut self) -> RunContext {
        self.armed = false;
        std::mem::take(&mut self.context)
    }

    /// Repair the in-flight file's artifact now.
    ///
    /// Returns whether a fallback link was written. An original that no longer
    /// exists is left alone.
    pub fn repair(&self) -> io::Result<bool> {
        let Some(original) = self.context.in_flight() else {
            return Ok(false);
        };
        if !original.is_file() {
            return Ok(false);
        }

        let artifact = to_derived_path(original);
        let repaired = repair_artifact(original, &artifact)?;
        if repaired {
            info!("Replaced broken artifact {:?} with a fallback link", artifact);
        }
        Ok(repaired)
    }
}

impl Drop for CrashGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        if std::thread::panicking() {
            error!(
                "Conversion run aborted while processing {:?}",
                self.context.in_flight()
            );
        }

        if let Err(e) = self.repair() {
            warn!("Crash repair failed: {}", e);
        }
    }
}
