//! Batch conversion over the upload tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use webpforge_common::paths::is_thumbnail_name;

use super::engine::{ConversionEngine, ConversionOutcome};
use super::guard::CrashGuard;
use crate::config::Config;
use crate::scanner::{any_root_exists, FileEnumerator, WalkdirEnumerator};

/// Extra filter applied to every candidate after enumeration.
///
/// Returning `false` leaves the file out of the run.
pub type InclusionStrategy = Box<dyn Fn(&Path) -> bool + Send + Sync>;

/// Inputs of one batch run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Directories to scan.
    pub roots: Vec<PathBuf>,
    /// Lower-cased original extensions.
    pub extensions: Vec<String>,
    /// Niceness to apply before scanning, if any.
    pub niceness: Option<i32>,
    /// Stop after this many conversions.
    pub max_files: Option<usize>,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            roots: config.source_roots(),
            extensions: config.source_extensions(),
            niceness: Some(config.batch.niceness),
            max_files: config.batch.max_files,
        }
    }
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub candidates: usize,
    pub excluded: usize,
    pub converted: usize,
    pub fresh: usize,
    pub no_metadata: usize,
    pub unsupported: usize,
    pub failed: usize,
    pub errored: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &ConversionOutcome) {
        match outcome {
            ConversionOutcome::Converted => self.converted += 1,
            ConversionOutcome::SkippedFresh => self.fresh += 1,
            ConversionOutcome::SkippedNoMetadata => self.no_metadata += 1,
            ConversionOutcome::SkippedUnsupportedFormat => self.unsupported += 1,
            ConversionOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Runs the conversion engine over every candidate original, one at a time.
pub struct BatchRunner {
    engine: Arc<ConversionEngine>,
    enumerator: Box<dyn FileEnumerator>,
    settings: RunSettings,
    inclusion: Option<InclusionStrategy>,
}

impl BatchRunner {
    pub fn new(engine: Arc<ConversionEngine>, settings: RunSettings) -> Self {
        Self {
            engine,
            enumerator: Box::new(WalkdirEnumerator::new()),
            settings,
            inclusion: None,
        }
    }

    pub fn with_enumerator(mut self, enumerator: Box<dyn FileEnumerator>) -> Self {
        self.enumerator = enumerator;
        self
    }

    pub fn with_inclusion(mut self, inclusion: InclusionStrategy) -> Self {
        self.inclusion = Some(inclusion);
        self
    }

    pub fn engine(&self) -> &Arc<ConversionEngine> {
        &self.engine
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Convert every candidate once.
    ///
    /// A file whose conversion errors is logged and skipped; the run always
    /// continues with the next one.
    pub fn run(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();

        if let Some(niceness) = self.settings.niceness {
            lower_priority(niceness);
        }

        if !any_root_exists(&self.settings.roots) {
            warn!("No image directory found");
            return summary;
        }

        let candidates = self.enumerator.enumerate(
            &self.settings.roots,
            &self.settings.extensions,
            &is_thumbnail_name,
        );
        debug!("Found {} candidate images", candidates.len());

        let mut guard = CrashGuard::arm();

        for path in candidates {
            if let Some(include) = &self.inclusion {
                if !include(&path) {
                    summary.excluded += 1;
                    continue;
                }
            }

            if let Some(max) = self.settings.max_files {
                if summary.converted >= max {
                    info!("Reached the limit of {} conversions for this run", max);
                    break;
                }
            }

            summary.candidates += 1;
            guard.track(&path);

            match self.engine.convert(&path) {
                Ok(outcome) => {
                    if let ConversionOutcome::Failed(reason) = &outcome {
                        debug!("Fell back for {:?}: {}", path, reason);
                    }
                    summary.record(&outcome);
                }
                Err(e) => {
                    error!("Failed to convert {:?}: {}", path, e);
                    summary.errored += 1;
                }
            }
        }

        guard.disarm();

        if summary.converted > 0 {
            info!("{} images converted to WebP", summary.converted);
        }

        summary
    }
}

/// Lower this process's scheduling priority to `niceness`.
///
/// Advisory: a failure (for example raising priority without privileges) is
/// only logged.
#[cfg(unix)]
pub fn lower_priority(niceness: i32) {
    // SAFETY: setpriority takes plain integers and touches no memory we own.
    let ret = unsafe { libc::setpriority(libc::PRIO_PROCESS, 0, niceness) };
    if ret != 0 {
        debug!(
            "setpriority({}) failed: {}",
            niceness,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
pub fn lower_priority(niceness: i32) {
    debug!("Process priority is not adjusted on this platform ({})", niceness);
}
