//! WebP conversion core.
//!
//! Turns each original image into a `.webp` artifact next to it, plus one
//! artifact per thumbnail size its metadata declares. It includes:
//!
//! - Quality resolution from configuration
//! - Artifact probing, validation and the fallback link
//! - The per-file conversion engine and deletion hook
//! - The batch runner and its crash guard
//!
//! # Fallback links
//!
//! An artifact that fails to encode, or that comes out empty or not smaller
//! than its source, is replaced by a relative symlink to the source's file
//! name. Web servers then serve the original bytes under the `.webp` name,
//! and the freshness check treats the link as current so the file is not
//! retried every run. Touching the original makes it stale again.

mod artifact;
mod engine;
mod error;
mod guard;
mod quality;
mod runner;

pub use artifact::{create_fallback_link, remove_artifact, repair_artifact, ArtifactState};
pub use engine::{remove_derived, ConversionEngine, ConversionOutcome};
pub use error::{ConversionError, Result};
pub use guard::{CrashGuard, RunContext};
pub use quality::QualityResolver;
pub use runner::{lower_priority, BatchRunner, BatchSummary, InclusionStrategy, RunSettings};
