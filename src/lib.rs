//! Webpforge - WebP generation for image upload trees
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod conversion;
pub mod metadata;
pub mod scanner;
pub mod schedule;
pub mod watch;

use anyhow::{Context, Result};
use std::sync::Arc;
use webpforge_encode::CwebpEncoder;

use config::Config;
use conversion::{BatchRunner, ConversionEngine, QualityResolver, RunSettings};

/// Build a conversion engine backed by `cwebp` and the configured metadata store.
pub fn build_engine(config: &Config) -> Result<ConversionEngine> {
    let encoder = CwebpEncoder::discover(config.tools.cwebp_path.as_deref())
        .context("cwebp is required for conversion")?;
    tracing::debug!("Using cwebp at {:?}", encoder.binary());

    let metadata = metadata::open_provider(&config.metadata)?;

    Ok(ConversionEngine::new(
        Box::new(encoder),
        metadata,
        QualityResolver::new(config.quality.clone()),
        config.source.base_dir.clone(),
    ))
}

/// Build a batch runner for the configured source tree.
pub fn build_runner(config: &Config) -> Result<BatchRunner> {
    let engine = Arc::new(build_engine(config)?);
    Ok(BatchRunner::new(engine, RunSettings::from_config(config)))
}
