use std::sync::OnceLock;
use tracing::debug;
use webpforge_common::Quality;

use crate::config::QualityConfig;

/// Resolves encode quality for a run.
///
/// The artifact quality starts at 82, then `encoder_default` and `webp`
/// overrides apply in that order. It is computed on first use and reused
/// for the rest of the run.
#[derive(Debug, Default)]
pub struct QualityResolver {
    config: QualityConfig,
    artifact: OnceLock<Quality>,
}

impl QualityResolver {
    pub fn new(config: QualityConfig) -> Self {
        Self {
            config,
            artifact: OnceLock::new(),
        }
    }

    /// Quality for main artifacts and thumbnails.
    pub fn artifact_quality(&self) -> Quality {
        *self.artifact.get_or_init(|| {
            let mut quality = Quality::ARTIFACT_DEFAULT;
            if let Some(q) = self.config.encoder_default {
                quality = q;
            }
            if let Some(q) = self.config.webp {
                quality = q;
            }
            debug!("Resolved WebP quality {}", quality);
            quality
        })
    }

    /// Quality for re-encoding an unscaled source; never overridden.
    pub fn source_quality(&self) -> Quality {
        Quality::SOURCE
    }
}
