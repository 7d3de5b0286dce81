//! Per-file conversion.

use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::{debug, info, warn};
use webpforge_common::paths::{
    normalize_path, relative_key, sibling_path, thumbnail_path, to_derived_path,
};
use webpforge_common::{AttachmentMetadata, MetadataProvider};
use webpforge_encode::{DerivedSize, ImageEncoder, ImageFormat, SizeRequest};

use super::artifact::{fall_back, remove_artifact, settle, ArtifactState};
use super::error::{ConversionError, Result};
use super::quality::QualityResolver;

/// How a single `convert` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// The main artifact was written (size variants may have fallen back individually).
    Converted,
    /// The artifact (or its fallback link) is at least as new as the original.
    SkippedFresh,
    /// The main artifact was written but the original is not a tracked attachment.
    SkippedNoMetadata,
    /// The encoder cannot produce WebP from this input.
    SkippedUnsupportedFormat,
    /// The main artifact failed and was replaced by a fallback link.
    Failed(String),
}

/// Converts originals into WebP artifacts.
pub struct ConversionEngine {
    encoder: Box<dyn ImageEncoder>,
    metadata: Box<dyn MetadataProvider>,
    quality: QualityResolver,
    base_dir: PathBuf,
    /// `base_dir` made absolute with symlinks resolved.
    resolved_base: PathBuf,
}

impl ConversionEngine {
    /// Create an engine. `base_dir` is the root metadata keys are relative to.
    pub fn new(
        encoder: Box<dyn ImageEncoder>,
        metadata: Box<dyn MetadataProvider>,
        quality: QualityResolver,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        let base_dir = base_dir.into();
        let resolved_base = resolve_dir(&base_dir);
        Self {
            encoder,
            metadata,
            quality,
            base_dir,
            resolved_base,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn quality(&self) -> &QualityResolver {
        &self.quality
    }

    /// Convert `path` and every size its metadata declares.
    ///
    /// Encode and validation failures are handled per target with a fallback
    /// link and never surface as `Err`. `Err` means the original could not be
    /// read, the metadata backend failed, or a fallback could not be written.
    pub fn convert(&self, path: &Path) -> Result<ConversionOutcome> {
        let original_modified = fs::metadata(path)?.modified()?;
        let webp_path = to_derived_path(path);
        if webp_path == path {
            return Ok(ConversionOutcome::SkippedUnsupportedFormat);
        }

        let state = ArtifactState::probe(&webp_path)?;
        if state.is_fresh(original_modified) {
            debug!("Up to date: {:?}", webp_path);
            return Ok(ConversionOutcome::SkippedFresh);
        }
        if state.exists() {
            debug!("Removing stale artifact {:?}", webp_path);
            remove_artifact(&webp_path)?;
        }

        let mut session = match self.encoder.open(path) {
            Ok(session) => session,
            Err(e) => {
                let failure = ConversionError::encode(&webp_path, e);
                return Ok(into_failed(fall_back(&webp_path, Some(path), failure)?));
            }
        };
        if !session.supports_format(ImageFormat::WebP) {
            debug!("WebP not supported for {:?}", path);
            return Ok(ConversionOutcome::SkippedUnsupportedFormat);
        }

        session.set_quality(self.quality.artifact_quality());
        let saved = session.save(&webp_path);
        match settle(&webp_path, Some(path), saved) {
            Ok(len) => debug!("Wrote {:?} ({} bytes)", webp_path, len),
            Err(e) if e.is_recoverable() => return Ok(into_failed(e)),
            Err(e) => return Err(e),
        }
        drop(session);

        let Some(metadata) = self.lookup(path)? else {
            debug!("No attachment metadata for {:?}", path);
            return Ok(ConversionOutcome::SkippedNoMetadata);
        };

        let base = self
            .convert_original_image(path, &metadata)?
            .unwrap_or_else(|| webp_path.clone());

        if !metadata.sizes.is_empty() {
            self.convert_sizes(path, &base, &metadata)?;
        }

        info!("Converted {:?}", path);
        Ok(ConversionOutcome::Converted)
    }

    /// Deletion hook: remove the artifact derived from `path` in any state.
    ///
    /// Returns `path` unchanged so it can sit in a chain of deletion handlers.
    pub fn on_original_deleted(&self, path: &Path) -> PathBuf {
        remove_derived(path);
        path.to_path_buf()
    }

    fn lookup(&self, path: &Path) -> Result<Option<AttachmentMetadata>> {
        let key = relative_key(&self.base_dir, path)
            .or_else(|| relative_key(&self.resolved_base, &resolve_file(path)));
        match key {
            Some(key) => Ok(self.metadata.lookup(&key)?),
            None => {
                debug!("{:?} is outside {:?}", path, self.base_dir);
                Ok(None)
            }
        }
    }

    /// Re-encode the unscaled original named by the metadata.
    ///
    /// Returns its artifact path when it was written as a regular file.
    fn convert_original_image(
        &self,
        path: &Path,
        metadata: &AttachmentMetadata,
    ) -> Result<Option<PathBuf>> {
        let Some(name) = metadata.original_image.as_deref() else {
            return Ok(None);
        };

        let source = sibling_path(path, name);
        if source == path {
            return Ok(None);
        }
        if !source.is_file() {
            warn!("Original image {:?} is missing", source);
            return Ok(None);
        }

        let target = to_derived_path(&source);
        remove_artifact(&target)?;

        let mut session = match self.encoder.open(&source) {
            Ok(session) => session,
            Err(e) => {
                fall_back(&target, Some(&source), ConversionError::encode(&target, e))?;
                return Ok(None);
            }
        };
        if !session.supports_format(ImageFormat::WebP) {
            debug!("WebP not supported for {:?}", source);
            return Ok(None);
        }

        session.set_quality(self.quality.source_quality());
        let saved = session.save(&target);
        match settle(&target, Some(&source), saved) {
            Ok(_) => Ok(Some(target)),
            Err(e) if e.is_recoverable() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Derive every declared size from `base`, validating each against its
    /// original-format thumbnail next to `path`.
    fn convert_sizes(&self, path: &Path, base: &Path, metadata: &AttachmentMetadata) -> Result<()> {
        let requests: Vec<SizeRequest> = metadata
            .sizes
            .iter()
            .map(|(name, size)| SizeRequest {
                name: name.clone(),
                width: size.width,
                height: size.height,
            })
            .collect();

        for request in &requests {
            remove_artifact(&thumbnail_path(base, request.width, request.height))?;
        }

        let derived = match self.encoder.open(base) {
            Ok(mut session) => {
                session.set_quality(self.quality.artifact_quality());
                session.derive_sizes(&requests)
            }
            Err(e) => {
                warn!("Cannot open thumbnail base {:?}: {}", base, e);
                requests
                    .iter()
                    .map(|request| DerivedSize {
                        name: request.name.clone(),
                        path: thumbnail_path(base, request.width, request.height),
                        result: Err(webpforge_encode::Error::Unsupported(e.to_string())),
                    })
                    .collect()
            }
        };

        for size in derived {
            let thumbnail = metadata
                .sizes
                .get(&size.name)
                .map(|spec| sibling_path(path, &spec.file))
                .filter(|p| p.is_file());

            match settle(&size.path, thumbnail.as_deref(), size.result) {
                Ok(len) => debug!("Wrote size {} ({} bytes) to {:?}", size.name, len, size.path),
                Err(e) if e.is_recoverable() => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

/// Remove the artifact derived from `path`, logging instead of failing.
///
/// Returns whether anything was removed.
pub fn remove_derived(path: &Path) -> bool {
    let webp_path = to_derived_path(path);
    if webp_path == path {
        return false;
    }

    match remove_artifact(&webp_path) {
        Ok(removed) => {
            if removed {
                info!("Removed {:?}", webp_path);
            }
            removed
        }
        Err(e) => {
            warn!("Failed to remove {:?}: {}", webp_path, e);
            false
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize_path(path);
    }
    match env::current_dir() {
        Ok(cwd) => normalize_path(&cwd.join(path)),
        Err(_) => normalize_path(path),
    }
}

fn resolve_dir(dir: &Path) -> PathBuf {
    fs::canonicalize(dir).unwrap_or_else(|_| absolute(dir))
}

/// Resolve the directory of `path` but keep its file name, so an original
/// that is itself a symlink still maps to its own key.
fn resolve_file(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            resolve_dir(parent).join(name)
        }
        (_, Some(name)) => resolve_dir(Path::new(".")).join(name),
        _ => absolute(path),
    }
}

fn into_failed(failure: ConversionError) -> ConversionOutcome {
    ConversionOutcome::Failed(failure.to_string())
}
