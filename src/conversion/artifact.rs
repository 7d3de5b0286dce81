//! Physical state of derived artifacts and the validation+fallback protocol.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};

use super::error::{ConversionError, Result};

/// What currently sits at an artifact path.
///
/// Probed with `symlink_metadata`, so a fallback link is reported as a link
/// and never followed to the original it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Absent,
    Regular { len: u64, modified: SystemTime },
    FallbackLink { modified: SystemTime },
}

impl ArtifactState {
    pub fn probe(path: &Path) -> io::Result<Self> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::Absent),
            Err(e) => return Err(e),
        };

        let file_type = meta.file_type();
        if file_type.is_symlink() {
            Ok(Self::FallbackLink {
                modified: meta.modified()?,
            })
        } else if file_type.is_file() {
            Ok(Self::Regular {
                len: meta.len(),
                modified: meta.modified()?,
            })
        } else {
            Err(io::Error::other(format!(
                "artifact path is not a file: {}",
                path.display()
            )))
        }
    }

    pub fn exists(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    pub fn is_fallback_link(&self) -> bool {
        matches!(self, Self::FallbackLink { .. })
    }

    /// Whether the artifact counts as up to date for an original modified at
    /// `original_modified`. Fallback links count too.
    pub fn is_fresh(&self, original_modified: SystemTime) -> bool {
        match self {
            Self::Absent => false,
            Self::Regular { modified, .. } | Self::FallbackLink { modified } => {
                *modified >= original_modified
            }
        }
    }
}

/// Delete whatever sits at `path`, including dangling links.
///
/// Returns whether anything was removed.
pub fn remove_artifact(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Point `target` at `source` with a relative link to the source's file name.
///
/// Anything already at `target` is replaced.
pub fn create_fallback_link(target: &Path, source: &Path) -> io::Result<()> {
    let link_to = source
        .file_name()
        .ok_or_else(|| io::Error::other(format!("source has no file name: {}", source.display())))?;

    remove_artifact(target)?;
    symlink(Path::new(link_to), target)?;
    debug!("Linked {:?} -> {:?}", target, link_to);
    Ok(())
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}

/// Check a freshly written artifact: it must exist, be non-empty, and when
/// `max_len` is given be strictly smaller than it.
fn validate(target: &Path, max_len: Option<u64>) -> std::result::Result<u64, String> {
    let state = ArtifactState::probe(target).map_err(|e| e.to_string())?;
    match state {
        ArtifactState::Absent => Err("no output written".to_string()),
        ArtifactState::FallbackLink { .. } => Err("output is a link".to_string()),
        ArtifactState::Regular { len: 0, .. } => Err("empty output".to_string()),
        ArtifactState::Regular { len, .. } => match max_len {
            Some(max) if len >= max => Err(format!(
                "output is {} bytes, source is only {} bytes",
                len, max
            )),
            _ => Ok(len),
        },
    }
}

/// Apply the validation+fallback protocol to one encode of `source` into `target`.
///
/// On success returns the artifact size. On an encode or validation failure
/// the partial output is removed and, when `source` is given, replaced by a
/// fallback link to it; the recoverable error is then returned. Without a
/// `source` only the emptiness rule applies and a bad output is just deleted.
///
/// Cleanup failures are returned as [`ConversionError::Io`].
pub(crate) fn settle(
    target: &Path,
    source: Option<&Path>,
    encoded: webpforge_encode::Result<u64>,
) -> Result<u64> {
    let max_len = match source {
        Some(source) => Some(fs::metadata(source)?.len()),
        None => None,
    };

    let failure = match encoded {
        Err(e) => ConversionError::encode(target, e),
        Ok(_) => match validate(target, max_len) {
            Ok(len) => return Ok(len),
            Err(reason) => ConversionError::validation(target, reason),
        },
    };

    Err(fall_back(target, source, failure)?)
}

/// Clean up after `failure` on `target`: remove the partial output and, when
/// `source` is given, link the target to it.
///
/// Hands `failure` back once the target is safe.
pub(crate) fn fall_back(
    target: &Path,
    source: Option<&Path>,
    failure: ConversionError,
) -> Result<ConversionError> {
    warn!("{}", failure);
    remove_artifact(target)?;
    if let Some(source) = source {
        create_fallback_link(target, source)?;
    }
    Ok(failure)
}

/// Replace the artifact of `original` with a fallback link if an interrupted
/// run left it empty or not smaller than the original.
///
/// Returns whether a repair was made. Links and sound artifacts are left alone.
pub fn repair_artifact(original: &Path, artifact: &Path) -> io::Result<bool> {
    let ArtifactState::Regular { len, .. } = ArtifactState::probe(artifact)? else {
        return Ok(false);
    };

    let original_len = fs::metadata(original)?.len();
    if len > 0 && len < original_len {
        return Ok(false);
    }

    create_fallback_link(artifact, original)?;
    Ok(true)
}
