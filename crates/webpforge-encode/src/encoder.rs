//! Encoder traits driven by the conversion core.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use webpforge_common::Quality;

use crate::Result;

/// Factory for per-source encode sessions.
pub trait ImageEncoder: Send + Sync {
    /// Open `source` for encoding.
    ///
    /// Fails when the source cannot be read; an unsupported input is reported
    /// through [`EncodeSession::supports_format`] instead.
    fn open(&self, source: &Path) -> Result<Box<dyn EncodeSession>>;
}

/// Encoding state bound to one source image.
pub trait EncodeSession {
    /// Whether this session can write `format` from its source.
    fn supports_format(&self, format: ImageFormat) -> bool;

    /// Set the lossy quality used by subsequent writes.
    fn set_quality(&mut self, quality: Quality);

    /// Encode the full source into `target`, returning the bytes written.
    fn save(&mut self, target: &Path) -> Result<u64>;

    /// Write one resized file per request next to the source.
    ///
    /// Outputs are named `stem-WIDTHxHEIGHT.webp`. Every request gets an entry
    /// in the result, in request order, so callers can handle each one on its own.
    fn derive_sizes(&mut self, requests: &[SizeRequest]) -> Vec<DerivedSize>;
}

/// A thumbnail size to derive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeRequest {
    /// Size name from the attachment metadata.
    pub name: String,
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
}

/// Outcome of deriving one size.
#[derive(Debug)]
pub struct DerivedSize {
    /// Size name the request carried.
    pub name: String,
    /// Path the output was (or would have been) written to.
    pub path: PathBuf,
    /// Bytes written, or the failure for this size.
    pub result: Result<u64>,
}
