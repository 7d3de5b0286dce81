//! `cwebp` subprocess backend.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::ImageFormat;
use webpforge_common::paths::thumbnail_path;
use webpforge_common::Quality;

use crate::encoder::{DerivedSize, EncodeSession, ImageEncoder, SizeRequest};
use crate::tools::{get_tool_path, CWEBP};
use crate::{Error, Result};

/// Input formats `cwebp` reads.
const CWEBP_INPUTS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Tiff,
    ImageFormat::WebP,
];

/// Encoder that shells out to `cwebp` once per written file.
#[derive(Debug, Clone)]
pub struct CwebpEncoder {
    binary: PathBuf,
}

impl CwebpEncoder {
    /// Use the `cwebp` binary at `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Locate `cwebp`, preferring a configured path over `PATH`.
    pub fn discover(configured: Option<&Path>) -> Result<Self> {
        get_tool_path(CWEBP, configured).map(Self::new)
    }

    /// Path of the binary this encoder runs.
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl ImageEncoder for CwebpEncoder {
    fn open(&self, source: &Path) -> Result<Box<dyn EncodeSession>> {
        if !source.is_file() {
            return Err(Error::file_not_found(source));
        }

        Ok(Box::new(CwebpSession {
            binary: self.binary.clone(),
            source: source.to_path_buf(),
            input_format: ImageFormat::from_path(source).ok(),
            quality: Quality::ARTIFACT_DEFAULT,
        }))
    }
}

struct CwebpSession {
    binary: PathBuf,
    source: PathBuf,
    input_format: Option<ImageFormat>,
    quality: Quality,
}

impl CwebpSession {
    fn run(&self, extra: &[String], target: &Path) -> Result<u64> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-quiet")
            .arg("-q")
            .arg(self.quality.to_string())
            .args(extra)
            .arg(&self.source)
            .arg("-o")
            .arg(target);

        #[cfg(feature = "tracing")]
        tracing::debug!("Running {:?}", cmd);

        let output = cmd.output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::tool_not_found(self.binary.display().to_string()),
            _ => Error::Io(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match output.status.code() {
                Some(code) => format!("exit code {}: {}", code, stderr.trim()),
                None => format!("terminated by signal: {}", stderr.trim()),
            };
            return Err(Error::tool_failed(CWEBP, message));
        }

        Ok(std::fs::metadata(target)?.len())
    }
}

impl EncodeSession for CwebpSession {
    fn supports_format(&self, format: ImageFormat) -> bool {
        format == ImageFormat::WebP
            && self
                .input_format
                .map(|input| CWEBP_INPUTS.contains(&input))
                .unwrap_or(false)
    }

    fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    fn save(&mut self, target: &Path) -> Result<u64> {
        self.run(&[], target)
    }

    fn derive_sizes(&mut self, requests: &[SizeRequest]) -> Vec<DerivedSize> {
        let dimensions = image::image_dimensions(&self.source);

        requests
            .iter()
            .map(|request| {
                let path = thumbnail_path(&self.source, request.width, request.height);
                let result = match &dimensions {
                    Ok((src_w, src_h)) => {
                        let (x, y, w, h) =
                            center_crop(*src_w, *src_h, request.width, request.height);
                        let args = [
                            "-crop".to_string(),
                            x.to_string(),
                            y.to_string(),
                            w.to_string(),
                            h.to_string(),
                            "-resize".to_string(),
                            request.width.to_string(),
                            request.height.to_string(),
                        ];
                        self.run(&args, &path)
                    }
                    Err(e) => Err(Error::Unsupported(format!(
                        "cannot read dimensions of {}: {}",
                        self.source.display(),
                        e
                    ))),
                };

                DerivedSize {
                    name: request.name.clone(),
                    path,
                    result,
                }
            })
            .collect()
    }
}

/// Centered crop of a `src_w`x`src_h` image matching the `dst_w`:`dst_h` aspect.
///
/// Returns `(x, y, width, height)`. The whole image is returned when any
/// dimension is zero or the aspect ratios already match.
pub fn center_crop(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> (u32, u32, u32, u32) {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return (0, 0, src_w, src_h);
    }

    let (sw, sh, dw, dh) = (
        u64::from(src_w),
        u64::from(src_h),
        u64::from(dst_w),
        u64::from(dst_h),
    );

    if sw * dh > dw * sh {
        // Source is wider: trim left and right
        let w = ((sh * dw + dh / 2) / dh).clamp(1, sw) as u32;
        ((src_w - w) / 2, 0, w, src_h)
    } else if sw * dh < dw * sh {
        // Source is taller: trim top and bottom
        let h = ((sw * dh + dw / 2) / dw).clamp(1, sh) as u32;
        (0, (src_h - h) / 2, src_w, h)
    } else {
        (0, 0, src_w, src_h)
    }
}
