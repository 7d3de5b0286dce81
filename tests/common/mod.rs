//! Shared test harness for integration tests.
//!
//! Provides [`FakeEncoder`], a scriptable [`ImageEncoder`] that writes files of
//! chosen sizes instead of running `cwebp`, and [`Fixture`], a temporary upload
//! tree with in-memory metadata wired into a [`ConversionEngine`].

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;
use webpforge::conversion::{BatchRunner, ConversionEngine, QualityResolver, RunSettings};
use webpforge::metadata::InMemoryMetadata;
use webpforge_common::paths::thumbnail_path;
use webpforge_common::{AttachmentMetadata, MetadataProvider, Quality, SizeSpec};
use webpforge_encode::{
    DerivedSize, EncodeSession, Error, ImageEncoder, ImageFormat, Result, SizeRequest,
};

/// What the fake encoder does when writing a given target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Write exactly this many bytes.
    Bytes(u64),
    /// Write nothing and report a tool failure.
    Fail,
    /// Write a zero-byte file, then panic (a crash mid-encode).
    Panic,
}

/// One recorded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub source: PathBuf,
    pub target: PathBuf,
    pub quality: Quality,
}

#[derive(Default)]
struct Script {
    /// Behavior keyed by target file name.
    targets: HashMap<String, Behavior>,
    /// Sources whose `open` fails.
    open_errors: HashSet<String>,
    /// Sources reported as not convertible to WebP.
    unsupported: HashSet<String>,
    writes: Vec<Write>,
}

/// Scriptable encoder. Clones share their script and write log.
///
/// By default a full encode writes half the source size and a derived size
/// writes `width * height / 10` bytes.
#[derive(Clone, Default)]
pub struct FakeEncoder {
    script: Arc<Mutex<Script>>,
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the write of the target named `file_name`.
    pub fn on_target(&self, file_name: &str, behavior: Behavior) {
        self.script
            .lock()
            .unwrap()
            .targets
            .insert(file_name.to_string(), behavior);
    }

    /// Make opening the source named `file_name` fail.
    pub fn fail_open(&self, file_name: &str) {
        self.script
            .lock()
            .unwrap()
            .open_errors
            .insert(file_name.to_string());
    }

    /// Report the source named `file_name` as unsupported.
    pub fn unsupported(&self, file_name: &str) {
        self.script
            .lock()
            .unwrap()
            .unsupported
            .insert(file_name.to_string());
    }

    pub fn writes(&self) -> Vec<Write> {
        self.script.lock().unwrap().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.script.lock().unwrap().writes.len()
    }

    fn write(&self, source: &Path, target: &Path, quality: Quality, default_len: u64) -> Result<u64> {
        let behavior = {
            let mut script = self.script.lock().unwrap();
            script.writes.push(Write {
                source: source.to_path_buf(),
                target: target.to_path_buf(),
                quality,
            });
            script
                .targets
                .get(&file_name(target))
                .copied()
                .unwrap_or(Behavior::Bytes(default_len))
        };

        match behavior {
            Behavior::Bytes(len) => {
                fs::write(target, vec![0x52u8; len as usize])?;
                Ok(len)
            }
            Behavior::Fail => Err(Error::tool_failed("cwebp", "exit code 255: scripted failure")),
            Behavior::Panic => {
                fs::write(target, b"")?;
                panic!("scripted crash while encoding {}", source.display());
            }
        }
    }
}

impl ImageEncoder for FakeEncoder {
    fn open(&self, source: &Path) -> Result<Box<dyn EncodeSession>> {
        let name = file_name(source);
        let script = self.script.lock().unwrap();
        if script.open_errors.contains(&name) {
            return Err(Error::tool_failed("cwebp", "cannot read input"));
        }
        let supported = !script.unsupported.contains(&name);
        drop(script);

        let source_len = fs::metadata(source)?.len();
        Ok(Box::new(FakeSession {
            encoder: self.clone(),
            source: source.to_path_buf(),
            source_len,
            supported,
            quality: Quality::ARTIFACT_DEFAULT,
        }))
    }
}

struct FakeSession {
    encoder: FakeEncoder,
    source: PathBuf,
    source_len: u64,
    supported: bool,
    quality: Quality,
}

impl EncodeSession for FakeSession {
    fn supports_format(&self, format: ImageFormat) -> bool {
        self.supported && format == ImageFormat::WebP
    }

    fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
    }

    fn save(&mut self, target: &Path) -> Result<u64> {
        let len = (self.source_len / 2).max(1);
        self.encoder.write(&self.source, target, self.quality, len)
    }

    fn derive_sizes(&mut self, requests: &[SizeRequest]) -> Vec<DerivedSize> {
        requests
            .iter()
            .map(|request| {
                let path = thumbnail_path(&self.source, request.width, request.height);
                let len = (u64::from(request.width) * u64::from(request.height) / 10).max(1);
                let result = self.encoder.write(&self.source, &path, self.quality, len);
                DerivedSize {
                    name: request.name.clone(),
                    path,
                    result,
                }
            })
            .collect()
    }
}

/// Metadata provider that fails for chosen keys and returns an empty record otherwise.
pub struct FlakyMetadata {
    failing: HashSet<String>,
}

impl FlakyMetadata {
    pub fn failing_for(keys: &[&str]) -> Self {
        Self {
            failing: keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl MetadataProvider for FlakyMetadata {
    fn lookup(&self, relative_path: &str) -> webpforge_common::Result<Option<AttachmentMetadata>> {
        if self.failing.contains(relative_path) {
            Err(webpforge_common::Error::database("database is locked"))
        } else {
            Ok(Some(AttachmentMetadata::default()))
        }
    }
}

/// A temporary upload tree.
pub struct Fixture {
    pub dir: TempDir,
    pub encoder: FakeEncoder,
    pub metadata: Arc<InMemoryMetadata>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            encoder: FakeEncoder::new(),
            metadata: Arc::new(InMemoryMetadata::new()),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write an image of `len` bytes at `relative`, creating directories.
    pub fn image(&self, relative: &str, len: usize) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, vec![0xFFu8; len]).unwrap();
        path
    }

    /// Record metadata for `relative` with the given `(name, file, width, height)` sizes.
    pub fn with_sizes(&self, relative: &str, sizes: &[(&str, &str, u32, u32)]) {
        self.with_metadata(relative, metadata(None, sizes));
    }

    pub fn with_metadata(&self, relative: &str, meta: AttachmentMetadata) {
        self.metadata.insert(relative, meta);
    }

    pub fn engine(&self) -> ConversionEngine {
        self.engine_with(Box::new(self.metadata.clone()))
    }

    pub fn engine_with(&self, metadata: Box<dyn MetadataProvider>) -> ConversionEngine {
        self.engine_based_at(self.root(), metadata)
    }

    /// An engine whose metadata keys are relative to `base_dir`.
    pub fn engine_based_at(
        &self,
        base_dir: impl Into<PathBuf>,
        metadata: Box<dyn MetadataProvider>,
    ) -> ConversionEngine {
        ConversionEngine::new(
            Box::new(self.encoder.clone()),
            metadata,
            QualityResolver::default(),
            base_dir,
        )
    }

    pub fn settings(&self) -> RunSettings {
        RunSettings {
            roots: vec![self.root().to_path_buf()],
            extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            niceness: None,
            max_files: None,
        }
    }

    pub fn runner(&self) -> BatchRunner {
        BatchRunner::new(Arc::new(self.engine()), self.settings())
    }
}

/// Build a metadata record.
pub fn metadata(original_image: Option<&str>, sizes: &[(&str, &str, u32, u32)]) -> AttachmentMetadata {
    AttachmentMetadata {
        original_image: original_image.map(str::to_string),
        sizes: sizes
            .iter()
            .map(|(name, file, width, height)| {
                (
                    name.to_string(),
                    SizeSpec {
                        file: file.to_string(),
                        width: *width,
                        height: *height,
                    },
                )
            })
            .collect(),
    }
}

/// Move the modification time of `path` by `offset_secs` relative to now.
pub fn touch(path: &Path, offset_secs: i64) {
    let now = SystemTime::now();
    let time = if offset_secs >= 0 {
        now + Duration::from_secs(offset_secs as u64)
    } else {
        now - Duration::from_secs(offset_secs.unsigned_abs())
    };
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// Whether `path` is a fallback link to `target_name`.
pub fn is_link_to(path: &Path, target_name: &str) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
        && fs::read_link(path).map(|t| t == Path::new(target_name)).unwrap_or(false)
}

/// Size of the regular file at `path`, or `None` if it is absent or a link.
pub fn regular_len(path: &Path) -> Option<u64> {
    fs::symlink_metadata(path)
        .ok()
        .filter(|m| m.file_type().is_file())
        .map(|m| m.len())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
