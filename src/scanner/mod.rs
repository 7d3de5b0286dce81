//! Candidate discovery.
//!
//! Walks the configured source roots and yields the originals a batch run
//! should look at, in a stable order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;
use webpforge_common::paths::has_extension;

/// Enumerates candidate originals below a set of roots.
pub trait FileEnumerator: Send + Sync {
    /// List regular files under `roots` whose extension is in `extensions`
    /// (case-insensitive) and whose file name `exclude` does not reject.
    ///
    /// Unreadable directories are skipped silently.
    fn enumerate(
        &self,
        roots: &[PathBuf],
        extensions: &[String],
        exclude: &dyn Fn(&str) -> bool,
    ) -> Vec<PathBuf>;
}

/// `walkdir`-backed enumerator. Links are not followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkdirEnumerator;

impl WalkdirEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl FileEnumerator for WalkdirEnumerator {
    fn enumerate(
        &self,
        roots: &[PathBuf],
        extensions: &[String],
        exclude: &dyn Fn(&str) -> bool,
    ) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for root in roots {
            if !root.is_dir() {
                warn!("Source path is not a directory: {:?}", root);
                continue;
            }

            let walker = WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name();

            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }

                let path = entry.path();
                if !has_extension(path, extensions) {
                    continue;
                }

                let name = entry.file_name().to_string_lossy();
                if exclude(&name) {
                    debug!("Excluded {:?}", path);
                    continue;
                }

                // Overlapping roots must not yield the same file twice
                if seen.insert(path.to_path_buf()) {
                    files.push(path.to_path_buf());
                }
            }
        }

        files
    }
}

/// Whether any of `roots` exists as a directory.
pub fn any_root_exists(roots: &[PathBuf]) -> bool {
    roots.iter().any(|r| Path::new(r).is_dir())
}
