//! Path rules shared by the scanner, the conversion engine and the encoders.
//!
//! Derived artifacts always live next to their original and only differ by
//! extension. Thumbnails follow the `stem-WIDTHxHEIGHT.ext` convention used by
//! the upload tree, which is also how the scanner recognises and skips them.

use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Extension of every derived artifact.
pub const DERIVED_EXTENSION: &str = "webp";

/// Extensions converted when the configuration does not list any.
const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

fn thumbnail_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-[0-9]+x[0-9]+\.[^.]+$").expect("valid thumbnail regex"))
}

/// Map an original image path to its derived `.webp` path.
///
/// Only the final extension changes; the directory and stem are preserved.
/// A path that already ends in `.webp` maps to itself.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use webpforge_common::paths::to_derived_path;
///
/// assert_eq!(
///     to_derived_path(Path::new("/up/2024/cat.photo.jpeg")),
///     Path::new("/up/2024/cat.photo.webp"),
/// );
/// ```
#[must_use]
pub fn to_derived_path(path: &Path) -> PathBuf {
    path.with_extension(DERIVED_EXTENSION)
}

/// Check whether a file name carries a `-WIDTHxHEIGHT.ext` thumbnail suffix.
///
/// # Examples
///
/// ```
/// use webpforge_common::paths::is_thumbnail_name;
///
/// assert!(is_thumbnail_name("photo-1024x768.png"));
/// assert!(!is_thumbnail_name("photo-final.png"));
/// ```
#[must_use]
pub fn is_thumbnail_name(file_name: &str) -> bool {
    thumbnail_pattern().is_match(file_name)
}

/// Path of the `width`x`height` derived thumbnail generated from `base`.
///
/// The thumbnail sits next to `base` and is named `stem-WIDTHxHEIGHT.webp`.
#[must_use]
pub fn thumbnail_path(base: &Path, width: u32, height: u32) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(format!(
        "{}-{}x{}.{}",
        stem, width, height, DERIVED_EXTENSION
    ))
}

/// Replace the final component of `path` with `file_name`.
#[must_use]
pub fn sibling_path(path: &Path, file_name: &str) -> PathBuf {
    path.with_file_name(file_name)
}

/// Lexically clean `path`: drop `.` components and fold `..` into its parent.
///
/// The filesystem is not consulted, so symlinks are left alone. A leading
/// `..` on a relative path is kept.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use webpforge_common::paths::normalize_path;
///
/// assert_eq!(normalize_path(Path::new("./uploads/2024/../x.jpg")), Path::new("uploads/x.jpg"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

/// Storage-relative key of `path` below `base_dir`, using `/` separators.
///
/// Both sides are lexically normalized first, so `./uploads` matches
/// `uploads/photo.jpg`. Returns `None` when `path` is not inside `base_dir`.
#[must_use]
pub fn relative_key(base_dir: &Path, path: &Path) -> Option<String> {
    let base_dir = normalize_path(base_dir);
    let path = normalize_path(path);
    let relative = path.strip_prefix(&base_dir).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Check if `path` has one of `extensions` (case-insensitive).
#[must_use]
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Get the list of source extensions used when none are configured.
///
/// # Examples
///
/// ```
/// use webpforge_common::paths::default_source_extensions;
///
/// assert!(default_source_extensions().contains(&"png"));
/// ```
#[must_use]
pub fn default_source_extensions() -> &'static [&'static str] {
    DEFAULT_SOURCE_EXTENSIONS
}
