//! Attachment size metadata and the lookup interface.
//!
//! Every original in the upload tree may have a metadata record describing
//! the thumbnail sizes generated for it and, for large uploads, the unscaled
//! source those sizes were cut from. Backends only need to answer lookups by
//! storage-relative path.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;

/// One named thumbnail size of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSpec {
    /// File name of the original-format thumbnail, in the attachment's directory.
    #[serde(alias = "filename")]
    pub file: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Size metadata recorded for one original.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    /// Unscaled source the sizes were derived from, when the original was downscaled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_image: Option<String>,

    /// Thumbnail sizes keyed by size name (e.g. "thumbnail", "medium").
    #[serde(default)]
    pub sizes: BTreeMap<String, SizeSpec>,
}

impl AttachmentMetadata {
    /// Parse a JSON metadata record.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to a JSON metadata record.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Lookup of attachment metadata by storage-relative path.
///
/// `Ok(None)` means the file is not a tracked attachment.
pub trait MetadataProvider: Send + Sync {
    /// Look up metadata for the original at `relative_path` (e.g. `2024/05/photo.jpg`).
    fn lookup(&self, relative_path: &str) -> Result<Option<AttachmentMetadata>>;
}

impl<T: MetadataProvider + ?Sized> MetadataProvider for Arc<T> {
    fn lookup(&self, relative_path: &str) -> Result<Option<AttachmentMetadata>> {
        (**self).lookup(relative_path)
    }
}

impl<T: MetadataProvider + ?Sized> MetadataProvider for Box<T> {
    fn lookup(&self, relative_path: &str) -> Result<Option<AttachmentMetadata>> {
        (**self).lookup(relative_path)
    }
}
