//! Webpforge-Common: Shared types, path rules, and the metadata interface.
//!
//! This crate provides the pieces every other webpforge crate agrees on:
//!
//! - **Path Rules**: derived `.webp` paths, thumbnail naming and detection
//! - **Metadata**: per-attachment size records and the [`MetadataProvider`] trait
//! - **Quality**: the validated 1-100 encode quality newtype
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use webpforge_common::paths::{is_thumbnail_name, to_derived_path};
//! use std::path::Path;
//!
//! let webp = to_derived_path(Path::new("/uploads/2024/05/photo.jpg"));
//! assert_eq!(webp, Path::new("/uploads/2024/05/photo.webp"));
//!
//! assert!(is_thumbnail_name("photo-150x150.jpg"));
//! assert!(!is_thumbnail_name("photo.jpg"));
//! ```

pub mod error;
pub mod metadata;
pub mod paths;
pub mod quality;

pub use error::{Error, Result};
pub use metadata::{AttachmentMetadata, MetadataProvider, SizeSpec};
pub use quality::Quality;
