//! # webpforge-encode
//!
//! Image encoding interface for webpforge.
//!
//! This crate provides:
//! - The [`ImageEncoder`] / [`EncodeSession`] traits the conversion core drives
//! - [`CwebpEncoder`], a backend that shells out to Google's `cwebp`
//! - External tool detection for `cwebp`
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use webpforge_encode::{CwebpEncoder, ImageEncoder, ImageFormat};
//!
//! let encoder = CwebpEncoder::discover(None)?;
//! let mut session = encoder.open(Path::new("/uploads/photo.jpg"))?;
//! if session.supports_format(ImageFormat::WebP) {
//!     let written = session.save(Path::new("/uploads/photo.webp"))?;
//!     println!("wrote {} bytes", written);
//! }
//! # Ok::<(), webpforge_encode::Error>(())
//! ```

mod cwebp;
mod encoder;
mod error;
pub mod tools;

// Re-exports
pub use cwebp::{center_crop, CwebpEncoder};
pub use encoder::{DerivedSize, EncodeSession, ImageEncoder, SizeRequest};
pub use error::{Error, Result};
pub use image::ImageFormat;
pub use tools::{check_tool, check_tools, ToolInfo};
