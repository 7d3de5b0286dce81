//! Webpforge-DB: SQLite store for attachment size metadata
//!
//! This crate keeps the per-original size records the conversion engine
//! consults, using SQLite with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `pool` - Connection pool management
//! - `queries` - Database query operations
//! - `schema` - Attachments table creation and version check
//! - `store` - [`MetadataProvider`](webpforge_common::MetadataProvider) implementation
//!
//! # Example
//!
//! ```no_run
//! use webpforge_common::MetadataProvider;
//! use webpforge_db::SqliteMetadataStore;
//!
//! let store = SqliteMetadataStore::open("/var/lib/webpforge/metadata.db").unwrap();
//! if let Some(meta) = store.lookup("2024/05/photo.jpg").unwrap() {
//!     println!("{} sizes", meta.sizes.len());
//! }
//! ```

pub mod pool;
pub mod queries;
pub mod schema;
mod store;

pub use store::SqliteMetadataStore;
