//! Database query modules.
//!
//! - attachments: per-original size metadata records

pub mod attachments;
