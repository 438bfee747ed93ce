//! Object storage module
//!
//! Wraps an `object_store` backend bound to a single bucket.
//!
//! # Overview
//!
//! - `ObjectStorage::s3` - AWS S3 (or an S3-compatible endpoint)
//! - `ObjectStorage::local` - a directory on the local filesystem
//! - `ObjectStorage::in_memory` - process-local store, used by tests

mod bucket;

pub use bucket::{ObjectStorage, JSON_CONTENT_TYPE};
