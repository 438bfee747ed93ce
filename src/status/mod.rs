//! Job status module
//!
//! Tracks the lifecycle of a job in a key-value table keyed by `jobId`.
//!
//! # Overview
//!
//! The status module provides:
//! - `StatusTable` - the seam every status read and write goes through
//! - `DynamoStatusTable` - DynamoDB-backed table
//! - `InMemoryStatusTable` - process-local table with a write history
//! - `StatusUpdate` / `JobRecord` - what is written and what is read back

mod dynamo;
mod memory;
mod types;

pub use dynamo::DynamoStatusTable;
pub use memory::InMemoryStatusTable;
pub use types::{JobRecord, StatusUpdate};

use crate::error::Result;
use async_trait::async_trait;

/// Storage for job status items
///
/// Writes are blind overwrites of the named attributes; no implementation
/// checks the prior status.
#[async_trait]
pub trait StatusTable: Send + Sync {
    /// Apply a status update to the item keyed by `job_id`
    async fn update(&self, job_id: &str, update: &StatusUpdate) -> Result<()>;

    /// Read the item keyed by `job_id`
    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>>;
}
