// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::unused_async)]

//! # Parquet to JSON job
//!
//! A single-shot batch job that converts one Parquet object in S3 into a
//! JSON array of records, writes it to an output bucket, and tracks the
//! job's lifecycle in a DynamoDB status table.
//!
//! ## Features
//!
//! - **Job-host arguments**: `--NAME value` resolution with unknown options ignored
//! - **Status tracking**: RUNNING, then COMPLETED or FAILED, with `updatedAt` stamps
//! - **Type-preserving output**: Parquet column types mapped onto JSON values
//! - **Pluggable backends**: S3/DynamoDB in production, in-memory for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parquet_json_job::job::{run_job, AwsBackends};
//!
//! #[tokio::main]
//! async fn main() -> parquet_json_job::Result<()> {
//!     let args: Vec<String> = std::env::args().skip(1).collect();
//!     let backends = AwsBackends::new(std::env::temp_dir());
//!     let outcome = run_job(&args, &backends).await?;
//!     println!("wrote {} rows to {}", outcome.rows, outcome.output_location);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          run_job                             │
//! │   resolve args → connect backends → JobRunner::run           │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────┬──────────────┴──────────────┬─────────────────┐
//! │    Config    │          Transform          │     Status      │
//! ├──────────────┼─────────────────────────────┼─────────────────┤
//! │ JobArgs      │ Parquet → RecordBatch       │ DynamoDB        │
//! │ output key   │ RecordBatch → JSON records  │ In-memory       │
//! │              │ pretty JSON array           │                 │
//! ├──────────────┴─────────────────────────────┴─────────────────┤
//! │                 Storage (object_store: S3, local, memory)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the job
pub mod error;

/// Common types and type aliases
pub mod types;

/// Job argument resolution
pub mod config;

/// Object storage access
pub mod storage;

/// Job status table
pub mod status;

/// Parquet to JSON conversion
pub mod transform;

/// Job orchestration
pub mod job;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};
pub use types::*;

// Re-export commonly used types
pub use config::JobArgs;
pub use job::{run_job, JobOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
