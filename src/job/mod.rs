//! Job module
//!
//! Runs one conversion end to end and keeps the status table in step.
//!
//! # Overview
//!
//! The job module provides:
//! - `run_job` - resolve arguments, connect, run
//! - `JobRunner` - the status-bracketed download/convert/upload sequence
//! - `Backends` - builds the clients a run needs, once per run

mod backends;
mod runner;

pub use backends::{AwsBackends, Backends, JobContext};
pub use runner::{run_job, JobOutcome, JobRunner, SCRATCH_FILE_NAME};

#[cfg(test)]
mod tests;
