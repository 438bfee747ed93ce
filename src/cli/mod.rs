//! CLI module
//!
//! Command-line interface for running the conversion job.
//!
//! # Commands
//!
//! - `run` - Convert one input object and track it in the status table
//! - `status` - Show a job's status item
//! - `convert` - Convert a local Parquet file to JSON

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
