//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parquet to JSON batch job
#[derive(Parser, Debug)]
#[command(name = "parquet-json-job")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert one input object and record the job's status
    ///
    /// Job arguments follow `--` in the host's `--NAME value` form:
    /// INPUT_BUCKET, OUTPUT_BUCKET, JOBS_TABLE, REGION, INPUT_S3_KEY,
    /// JOB_ID_ARG. Other options in that list are ignored.
    Run {
        /// Directory the input file is downloaded into
        #[arg(long, env = "SCRATCH_DIR", default_value_os_t = std::env::temp_dir())]
        scratch_dir: PathBuf,

        /// Custom endpoint for S3 and DynamoDB (e.g. LocalStack)
        #[arg(long, env = "AWS_ENDPOINT_URL")]
        endpoint_url: Option<String>,

        /// Job arguments
        #[arg(last = true, allow_hyphen_values = true)]
        job_args: Vec<String>,
    },

    /// Show the status item for a job
    Status {
        /// Status table name
        #[arg(long)]
        table: String,

        /// AWS region
        #[arg(long)]
        region: String,

        /// Job identifier
        #[arg(long)]
        job_id: String,

        /// Custom DynamoDB endpoint
        #[arg(long, env = "AWS_ENDPOINT_URL")]
        endpoint_url: Option<String>,
    },

    /// Convert a local Parquet file to JSON
    Convert {
        /// Input Parquet file
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },
}
