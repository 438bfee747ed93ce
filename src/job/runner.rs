//! Job runner

use super::backends::{Backends, JobContext};
use crate::config::JobArgs;
use crate::error::{Error, Result};
use crate::status::StatusUpdate;
use crate::types::JobStatus;
use crate::transform::{batches_to_records, encode_records, read_parquet_file};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

/// Name of the downloaded input inside the scratch directory
pub const SCRATCH_FILE_NAME: &str = "input.parquet";

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    /// Job identifier
    pub job_id: String,
    /// Key of the uploaded JSON in the output bucket
    pub output_s3_key: String,
    /// Full location of the upload, e.g. `s3://bucket/job/output.json`
    pub output_location: String,
    /// Records written
    pub rows: usize,
    /// Size of the JSON document
    pub bytes: usize,
}

/// Resolve arguments, build clients and run the job
///
/// Argument and client errors return before any status write, since there
/// is no table handle yet to record them with.
pub async fn run_job<S: AsRef<str>>(raw_args: &[S], backends: &dyn Backends) -> Result<JobOutcome> {
    let args = JobArgs::resolve(raw_args)?;
    let context = backends.connect(&args).await?;
    JobRunner::new(args, context).run().await
}

/// Runs a single job against its context
#[derive(Debug)]
pub struct JobRunner {
    args: JobArgs,
    context: JobContext,
    /// Timestamp of the last status write, so `updatedAt` never goes backwards
    last_update: Option<DateTime<Utc>>,
    /// Status of the last successful write made by this run
    last_status: Option<JobStatus>,
}

impl JobRunner {
    /// Create a runner
    pub fn new(args: JobArgs, context: JobContext) -> Self {
        Self {
            args,
            context,
            last_update: None,
            last_status: None,
        }
    }

    /// Resolved arguments
    pub fn args(&self) -> &JobArgs {
        &self.args
    }

    /// Run the job
    ///
    /// On failure a FAILED status is written on a best-effort basis and the
    /// original error is returned.
    pub async fn run(mut self) -> Result<JobOutcome> {
        info!(
            job_id = %self.args.job_id,
            input_key = %self.args.input_key,
            "Processing job"
        );

        match self.execute().await {
            Ok(outcome) => {
                info!(
                    job_id = %outcome.job_id,
                    rows = outcome.rows,
                    "Job completed successfully"
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    job_id = %self.args.job_id,
                    kind = %err.kind(),
                    error = %err,
                    "Job failed"
                );
                self.mark_failed(&err).await;
                Err(err)
            }
        }
    }

    async fn execute(&mut self) -> Result<JobOutcome> {
        self.write_status(StatusUpdate::running()).await?;

        let local_path = self.context.scratch_dir.join(SCRATCH_FILE_NAME);
        let downloaded = self
            .context
            .input
            .download_to(&self.args.input_key, &local_path)
            .await?;
        info!(
            source = %self.context.input.location(&self.args.input_key),
            path = %local_path.display(),
            bytes = downloaded,
            "Downloaded input"
        );

        let batches = read_parquet_file(&local_path)?;
        let records = batches_to_records(&batches)?;
        info!(rows = records.len(), "Read records from Parquet file");

        let json = encode_records(&records)?;
        let bytes = json.len();

        let output_key = self.args.output_key();
        let output_location = self
            .context
            .output
            .put_json(&output_key, Bytes::from(json))
            .await?;
        info!(location = %output_location, bytes, "Uploaded JSON");

        self.write_status(StatusUpdate::completed(&output_key)).await?;

        Ok(JobOutcome {
            job_id: self.args.job_id.clone(),
            output_s3_key: output_key,
            output_location,
            rows: records.len(),
            bytes,
        })
    }

    async fn write_status(&mut self, mut update: StatusUpdate) -> Result<()> {
        debug_assert!(
            self.last_status
                .map_or(true, |last| last.can_transition_to(update.status)),
            "status may not move from {:?} to {}",
            self.last_status,
            update.status
        );
        if let Some(last) = self.last_update {
            update.updated_at = update.updated_at.max(last);
        }
        self.context
            .status
            .update(&self.args.job_id, &update)
            .await?;
        self.last_update = Some(update.updated_at);
        self.last_status = Some(update.status);
        Ok(())
    }

    /// Record the failure; a failing write here is logged and dropped
    async fn mark_failed(&mut self, err: &Error) {
        let update = StatusUpdate::failed(err.to_string());
        if let Err(status_err) = self.write_status(update).await {
            warn!(
                job_id = %self.args.job_id,
                error = %status_err,
                "Failed to record job failure"
            );
        }
    }
}
