//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::error::{Error, Result};
use crate::job::{run_job, AwsBackends};
use crate::status::{DynamoStatusTable, StatusTable};
use crate::transform::convert_file;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run {
                scratch_dir,
                endpoint_url,
                job_args,
            } => {
                self.execute_job(scratch_dir, endpoint_url.clone(), job_args)
                    .await
            }
            Commands::Status {
                table,
                region,
                job_id,
                endpoint_url,
            } => {
                self.status(table, region, job_id, endpoint_url.as_deref())
                    .await
            }
            Commands::Convert { input, output } => self.convert(input, output),
        }
    }

    /// Run one job against AWS
    async fn execute_job(
        &self,
        scratch_dir: &Path,
        endpoint_url: Option<String>,
        job_args: &[String],
    ) -> Result<()> {
        let started = Instant::now();
        let backends = AwsBackends::new(scratch_dir).with_endpoint(endpoint_url);

        let outcome = run_job(job_args, &backends).await?;

        self.output_message(&json!({
            "type": "RESULT",
            "result": outcome,
            "durationMs": started.elapsed().as_millis() as u64
        }));
        Ok(())
    }

    /// Print the status item for a job
    async fn status(
        &self,
        table: &str,
        region: &str,
        job_id: &str,
        endpoint_url: Option<&str>,
    ) -> Result<()> {
        let table = DynamoStatusTable::connect(table, region, endpoint_url).await;
        let record = table
            .get(job_id)
            .await?
            .ok_or_else(|| Error::status_read(job_id, "no item with this jobId"))?;

        self.output_message(&json!({
            "type": "STATUS",
            "terminal": record.status.is_terminal(),
            "status": record
        }));
        Ok(())
    }

    /// Convert a local file without touching AWS
    fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let converted = convert_file(input)?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(output, &converted.json)?;

        info!(
            input = %input.display(),
            output = %output.display(),
            rows = converted.rows,
            "Converted file"
        );
        self.output_message(&json!({
            "type": "RESULT",
            "result": {
                "output": output.display().to_string(),
                "rows": converted.rows,
                "bytes": converted.json.len()
            }
        }));
        Ok(())
    }

    /// Output a message to stdout
    fn output_message(&self, msg: &Value) {
        if self.cli.verbose {
            println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
        } else {
            println!("{}", serde_json::to_string(msg).unwrap_or_default());
        }
    }
}
