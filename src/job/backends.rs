//! Client construction for a run

use crate::config::JobArgs;
use crate::error::Result;
use crate::status::{DynamoStatusTable, StatusTable};
use crate::storage::ObjectStorage;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a run talks to
#[derive(Clone)]
pub struct JobContext {
    /// Status table handle
    pub status: Arc<dyn StatusTable>,
    /// Bucket holding the input file
    pub input: ObjectStorage,
    /// Bucket receiving the output file
    pub output: ObjectStorage,
    /// Directory the input is downloaded into
    pub scratch_dir: PathBuf,
}

impl std::fmt::Debug for JobContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobContext")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("scratch_dir", &self.scratch_dir)
            .finish_non_exhaustive()
    }
}

/// Builds the clients for a run from its resolved arguments
#[async_trait]
pub trait Backends: Send + Sync {
    /// Create the status table and object storage handles
    async fn connect(&self, args: &JobArgs) -> Result<JobContext>;
}

/// AWS backends: DynamoDB for status, S3 for objects
#[derive(Debug, Clone)]
pub struct AwsBackends {
    scratch_dir: PathBuf,
    endpoint_url: Option<String>,
}

impl AwsBackends {
    /// Create backends that download into `scratch_dir`
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            endpoint_url: None,
        }
    }

    /// Send every request to a custom endpoint (LocalStack and similar)
    #[must_use]
    pub fn with_endpoint(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }
}

#[async_trait]
impl Backends for AwsBackends {
    async fn connect(&self, args: &JobArgs) -> Result<JobContext> {
        let endpoint = self.endpoint_url.as_deref();

        let status = DynamoStatusTable::connect(&args.jobs_table, &args.region, endpoint).await;
        let input = ObjectStorage::s3(&args.input_bucket, &args.region, endpoint)?;
        let output = ObjectStorage::s3(&args.output_bucket, &args.region, endpoint)?;

        Ok(JobContext {
            status: Arc::new(status),
            input,
            output,
            scratch_dir: self.scratch_dir.clone(),
        })
    }
}
