//! Tests for job module

use super::*;
use crate::config::{JobArgs, REQUIRED_ARGS};
use crate::error::{Error, ErrorKind, Result};
use crate::status::{InMemoryStatusTable, JobRecord, StatusTable, StatusUpdate};
use crate::storage::{ObjectStorage, JSON_CONTENT_TYPE};
use crate::types::JobStatus;
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use test_case::test_case;

const JOB_ID: &str = "job-1";
const INPUT_KEY: &str = "job-1/data.parquet";

// ============================================================================
// Test Doubles
// ============================================================================

/// Hands out a prepared context and counts how often it was asked
struct TestBackends {
    context: JobContext,
    connects: AtomicUsize,
}

impl TestBackends {
    fn new(context: JobContext) -> Self {
        Self {
            context,
            connects: AtomicUsize::new(0),
        }
    }

    fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backends for TestBackends {
    async fn connect(&self, _args: &JobArgs) -> Result<JobContext> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.context.clone())
    }
}

/// Status table that rejects writes of the listed statuses
#[derive(Clone)]
struct FlakyTable {
    inner: InMemoryStatusTable,
    fail_on: Vec<JobStatus>,
    attempts: Arc<AtomicUsize>,
}

impl FlakyTable {
    fn new(inner: InMemoryStatusTable, fail_on: Vec<JobStatus>) -> Self {
        Self {
            inner,
            fail_on,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl StatusTable for FlakyTable {
    async fn update(&self, job_id: &str, update: &StatusUpdate) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&update.status) {
            return Err(Error::status_write(job_id, "table unavailable"));
        }
        self.inner.update(job_id, update).await
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>> {
        self.inner.get(job_id).await
    }
}

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    scratch: TempDir,
    table: InMemoryStatusTable,
    input: ObjectStorage,
    output: ObjectStorage,
}

impl Fixture {
    async fn new() -> Self {
        let table = InMemoryStatusTable::new();
        table.insert(JobRecord::pending(JOB_ID, INPUT_KEY)).await;
        Self {
            scratch: tempfile::tempdir().unwrap(),
            table,
            input: ObjectStorage::in_memory("input-bucket"),
            output: ObjectStorage::in_memory("output-bucket"),
        }
    }

    fn context(&self, status: Arc<dyn StatusTable>) -> JobContext {
        JobContext {
            status,
            input: self.input.clone(),
            output: self.output.clone(),
            scratch_dir: self.scratch.path().to_path_buf(),
        }
    }

    fn backends(&self) -> TestBackends {
        TestBackends::new(self.context(Arc::new(self.table.clone())))
    }

    async fn seed_input(&self, data: Bytes) {
        self.input.put(INPUT_KEY, data).await.unwrap();
    }

    async fn statuses(&self) -> Vec<JobStatus> {
        self.table
            .history(JOB_ID)
            .await
            .iter()
            .map(|u| u.status)
            .collect()
    }

    async fn record(&self) -> JobRecord {
        self.table.get(JOB_ID).await.unwrap().unwrap()
    }
}

fn job_args() -> Vec<String> {
    [
        "--INPUT_BUCKET",
        "input-bucket",
        "--OUTPUT_BUCKET",
        "output-bucket",
        "--JOBS_TABLE",
        "jobs",
        "--REGION",
        "us-east-1",
        "--INPUT_S3_KEY",
        INPUT_KEY,
        "--JOB_ID_ARG",
        JOB_ID,
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn sample_parquet() -> Bytes {
    let batch = RecordBatch::try_from_iter(vec![
        ("id", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
        ("name", Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef),
    ])
    .unwrap();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    Bytes::from(buf)
}

// ============================================================================
// Success Path
// ============================================================================

#[tokio::test]
async fn test_run_completes() {
    let fx = Fixture::new().await;
    fx.seed_input(sample_parquet()).await;
    let backends = fx.backends();

    let outcome = run_job(&job_args(), &backends).await.unwrap();

    assert_eq!(outcome.job_id, JOB_ID);
    assert_eq!(outcome.output_s3_key, "job-1/output.json");
    assert_eq!(outcome.rows, 2);
    assert_eq!(backends.connects(), 1);
    assert_eq!(
        fx.statuses().await,
        vec![JobStatus::Running, JobStatus::Completed]
    );

    let record = fx.record().await;
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.output_s3_key.as_deref(), Some("job-1/output.json"));
    assert!(record.error_message.is_none());

    let body = fx.output.get("job-1/output.json").await.unwrap();
    assert_eq!(outcome.bytes, body.len());
    let decoded: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(decoded, json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]));
    assert_eq!(
        fx.output.content_type("job-1/output.json").await.unwrap(),
        Some(JSON_CONTENT_TYPE.to_string())
    );
}

#[tokio::test]
async fn test_updated_at_never_decreases() {
    let fx = Fixture::new().await;
    fx.seed_input(sample_parquet()).await;

    run_job(&job_args(), &fx.backends()).await.unwrap();

    let history = fx.table.history(JOB_ID).await;
    assert_eq!(history.len(), 2);
    assert!(history
        .windows(2)
        .all(|pair| pair[0].updated_at <= pair[1].updated_at));
}

#[tokio::test]
async fn test_written_statuses_follow_lifecycle() {
    let fx = Fixture::new().await;
    fx.seed_input(Bytes::from_static(b"not parquet")).await;

    run_job(&job_args(), &fx.backends()).await.unwrap_err();

    let statuses = fx.statuses().await;
    assert!(JobStatus::Pending.can_transition_to(statuses[0]));
    assert!(statuses
        .windows(2)
        .all(|pair| pair[0].can_transition_to(pair[1])));
    assert!(statuses.last().unwrap().is_terminal());
}

#[tokio::test]
async fn test_scratch_file_left_in_place() {
    let fx = Fixture::new().await;
    fx.seed_input(sample_parquet()).await;

    run_job(&job_args(), &fx.backends()).await.unwrap();

    assert!(fx.scratch.path().join(SCRATCH_FILE_NAME).exists());
}

#[tokio::test]
async fn test_running_overwrites_any_prior_status() {
    let fx = Fixture::new().await;
    let mut stale = JobRecord::pending(JOB_ID, INPUT_KEY);
    stale.status = JobStatus::Failed;
    fx.table.insert(stale).await;
    fx.seed_input(sample_parquet()).await;

    run_job(&job_args(), &fx.backends()).await.unwrap();

    assert_eq!(fx.record().await.status, JobStatus::Completed);
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[test_case(0 ; "input bucket")]
#[test_case(1 ; "output bucket")]
#[test_case(2 ; "jobs table")]
#[test_case(3 ; "region")]
#[test_case(4 ; "input key")]
#[test_case(5 ; "job id")]
#[tokio::test]
async fn test_missing_argument_has_no_side_effects(index: usize) {
    let fx = Fixture::new().await;
    fx.seed_input(sample_parquet()).await;
    let backends = fx.backends();

    let mut args = job_args();
    // drop the flag and its value
    args.remove(index * 2);
    args.remove(index * 2);

    let err = run_job(&args, &backends).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == REQUIRED_ARGS[index]));
    assert_eq!(backends.connects(), 0);
    assert_eq!(fx.table.write_count().await, 0);
    assert_eq!(fx.record().await.status, JobStatus::Pending);
}

// ============================================================================
// Failure Path
// ============================================================================

#[tokio::test]
async fn test_missing_input_marks_failed() {
    let fx = Fixture::new().await;

    let err = run_job(&job_args(), &fx.backends()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transfer);
    assert_eq!(fx.statuses().await, vec![JobStatus::Running, JobStatus::Failed]);

    let record = fx.record().await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.error_message, Some(err.to_string()));
    assert!(record.output_s3_key.is_none());
    assert!(!fx.output.exists("job-1/output.json").await.unwrap());
}

#[tokio::test]
async fn test_malformed_input_marks_failed() {
    let fx = Fixture::new().await;
    fx.seed_input(Bytes::from_static(b"this is not parquet at all"))
        .await;

    let err = run_job(&job_args(), &fx.backends()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(fx.statuses().await, vec![JobStatus::Running, JobStatus::Failed]);
    assert_eq!(fx.record().await.error_message, Some(err.to_string()));
    assert!(!fx.output.exists("job-1/output.json").await.unwrap());
}

#[tokio::test]
async fn test_upload_failure_marks_failed() {
    let fx = Fixture::new().await;
    fx.seed_input(sample_parquet()).await;

    // A plain file where the job's output prefix should be blocks the upload
    let out_dir = tempfile::tempdir().unwrap();
    std::fs::write(out_dir.path().join(JOB_ID), b"not a directory").unwrap();
    let mut context = fx.context(Arc::new(fx.table.clone()));
    context.output = ObjectStorage::local(out_dir.path()).unwrap();
    let backends = TestBackends::new(context);

    let err = run_job(&job_args(), &backends).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transfer);
    assert!(err.to_string().contains("job-1/output.json"));
    assert_eq!(fx.statuses().await, vec![JobStatus::Running, JobStatus::Failed]);

    let record = fx.record().await;
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(record.error_message, Some(err.to_string()));
    assert!(record.output_s3_key.is_none());
}

#[tokio::test]
async fn test_failed_write_outage_keeps_original_error() {
    let fx = Fixture::new().await;
    let table = FlakyTable::new(fx.table.clone(), vec![JobStatus::Failed]);
    let attempts = Arc::clone(&table.attempts);
    let backends = TestBackends::new(fx.context(Arc::new(table)));

    let err = run_job(&job_args(), &backends).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transfer);
    assert!(matches!(err, Error::ObjectNotFound { .. }));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(fx.statuses().await, vec![JobStatus::Running]);
}

#[tokio::test]
async fn test_running_write_failure_stops_before_download() {
    let fx = Fixture::new().await;
    fx.seed_input(sample_parquet()).await;
    let table = FlakyTable::new(fx.table.clone(), vec![JobStatus::Running]);
    let backends = TestBackends::new(fx.context(Arc::new(table)));

    let err = run_job(&job_args(), &backends).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StatusWrite);
    assert!(!fx.scratch.path().join(SCRATCH_FILE_NAME).exists());
    assert_eq!(fx.statuses().await, vec![JobStatus::Failed]);
    assert_eq!(fx.record().await.error_message, Some(err.to_string()));
}

#[tokio::test]
async fn test_completed_write_failure_leaves_output_behind() {
    let fx = Fixture::new().await;
    fx.seed_input(sample_parquet()).await;
    let table = FlakyTable::new(fx.table.clone(), vec![JobStatus::Completed]);
    let backends = TestBackends::new(fx.context(Arc::new(table)));

    let err = run_job(&job_args(), &backends).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StatusWrite);
    assert_eq!(fx.statuses().await, vec![JobStatus::Running, JobStatus::Failed]);
    // The upload is not rolled back
    assert!(fx.output.exists("job-1/output.json").await.unwrap());
}

#[tokio::test]
async fn test_runner_direct() {
    let fx = Fixture::new().await;
    fx.seed_input(sample_parquet()).await;
    let args = JobArgs::resolve(&job_args()).unwrap();

    let runner = JobRunner::new(args, fx.context(Arc::new(fx.table.clone())));
    assert_eq!(runner.args().job_id, JOB_ID);

    let outcome = runner.run().await.unwrap();
    assert_eq!(outcome.output_location, "memory://output-bucket/job-1/output.json");
}
