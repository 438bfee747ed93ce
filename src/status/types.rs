//! Status item types
//!
//! Attribute names follow the table schema shared with the upload and
//! trigger handlers (`jobId`, `status`, `updatedAt`, ...).

use crate::types::{format_timestamp, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single write to the status table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// New status
    pub status: JobStatus,
    /// Time of the write
    pub updated_at: DateTime<Utc>,
    /// Output object key, set on completion
    pub output_key: Option<String>,
    /// Error text, set on failure
    pub error_message: Option<String>,
}

impl StatusUpdate {
    /// Mark the job as running
    pub fn running() -> Self {
        Self {
            status: JobStatus::Running,
            updated_at: Utc::now(),
            output_key: None,
            error_message: None,
        }
    }

    /// Mark the job as completed with its output key
    pub fn completed(output_key: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Completed,
            updated_at: Utc::now(),
            output_key: Some(output_key.into()),
            error_message: None,
        }
    }

    /// Mark the job as failed with an error message
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            updated_at: Utc::now(),
            output_key: None,
            error_message: Some(error_message.into()),
        }
    }

    /// `updatedAt` as stored
    pub fn updated_at_string(&self) -> String {
        format_timestamp(&self.updated_at)
    }
}

/// A job item as read back from the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Partition key
    pub job_id: String,
    /// Current lifecycle status
    pub status: JobStatus,

    /// Name of the uploaded file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Key of the input object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_s3_key: Option<String>,

    /// When the item was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// When the status last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Output key, once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_s3_key: Option<String>,

    /// Error text, once failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Run id assigned by the job host when the job was started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glue_job_run_id: Option<String>,
}

impl JobRecord {
    /// An item holding only its key, as an upsert on a missing item leaves it
    pub fn bare(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            file_name: None,
            input_s3_key: None,
            created_at: None,
            updated_at: None,
            output_s3_key: None,
            error_message: None,
            glue_job_run_id: None,
        }
    }

    /// A fresh pending record, as the upload handler creates it
    pub fn pending(job_id: impl Into<String>, input_s3_key: impl Into<String>) -> Self {
        let now = format_timestamp(&Utc::now());
        Self {
            input_s3_key: Some(input_s3_key.into()),
            created_at: Some(now.clone()),
            updated_at: Some(now),
            ..Self::bare(job_id)
        }
    }

    /// Apply an update the way the table's `SET` expression would
    pub fn apply(&mut self, update: &StatusUpdate) {
        self.status = update.status;
        self.updated_at = Some(update.updated_at_string());
        if let Some(key) = &update.output_key {
            self.output_s3_key = Some(key.clone());
        }
        if let Some(message) = &update.error_message {
            self.error_message = Some(message.clone());
        }
    }
}
