//! DynamoDB-backed status table

use super::types::{JobRecord, StatusUpdate};
use super::StatusTable;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;
use tracing::debug;

/// Partition key attribute
const KEY_ATTRIBUTE: &str = "jobId";

/// Status table stored in DynamoDB
#[derive(Debug, Clone)]
pub struct DynamoStatusTable {
    client: Client,
    table: String,
}

impl DynamoStatusTable {
    /// Build a client for `table` in `region`
    ///
    /// Credentials are resolved through the default provider chain.
    /// `endpoint` points the client at DynamoDB Local or LocalStack.
    pub async fn connect(table: &str, region: &str, endpoint: Option<&str>) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(Client::from_conf(builder.build()), table)
    }

    /// Wrap an existing client
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl StatusTable for DynamoStatusTable {
    async fn update(&self, job_id: &str, update: &StatusUpdate) -> Result<()> {
        let (expression, values) = update_expression(update);
        debug!(job_id, table = %self.table(), %expression, "Updating job status");

        self.client
            .update_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, AttributeValue::S(job_id.to_string()))
            .update_expression(expression)
            .expression_attribute_names("#status", "status")
            .set_expression_attribute_values(Some(values))
            .send()
            .await
            .map_err(|e| Error::status_write(job_id, DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(KEY_ATTRIBUTE, AttributeValue::S(job_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| Error::status_read(job_id, DisplayErrorContext(&e).to_string()))?;

        output.item().map(|item| record_from_item(job_id, item)).transpose()
    }
}

/// Build the `SET` expression and its values for an update
///
/// `status` is a reserved word, so it is always addressed as `#status`.
pub(crate) fn update_expression(update: &StatusUpdate) -> (String, HashMap<String, AttributeValue>) {
    let mut clauses = vec!["#status = :status", "updatedAt = :updatedAt"];
    let mut values = HashMap::from([
        (
            ":status".to_string(),
            AttributeValue::S(update.status.to_string()),
        ),
        (
            ":updatedAt".to_string(),
            AttributeValue::S(update.updated_at_string()),
        ),
    ]);

    if let Some(key) = &update.output_key {
        clauses.push("outputS3Key = :outputKey");
        values.insert(":outputKey".to_string(), AttributeValue::S(key.clone()));
    }

    if let Some(message) = &update.error_message {
        clauses.push("errorMessage = :error");
        values.insert(":error".to_string(), AttributeValue::S(message.clone()));
    }

    (format!("SET {}", clauses.join(", ")), values)
}

/// Decode a table item into a [`JobRecord`]
pub(crate) fn record_from_item(
    job_id: &str,
    item: &HashMap<String, AttributeValue>,
) -> Result<JobRecord> {
    let string = |name: &str| item.get(name).and_then(|v| v.as_s().ok()).cloned();

    let status = string("status")
        .ok_or_else(|| Error::status_read(job_id, "item has no status attribute"))?
        .parse()
        .map_err(|e: String| Error::status_read(job_id, e))?;

    Ok(JobRecord {
        job_id: string(KEY_ATTRIBUTE).unwrap_or_else(|| job_id.to_string()),
        status,
        file_name: string("fileName"),
        input_s3_key: string("inputS3Key"),
        created_at: string("createdAt"),
        updated_at: string("updatedAt"),
        output_s3_key: string("outputS3Key"),
        error_message: string("errorMessage"),
        glue_job_run_id: string("glueJobRunId"),
    })
}
