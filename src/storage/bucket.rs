//! Bucket-scoped object storage (S3, local, in-memory)

use crate::error::{Error, Result};
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Content type attached to uploaded JSON objects
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A single bucket in an object store
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Bucket name (or directory for local stores), for messages
    bucket: String,
    /// Scheme used in logged locations (s3, file, memory)
    scheme: String,
}

impl ObjectStorage {
    /// Connect to an S3 bucket
    ///
    /// Credentials come from the environment (`AWS_ACCESS_KEY_ID`, web
    /// identity, container or instance metadata). `endpoint` overrides the
    /// regional endpoint for S3-compatible services and allows plain HTTP.
    pub fn s3(bucket: &str, region: &str, endpoint: Option<&str>) -> Result<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(region);

        if let Some(endpoint) = endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"))
                .with_virtual_hosted_style_request(false);
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create S3 client for {bucket}: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: bucket.to_string(),
            scheme: "s3".to_string(),
        })
    }

    /// Use a local directory as the bucket, creating it if needed
    pub fn local(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::config(format!("Failed to create directory {}: {e}", dir.display()))
        })?;

        let store = LocalFileSystem::new_with_prefix(dir)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: dir.display().to_string(),
            scheme: "file".to_string(),
        })
    }

    /// Create an empty in-memory bucket
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::from_store(bucket, Arc::new(InMemory::new()))
    }

    /// Wrap an existing object store
    pub fn from_store(bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            scheme: "memory".to_string(),
        }
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Scheme (s3, file, memory)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Full location of a key, for logging
    pub fn location(&self, key: &str) -> String {
        format!("{}://{}/{key}", self.scheme(), self.bucket().trim_end_matches('/'))
    }

    /// Read an object fully into memory
    pub async fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.object_path(key)?;
        let result = self.store.get(&path).await.map_err(|e| self.read_error(key, e))?;
        result.bytes().await.map_err(|e| self.read_error(key, e))
    }

    /// Copy an object to a local file, returning the number of bytes written
    pub async fn download_to(&self, key: &str, local_path: impl AsRef<Path>) -> Result<usize> {
        let local_path = local_path.as_ref();
        let data = self.get(key).await?;

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, &data).await.map_err(|e| {
            Error::transfer(format!(
                "Failed to write {} to {}: {e}",
                self.location(key),
                local_path.display()
            ))
        })?;

        debug!(
            location = %self.location(key),
            path = %local_path.display(),
            bytes = data.len(),
            "Downloaded object"
        );
        Ok(data.len())
    }

    /// Write bytes to a key
    pub async fn put(&self, key: &str, data: Bytes) -> Result<String> {
        self.put_with_attributes(key, data, Attributes::new()).await
    }

    /// Write JSON bytes to a key, tagged `application/json`
    ///
    /// The local filesystem store cannot persist attributes, so the content
    /// type is only attached for remote and in-memory stores.
    pub async fn put_json(&self, key: &str, data: Bytes) -> Result<String> {
        let mut attributes = Attributes::new();
        if self.scheme() != "file" {
            attributes.insert(Attribute::ContentType, JSON_CONTENT_TYPE.into());
        }
        self.put_with_attributes(key, data, attributes).await
    }

    async fn put_with_attributes(
        &self,
        key: &str,
        data: Bytes,
        attributes: Attributes,
    ) -> Result<String> {
        let path = self.object_path(key)?;
        let opts = PutOptions {
            attributes,
            ..PutOptions::default()
        };

        self.store
            .put_opts(&path, PutPayload::from(data), opts)
            .await
            .map_err(|e| Error::transfer(format!("Failed to write {}: {e}", self.location(key))))?;

        Ok(self.location(key))
    }

    /// Check whether an object exists
    #[cfg(test)]
    pub(crate) async fn exists(&self, key: &str) -> Result<bool> {
        match self.store.head(&self.object_path(key)?).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(self.read_error(key, e)),
        }
    }

    /// Content type recorded for an object, if the store keeps one
    #[cfg(test)]
    pub(crate) async fn content_type(&self, key: &str) -> Result<Option<String>> {
        let path = self.object_path(key)?;
        let result = self.store.get(&path).await.map_err(|e| self.read_error(key, e))?;
        Ok(result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.as_ref().to_string()))
    }

    /// Object path for a key, kept byte for byte
    ///
    /// `ObjectPath::from` would percent-encode characters such as `[` or `#`
    /// that S3 accepts in keys, addressing a different object.
    fn object_path(&self, key: &str) -> Result<ObjectPath> {
        ObjectPath::parse(key).map_err(|e| {
            Error::transfer(format!("Invalid object key {}: {e}", self.location(key)))
        })
    }

    fn read_error(&self, key: &str, err: object_store::Error) -> Error {
        match err {
            object_store::Error::NotFound { .. } => Error::not_found(self.bucket(), key),
            other => Error::transfer(format!("Failed to read {}: {other}", self.location(key))),
        }
    }
}
