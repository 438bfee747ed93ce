//! Error types for the Parquet to JSON job
//!
//! This module defines the error hierarchy for the whole job.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Every variant belongs to exactly one [`ErrorKind`], which is what the
//! runner reports and what tests assert on.

use thiserror::Error;

/// The main error type for the job
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// General configuration problem
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// A required job argument was not given
    #[error("Missing required job argument: {field}")]
    MissingConfigField {
        /// Argument name, e.g. `INPUT_BUCKET`
        field: String,
    },

    /// A job argument was given without a usable value
    #[error("Invalid value for job argument '{field}': {message}")]
    InvalidConfigValue {
        /// Argument name
        field: String,
        /// Why the value was rejected
        message: String,
    },

    // ============================================================================
    // Transfer Errors
    // ============================================================================
    /// The requested object does not exist
    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound {
        /// Bucket searched
        bucket: String,
        /// Missing key
        key: String,
    },

    /// Download, upload or local file I/O failed
    #[error("Transfer failed: {message}")]
    Transfer {
        /// Underlying failure
        message: String,
    },

    // ============================================================================
    // Parse Errors
    // ============================================================================
    /// Input is not readable Parquet
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow cast or batch error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A column value has no JSON form
    #[error("Failed to convert column '{column}': {message}")]
    Conversion {
        /// Column name
        column: String,
        /// Why conversion failed
        message: String,
    },

    // ============================================================================
    // Encode Errors
    // ============================================================================
    /// JSON serialization failed
    #[error("Failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),

    // ============================================================================
    // Status Table Errors
    // ============================================================================
    /// Writing the job's status item failed
    #[error("Status update failed for job '{job_id}': {message}")]
    StatusWrite {
        /// Job whose item was written
        job_id: String,
        /// Table or SDK error text
        message: String,
    },

    /// Reading the job's status item failed
    #[error("Status lookup failed for job '{job_id}': {message}")]
    StatusRead {
        /// Job whose item was read
        job_id: String,
        /// Table or SDK error text
        message: String,
    },
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed invocation arguments
    Configuration,
    /// Object store download/upload or local scratch I/O
    Transfer,
    /// Input file could not be decoded
    Parse,
    /// Records could not be serialized
    Encode,
    /// Status table read or write
    StatusWrite,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Transfer => "transfer",
            ErrorKind::Parse => "parse",
            ErrorKind::Encode => "encode",
            ErrorKind::StatusWrite => "status-write",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing argument error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error for an object
    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create a transfer error
    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }

    /// Create a column conversion error
    pub fn conversion(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a status write error
    pub fn status_write(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StatusWrite {
            job_id: job_id.into(),
            message: message.into(),
        }
    }

    /// Create a status read error
    pub fn status_read(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StatusRead {
            job_id: job_id.into(),
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. } => ErrorKind::Configuration,
            Error::ObjectNotFound { .. } | Error::Transfer { .. } => ErrorKind::Transfer,
            Error::Parquet(_) | Error::Arrow(_) | Error::Conversion { .. } => ErrorKind::Parse,
            Error::Encode(_) => ErrorKind::Encode,
            Error::StatusWrite { .. } | Error::StatusRead { .. } => ErrorKind::StatusWrite,
        }
    }

    /// Check if this error was raised before any side effect could happen
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::transfer(format!("local I/O: {err}"))
    }
}

/// Result type alias for the job
pub type Result<T> = std::result::Result<T, Error>;
