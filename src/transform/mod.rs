//! Transform module
//!
//! Turns a Parquet file into a JSON array of flat records.
//!
//! # Overview
//!
//! This module provides:
//! - Decoding Parquet into Arrow RecordBatches
//! - Converting RecordBatches to ordered JSON objects, one per row
//! - Encoding records as an indented JSON array

mod decode;
mod encode;
mod records;

#[cfg(test)]
pub(crate) use decode::read_parquet_bytes;
pub use decode::read_parquet_file;
pub use encode::encode_records;
pub use records::{batch_to_records, batches_to_records};

use crate::error::Result;
use std::path::Path;

/// Summary of a single conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    /// Encoded JSON document
    pub json: Vec<u8>,
    /// Number of records in the document
    pub rows: usize,
}

/// Decode a local Parquet file and encode it as a JSON array
pub fn convert_file(path: impl AsRef<Path>) -> Result<Converted> {
    let batches = read_parquet_file(path)?;
    let records = batches_to_records(&batches)?;
    let json = encode_records(&records)?;
    Ok(Converted {
        json,
        rows: records.len(),
    })
}
