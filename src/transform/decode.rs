//! Parquet decoding

use crate::error::Result;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::ChunkReader;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Read every RecordBatch from a Parquet file on disk, in file order
pub fn read_parquet_file(path: impl AsRef<Path>) -> Result<Vec<RecordBatch>> {
    let file = File::open(path.as_ref())?;
    read_parquet(file)
}

/// Read every RecordBatch from an in-memory Parquet file, in file order
#[cfg(test)]
pub(crate) fn read_parquet_bytes(data: bytes::Bytes) -> Result<Vec<RecordBatch>> {
    read_parquet(data)
}

fn read_parquet<R: ChunkReader + 'static>(input: R) -> Result<Vec<RecordBatch>> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(input)?;
    debug!(
        rows = builder.metadata().file_metadata().num_rows(),
        row_groups = builder.metadata().num_row_groups(),
        columns = builder.schema().fields().len(),
        "Opened Parquet file"
    );

    let reader = builder.build()?;
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}
