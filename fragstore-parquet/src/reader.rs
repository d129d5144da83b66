use std::fs::File;
use std::path::Path;

use arrow::record_batch::RecordBatchReader;
use bytes::Bytes;
use fragstore_result::{Error, Result};
use fragstore_types::ColumnBatch;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::file::reader::ChunkReader;

/// Read every row group of the Parquet file at `path`.
pub fn parse_parquet_file(path: impl AsRef<Path>) -> Result<ColumnBatch> {
    let path = path.as_ref();
    let file = File::open(path)?;
    tracing::debug!(path = %path.display(), "parsing Parquet file");
    read_all(file)
}

/// Read Parquet bytes held in memory, optionally keeping only the leaf columns in
/// `projection`.
pub fn parse_parquet_bytes(bytes: &[u8], projection: Option<Vec<usize>>) -> Result<ColumnBatch> {
    let bytes = Bytes::copy_from_slice(bytes);
    let mut builder = ParquetRecordBatchReaderBuilder::try_new(bytes)
        .map_err(|e| Error::ParseFailure(format!("failed to open Parquet data: {e}")))?;

    if let Some(proj) = projection {
        let mask = parquet::arrow::ProjectionMask::leaves(builder.parquet_schema(), proj);
        builder = builder.with_projection(mask);
    }

    let reader = builder
        .build()
        .map_err(|e| Error::ParseFailure(format!("failed to build Parquet reader: {e}")))?;
    collect(reader)
}

fn read_all<R: ChunkReader + 'static>(input: R) -> Result<ColumnBatch> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(input)
        .map_err(|e| Error::ParseFailure(format!("failed to open Parquet data: {e}")))?;
    tracing::trace!(
        row_groups = builder.metadata().num_row_groups(),
        "reading Parquet row groups"
    );
    let reader = builder
        .build()
        .map_err(|e| Error::ParseFailure(format!("failed to build Parquet reader: {e}")))?;
    collect(reader)
}

fn collect(reader: ParquetRecordBatchReader) -> Result<ColumnBatch> {
    let schema = reader.schema();
    let mut batches = Vec::new();
    for batch in reader {
        let batch =
            batch.map_err(|e| Error::ParseFailure(format!("failed to read Parquet batch: {e}")))?;
        batches.push(batch);
    }
    ColumnBatch::try_new(schema, batches)
}
