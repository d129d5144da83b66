use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow::csv::ReaderBuilder;
use fragstore_result::{Error, Result};
use fragstore_types::{ColumnBatch, ColumnDescription, ColumnType, arrow_schema_for};

use crate::options::CsvParseOptions;

/// Parse the CSV file at `path`.
///
/// With `columns`, cells are decoded into each column's Arrow input type and the schema
/// takes the given names. Without, names come from the header (or are generated) and
/// types are inferred.
pub fn parse_csv_file(
    path: impl AsRef<Path>,
    options: &CsvParseOptions,
    columns: Option<&[ColumnDescription]>,
) -> Result<ColumnBatch> {
    let path = path.as_ref();
    let file = File::open(path)?;
    tracing::debug!(path = %path.display(), "parsing CSV file");
    parse_csv(file, options, columns)
}

/// Parse CSV text held in memory.
pub fn parse_csv_data(
    data: &[u8],
    options: &CsvParseOptions,
    columns: Option<&[ColumnDescription]>,
) -> Result<ColumnBatch> {
    parse_csv(Cursor::new(data), options, columns)
}

fn parse_csv<R: Read + Seek>(
    mut input: R,
    options: &CsvParseOptions,
    columns: Option<&[ColumnDescription]>,
) -> Result<ColumnBatch> {
    let start = skip_lines(&mut input, options.skip_rows)?;
    let format = options.to_format()?;

    let schema = match columns {
        Some(columns) => {
            if let Some(column) = columns
                .iter()
                .find(|c| matches!(c.column_type, ColumnType::Array(_) | ColumnType::Binary))
            {
                return Err(Error::UnsupportedType(format!(
                    "CSV cannot carry {} column '{}'",
                    column.column_type, column.name
                )));
            }
            arrow_schema_for(columns)
        }
        None => {
            let (schema, sampled) = format
                .infer_schema(&mut input, options.max_read_records)
                .map_err(Error::parse_failure)?;
            tracing::trace!(sampled, "inferred CSV schema");
            input.seek(SeekFrom::Start(start))?;
            Arc::new(schema)
        }
    };

    let mut builder = ReaderBuilder::new(Arc::clone(&schema)).with_format(format);
    if let Some(batch_size) = options.batch_size {
        builder = builder.with_batch_size(batch_size);
    }
    let buffered = BufReader::with_capacity(options.block_size.max(1), input);
    let reader = builder
        .build_buffered(buffered)
        .map_err(Error::parse_failure)?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::parse_failure)?;
    ColumnBatch::try_new(schema, batches)
}

/// Advance past `count` lines and return the byte position of the next one.
fn skip_lines<R: Read + Seek>(input: &mut R, count: usize) -> Result<u64> {
    if count == 0 {
        return Ok(input.stream_position()?);
    }
    let mut consumed = 0u64;
    {
        let mut reader = BufReader::new(&mut *input);
        let mut line = Vec::new();
        for _ in 0..count {
            line.clear();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                break;
            }
            consumed += n as u64;
        }
    }
    input.seek(SeekFrom::Start(consumed))?;
    Ok(consumed)
}
