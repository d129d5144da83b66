use std::io::{BufReader, Cursor};
use std::sync::Arc;

use arrow::json::ReaderBuilder;
use arrow::datatypes::{Field, Schema};
use arrow::json::reader::infer_json_schema;
use fragstore_result::{Error, Result};
use fragstore_types::{ColumnBatch, ColumnDescription, ColumnType, arrow_schema_for};
use serde_json::Value;

use crate::options::JsonParseOptions;

/// Parse line-delimited JSON held in memory.
///
/// Without `columns` the schema is inferred from every line; integers widen to 64 bits
/// and strings stay `Utf8`. Inferred columns follow the order keys are first seen.
pub fn parse_json_data(
    data: &[u8],
    options: &JsonParseOptions,
    columns: Option<&[ColumnDescription]>,
) -> Result<ColumnBatch> {
    let body = skip_lines(data, options.skip_rows);

    let schema = match columns {
        Some(columns) => {
            if let Some(column) = columns
                .iter()
                .find(|c| matches!(c.column_type, ColumnType::Binary))
            {
                return Err(Error::UnsupportedType(format!(
                    "JSON cannot carry binary column '{}'",
                    column.name
                )));
            }
            arrow_schema_for(columns)
        }
        None => {
            let (schema, lines) =
                infer_json_schema(Cursor::new(body), None).map_err(Error::parse_failure)?;
            tracing::trace!(lines, "inferred JSON schema");
            Arc::new(in_key_order(schema, &first_seen_keys(body)?))
        }
    };

    let mut builder = ReaderBuilder::new(Arc::clone(&schema));
    if let Some(batch_size) = options.batch_size {
        builder = builder.with_batch_size(batch_size);
    }
    let buffered = BufReader::with_capacity(options.block_size.max(1), Cursor::new(body));
    let reader = builder.build(buffered).map_err(Error::parse_failure)?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::parse_failure)?;
    tracing::debug!(rows = batches.iter().map(|b| b.num_rows()).sum::<usize>(), "parsed JSON");
    ColumnBatch::try_new(schema, batches)
}

/// Top-level object keys in the order they first appear.
fn first_seen_keys(body: &[u8]) -> Result<Vec<String>> {
    let mut keys: Vec<String> = Vec::new();
    for value in serde_json::Deserializer::from_slice(body).into_iter::<Value>() {
        let Value::Object(object) = value.map_err(Error::parse_failure)? else {
            continue;
        };
        for key in object.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }
    Ok(keys)
}

/// Reorder `schema` to follow `keys`. Fields without a key keep their relative order
/// at the end.
fn in_key_order(schema: Schema, keys: &[String]) -> Schema {
    let mut fields: Vec<Field> = keys
        .iter()
        .filter_map(|key| schema.field_with_name(key).ok().cloned())
        .collect();
    for field in schema.fields() {
        if !keys.iter().any(|key| key == field.name()) {
            fields.push(field.as_ref().clone());
        }
    }
    Schema::new(fields)
}

fn skip_lines(data: &[u8], count: usize) -> &[u8] {
    let mut rest = data;
    for _ in 0..count {
        match rest.iter().position(|&b| b == b'\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return &[],
        }
    }
    rest
}
