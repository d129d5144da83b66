//! Column batch handed from the format parsers to the table store.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use fragstore_result::{Error, Result};

use crate::column::ColumnDescription;

/// An ordered run of record batches sharing one schema.
///
/// Each column is therefore stored as a list of Arrow chunks; the table store keeps
/// those chunks as-is instead of concatenating them.
#[derive(Debug, Clone)]
pub struct ColumnBatch {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl ColumnBatch {
    /// Wrap `batches`, checking that every batch carries `schema`'s column types.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for batch in &batches {
            if batch.num_columns() != schema.fields().len() {
                return Err(Error::InvalidArgument(format!(
                    "batch has {} columns, schema has {}",
                    batch.num_columns(),
                    schema.fields().len()
                )));
            }
            for (field, column) in schema.fields().iter().zip(batch.columns()) {
                if field.data_type() != column.data_type() {
                    return Err(Error::InvalidArgument(format!(
                        "column '{}' is {:?} in one batch and {:?} in the schema",
                        field.name(),
                        column.data_type(),
                        field.data_type()
                    )));
                }
            }
        }
        Ok(Self { schema, batches })
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Non-empty Arrow chunks of column `idx`, in row order.
    pub fn column_chunks(&self, idx: usize) -> Vec<ArrayRef> {
        self.batches
            .iter()
            .filter(|batch| batch.num_rows() > 0)
            .map(|batch| Arc::clone(batch.column(idx)))
            .collect()
    }
}

impl From<RecordBatch> for ColumnBatch {
    fn from(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batches: vec![batch],
        }
    }
}

/// Arrow schema a parser should produce for `columns`.
pub fn arrow_schema_for(columns: &[ColumnDescription]) -> SchemaRef {
    Arc::new(Schema::new(
        columns
            .iter()
            .map(ColumnDescription::arrow_field)
            .collect::<Vec<_>>(),
    ))
}
