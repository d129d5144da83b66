//! Column validation at creation and schema reconciliation on append.

use arrow::datatypes::{DataType, Schema};
use fragstore_result::{Error, Result};
use fragstore_types::{ColumnDescription, ColumnEncoding, ColumnType};
use rustc_hash::FxHashSet;

/// Check a column list handed to `create_table`.
pub(crate) fn validate_columns(columns: &[ColumnDescription]) -> Result<()> {
    if columns.is_empty() {
        return Err(Error::InvalidSchema("table needs at least one column".into()));
    }
    let mut seen = FxHashSet::default();
    for column in columns {
        column.validate()?;
        if !seen.insert(column.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate column name '{}'",
                column.name
            )));
        }
    }
    Ok(())
}

/// Column definitions for a parsed batch when the caller supplied none.
///
/// Strings come back dictionary-encoded.
pub(crate) fn infer_columns(schema: &Schema) -> Result<Vec<ColumnDescription>> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let (column_type, encoding) = ColumnType::from_arrow(field.data_type())?;
            Ok(ColumnDescription {
                name: field.name().clone(),
                column_type,
                encoding,
            })
        })
        .collect()
}

/// Reconcile an incoming batch schema against a table's columns.
///
/// Names and logical types must match position by position. Plain `Utf8` input is
/// accepted for both text encodings; Arrow dictionary input only for dictionary-encoded
/// columns.
pub(crate) fn compare_schemas(columns: &[ColumnDescription], incoming: &Schema) -> Result<()> {
    let fields = incoming.fields();
    if fields.len() != columns.len() {
        return Err(Error::SchemaMismatch(format!(
            "table has {} columns, batch has {}",
            columns.len(),
            fields.len()
        )));
    }
    for (column, field) in columns.iter().zip(fields.iter()) {
        if field.name() != &column.name {
            return Err(Error::SchemaMismatch(format!(
                "column '{}': batch names it '{}'",
                column.name,
                field.name()
            )));
        }
        let incoming_type = ColumnType::from_arrow(field.data_type()).map(|(ty, _)| ty);
        match incoming_type {
            Ok(ty) if ty == column.column_type => {}
            Ok(ty) => {
                return Err(Error::SchemaMismatch(format!(
                    "column '{}': expected {}, batch has {}",
                    column.name, column.column_type, ty
                )));
            }
            Err(_) => {
                return Err(Error::SchemaMismatch(format!(
                    "column '{}': expected {}, batch has unsupported {:?}",
                    column.name,
                    column.column_type,
                    field.data_type()
                )));
            }
        }
        if matches!(field.data_type(), DataType::Dictionary(_, _))
            && column.encoding == ColumnEncoding::None
        {
            return Err(Error::SchemaMismatch(format!(
                "column '{}': dictionary input for an unencoded TEXT column",
                column.name
            )));
        }
    }
    Ok(())
}
