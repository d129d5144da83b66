//! Translation of ingested Arrow arrays into their stored physical form.
//!
//! | logical type | stored as |
//! |---|---|
//! | BOOLEAN | `Int8` (0/1) |
//! | DECIMAL(p,s) | `Int64` unscaled |
//! | TIME | `Time64(µs)` |
//! | dictionary TEXT | `Int32` codes |
//! | everything else | its Arrow input type |
//!
//! Fixed-width null slots are overwritten with the type's sentinel from
//! [`fragstore_types::null`]; the validity bitmap is carried over unchanged. Null rows of
//! variable-length and array columns are rewritten to zero length.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, ArrowPrimitiveType, AsArray, BinaryArray, GenericListArray, Int8Array,
    Int32Array, Int64Array, LargeBinaryArray, LargeStringArray, OffsetSizeTrait, PrimitiveArray,
    StringArray,
};
use arrow::buffer::OffsetBuffer;
use arrow::compute::{cast, concat};
use arrow::datatypes::{
    DataType, Date32Type, Decimal128Type, Field, Float32Type, Float64Type,
    Int8Type, Int16Type, Int32Type, Int64Type, Time64MicrosecondType, TimeUnit as ArrowTimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType,
};
use fragstore_dict::StringDictionary;
use fragstore_result::{Error, Result};
use fragstore_types::null::{
    NULL_BIGINT, NULL_BOOLEAN, NULL_DICT_CODE, NULL_DOUBLE, NULL_FLOAT, NULL_INT, NULL_SMALLINT,
    NULL_TINYINT,
};
use fragstore_types::{ColumnDescription, ColumnType, TimeUnit};

/// Convert one ingested chunk of `column` into its stored form.
///
/// Dictionary-encoded columns intern every non-null string into `dictionary`.
pub(crate) fn to_storage(
    array: &ArrayRef,
    column: &ColumnDescription,
    dictionary: Option<&StringDictionary>,
) -> Result<ArrayRef> {
    if column.is_dictionary_encoded() {
        let dictionary = dictionary.ok_or_else(|| {
            Error::Internal(format!("column '{}' has no bound dictionary", column.name))
        })?;
        return encode_text(array, dictionary);
    }
    match &column.column_type {
        ColumnType::Text | ColumnType::Binary => compact_var_len(array),
        ColumnType::Array(elem) => match array.data_type() {
            DataType::List(_) => convert_list(downcast(array.as_list_opt::<i32>(), array)?, elem),
            DataType::LargeList(_) => {
                convert_list(downcast(array.as_list_opt::<i64>(), array)?, elem)
            }
            other => Err(mismatch(other, &column.column_type)),
        },
        ty => convert_fixed(array, ty),
    }
}

fn encode_text(array: &ArrayRef, dictionary: &StringDictionary) -> Result<ArrayRef> {
    let array = match array.data_type() {
        DataType::Dictionary(_, _) => cast(array, &DataType::Utf8)?,
        _ => Arc::clone(array),
    };
    let codes = match array.data_type() {
        DataType::Utf8 => dictionary.get_or_create_bulk(array.as_string::<i32>(), NULL_DICT_CODE)?,
        DataType::LargeUtf8 => {
            dictionary.get_or_create_bulk(array.as_string::<i64>(), NULL_DICT_CODE)?
        }
        other => {
            return Err(Error::UnsupportedType(format!(
                "cannot dictionary-encode {other:?}"
            )));
        }
    };
    Ok(Arc::new(Int32Array::new(codes.into(), array.nulls().cloned())))
}

fn compact_var_len(array: &ArrayRef) -> Result<ArrayRef> {
    if array.null_count() == 0 {
        return Ok(Arc::clone(array));
    }
    let compacted: ArrayRef = match array.data_type() {
        DataType::Utf8 => Arc::new(array.as_string::<i32>().iter().collect::<StringArray>()),
        DataType::LargeUtf8 => {
            Arc::new(array.as_string::<i64>().iter().collect::<LargeStringArray>())
        }
        DataType::Binary => Arc::new(array.as_binary::<i32>().iter().collect::<BinaryArray>()),
        DataType::LargeBinary => {
            Arc::new(array.as_binary::<i64>().iter().collect::<LargeBinaryArray>())
        }
        other => {
            return Err(Error::UnsupportedType(format!(
                "{other:?} is not a variable-length type"
            )));
        }
    };
    Ok(compacted)
}

fn convert_fixed(array: &ArrayRef, ty: &ColumnType) -> Result<ArrayRef> {
    match ty {
        ColumnType::Bool => {
            let bools = downcast(array.as_boolean_opt(), array)?;
            let values: Vec<i8> = (0..bools.len())
                .map(|i| {
                    if bools.is_null(i) {
                        NULL_BOOLEAN
                    } else {
                        bools.value(i) as i8
                    }
                })
                .collect();
            Ok(Arc::new(Int8Array::new(values.into(), bools.nulls().cloned())))
        }
        ColumnType::TinyInt => with_sentinel::<Int8Type>(array, NULL_TINYINT),
        ColumnType::SmallInt => with_sentinel::<Int16Type>(array, NULL_SMALLINT),
        ColumnType::Int => with_sentinel::<Int32Type>(array, NULL_INT),
        ColumnType::BigInt => with_sentinel::<Int64Type>(array, NULL_BIGINT),
        ColumnType::Float => with_sentinel::<Float32Type>(array, NULL_FLOAT),
        ColumnType::Double => with_sentinel::<Float64Type>(array, NULL_DOUBLE),
        ColumnType::Date => with_sentinel::<Date32Type>(array, NULL_INT),
        ColumnType::Time => {
            let micros = match array.data_type() {
                DataType::Time64(ArrowTimeUnit::Microsecond) => Arc::clone(array),
                _ => cast(array, &DataType::Time64(ArrowTimeUnit::Microsecond))?,
            };
            with_sentinel::<Time64MicrosecondType>(&micros, NULL_BIGINT)
        }
        ColumnType::Timestamp(unit) => match unit {
            TimeUnit::Second => with_sentinel::<TimestampSecondType>(array, NULL_BIGINT),
            TimeUnit::Millisecond => with_sentinel::<TimestampMillisecondType>(array, NULL_BIGINT),
            TimeUnit::Microsecond => with_sentinel::<TimestampMicrosecondType>(array, NULL_BIGINT),
            TimeUnit::Nanosecond => with_sentinel::<TimestampNanosecondType>(array, NULL_BIGINT),
        },
        ColumnType::Decimal { .. } => {
            let decimals = downcast(array.as_primitive_opt::<Decimal128Type>(), array)?;
            let mut values = Vec::with_capacity(decimals.len());
            for value in decimals.iter() {
                values.push(match value {
                    Some(v) => i64::try_from(v).map_err(|_| {
                        Error::InvalidArgument(format!("decimal value {v} does not fit 64 bits"))
                    })?,
                    None => NULL_BIGINT,
                });
            }
            Ok(Arc::new(Int64Array::new(values.into(), decimals.nulls().cloned())))
        }
        ColumnType::Text | ColumnType::Binary | ColumnType::Array(_) => Err(Error::Internal(
            format!("{ty} is not a fixed-width type"),
        )),
    }
}

fn with_sentinel<T: ArrowPrimitiveType>(array: &ArrayRef, sentinel: T::Native) -> Result<ArrayRef> {
    let values = downcast(array.as_primitive_opt::<T>(), array)?;
    if values.null_count() == 0 {
        return Ok(Arc::clone(array));
    }
    let filled: Vec<T::Native> = values.iter().map(|v| v.unwrap_or(sentinel)).collect();
    let filled = PrimitiveArray::<T>::new(filled.into(), values.nulls().cloned())
        .with_data_type(values.data_type().clone());
    Ok(Arc::new(filled))
}

/// Rebase a list so element offsets start at zero, null rows are empty and elements are
/// in stored form.
fn convert_list<O: OffsetSizeTrait>(list: &GenericListArray<O>, elem: &ColumnType) -> Result<ArrayRef> {
    let offsets = list.value_offsets();
    let sparse_nulls = list.null_count() > 0
        && (0..list.len()).any(|i| list.is_null(i) && offsets[i] != offsets[i + 1]);

    let (rebased, values) = if sparse_nulls {
        let mut rebased = Vec::with_capacity(list.len() + 1);
        rebased.push(O::usize_as(0));
        let mut pieces: Vec<ArrayRef> = Vec::new();
        let mut total = 0usize;
        for i in 0..list.len() {
            if list.is_valid(i) {
                let start = offsets[i].as_usize();
                let len = offsets[i + 1].as_usize() - start;
                pieces.push(list.values().slice(start, len));
                total += len;
            }
            rebased.push(O::usize_as(total));
        }
        let values = if pieces.is_empty() {
            list.values().slice(0, 0)
        } else {
            let refs: Vec<&dyn Array> = pieces.iter().map(|a| a.as_ref()).collect();
            concat(&refs)?
        };
        (rebased, values)
    } else {
        let first = offsets[0].as_usize();
        let last = offsets[list.len()].as_usize();
        let rebased = offsets
            .iter()
            .map(|o| O::usize_as(o.as_usize() - first))
            .collect::<Vec<_>>();
        (rebased, list.values().slice(first, last - first))
    };

    let values = convert_fixed(&values, elem)?;
    let field = Arc::new(Field::new("item", values.data_type().clone(), true));
    let rebuilt = GenericListArray::<O>::try_new(
        field,
        OffsetBuffer::new(rebased.into()),
        values,
        list.nulls().cloned(),
    )?;
    Ok(Arc::new(rebuilt))
}

fn downcast<'a, T>(typed: Option<&'a T>, array: &ArrayRef) -> Result<&'a T> {
    typed.ok_or_else(|| {
        Error::Internal(format!(
            "unexpected Arrow type {:?} during conversion",
            array.data_type()
        ))
    })
}

fn mismatch(found: &DataType, expected: &ColumnType) -> Error {
    Error::Internal(format!("cannot store {found:?} as {expected}"))
}
