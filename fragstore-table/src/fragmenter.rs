//! Splitting of appended rows into fragments and per-chunk metadata.

use arrow::array::{Array, ArrayRef, ArrowPrimitiveType, AsArray};
use arrow::compute::{max, min};
use arrow::datatypes::{
    DataType, Date32Type, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type,
    Time64MicrosecondType, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use fragstore_result::Result;
use fragstore_types::{ChunkLayout, FragmentId};
use rayon::prelude::*;

use crate::chunked::ChunkedColumn;
use crate::fetch::{array_elements, var_len_payload};
use crate::metadata::{ChunkMetadata, ChunkStats, FragmentInfo, StatValue};

/// Row ranges `(offset, row_count)` for `num_rows` new rows.
///
/// Yields `ceil(num_rows / fragment_size)` ranges, all full except possibly the last. A
/// partially filled fragment from an earlier append is never topped up.
pub(crate) fn fragment_ranges(
    start_row: usize,
    num_rows: usize,
    fragment_size: usize,
) -> Vec<(usize, usize)> {
    debug_assert!(fragment_size > 0);
    (0..num_rows.div_ceil(fragment_size))
        .map(|i| {
            let local = i * fragment_size;
            (start_row + local, fragment_size.min(num_rows - local))
        })
        .collect()
}

/// Build fragment descriptors for rows held in `columns`, whose first row becomes table
/// row `start_row`.
///
/// Columns are processed in parallel; each column walks the ranges in order.
pub(crate) fn build_fragments(
    columns: &[(ChunkLayout, ChunkedColumn)],
    first_fragment_id: FragmentId,
    start_row: usize,
    fragment_size: usize,
) -> Result<Vec<FragmentInfo>> {
    let num_rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
    let ranges = fragment_ranges(start_row, num_rows, fragment_size);

    let per_column: Vec<Vec<ChunkMetadata>> = columns
        .par_iter()
        .map(|(layout, column)| {
            ranges
                .iter()
                .map(|&(offset, rows)| {
                    chunk_metadata(&column.slices(offset - start_row, rows), *layout)
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let fragments = ranges
        .iter()
        .enumerate()
        .map(|(i, &(offset, row_count))| FragmentInfo {
            fragment_id: first_fragment_id + i,
            offset,
            row_count,
            chunks: per_column.iter().map(|chunks| chunks[i].clone()).collect(),
        })
        .collect::<Vec<_>>();

    for frag in &fragments {
        tracing::debug!(
            fragment_id = frag.fragment_id,
            offset = frag.offset,
            rows = frag.row_count,
            "created fragment"
        );
    }
    Ok(fragments)
}

/// Metadata of one column over one fragment's pieces.
pub(crate) fn chunk_metadata(pieces: &[ArrayRef], layout: ChunkLayout) -> Result<ChunkMetadata> {
    let mut meta = ChunkMetadata::default();
    for piece in pieces {
        meta.num_elements += piece.len();
        meta.stats.null_count += piece.null_count();
        match layout {
            ChunkLayout::Fixed { width } => {
                meta.num_bytes += piece.len() * width;
                merge_bounds(&mut meta.stats, piece.as_ref());
            }
            ChunkLayout::VarLen => {
                meta.num_bytes += var_len_payload(piece.as_ref())?.len();
            }
            ChunkLayout::VarLenArray { elem_width } => {
                let elements = array_elements(piece.as_ref())?;
                meta.num_bytes += elements.len() * elem_width;
                merge_bounds(&mut meta.stats, elements.as_ref());
            }
        }
    }
    Ok(meta)
}

fn merge_bounds(stats: &mut ChunkStats, array: &dyn Array) {
    let bounds = match array.data_type() {
        DataType::Int8 => int_bounds::<Int8Type>(array),
        DataType::Int16 => int_bounds::<Int16Type>(array),
        DataType::Int32 => int_bounds::<Int32Type>(array),
        DataType::Int64 => int_bounds::<Int64Type>(array),
        DataType::Date32 => int_bounds::<Date32Type>(array),
        DataType::Time64(TimeUnit::Microsecond) => int_bounds::<Time64MicrosecondType>(array),
        DataType::Timestamp(TimeUnit::Second, _) => int_bounds::<TimestampSecondType>(array),
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            int_bounds::<TimestampMillisecondType>(array)
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            int_bounds::<TimestampMicrosecondType>(array)
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            int_bounds::<TimestampNanosecondType>(array)
        }
        DataType::Float32 => float_bounds::<Float32Type>(array),
        DataType::Float64 => float_bounds::<Float64Type>(array),
        _ => None,
    };
    if let Some((lo, hi)) = bounds {
        stats.merge_bounds(lo, hi);
    }
}

fn int_bounds<T>(array: &dyn Array) -> Option<(StatValue, StatValue)>
where
    T: ArrowPrimitiveType,
    T::Native: Into<i64>,
{
    let values = array.as_primitive_opt::<T>()?;
    Some((
        StatValue::Int(min(values)?.into()),
        StatValue::Int(max(values)?.into()),
    ))
}

fn float_bounds<T>(array: &dyn Array) -> Option<(StatValue, StatValue)>
where
    T: ArrowPrimitiveType,
    T::Native: Into<f64>,
{
    let values = array.as_primitive_opt::<T>()?;
    Some((
        StatValue::Float(min(values)?.into()),
        StatValue::Float(max(values)?.into()),
    ))
}
