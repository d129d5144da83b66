//! Reconstruction of flat physical buffers from stored Arrow chunks.
//!
//! A fragment resolves to one or more chunk slices ("pieces"). Every function here works
//! on those pieces and is relative to the fragment: offsets start at zero no matter
//! where the fragment sits in the column.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::buffer::Buffer;
use arrow::datatypes::DataType;
use fragstore_result::{Error, Result};
use fragstore_types::{ChunkLayout, SubBuffer};

/// Shared-ownership view of stored bytes.
///
/// The token holds its own reference to the chunk, so the bytes stay valid after the
/// table is dropped.
#[derive(Debug, Clone)]
pub struct ZeroCopyToken {
    chunk: ArrayRef,
    bytes: Buffer,
}

impl ZeroCopyToken {
    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    pub fn memory_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// The stored chunk the bytes belong to.
    pub fn chunk(&self) -> &ArrayRef {
        &self.chunk
    }
}

/// Row offsets of a variable-length piece in their native width.
#[derive(Clone, Copy)]
enum RowOffsets<'a> {
    Small(&'a [i32]),
    Large(&'a [i64]),
}

impl RowOffsets<'_> {
    fn count(&self) -> usize {
        match self {
            RowOffsets::Small(o) => o.len(),
            RowOffsets::Large(o) => o.len(),
        }
    }

    fn get(&self, idx: usize) -> usize {
        match self {
            RowOffsets::Small(o) => o[idx] as usize,
            RowOffsets::Large(o) => o[idx] as usize,
        }
    }

    fn first(&self) -> usize {
        self.get(0)
    }

    fn last(&self) -> usize {
        self.get(self.count() - 1)
    }
}

fn byte_offsets(piece: &dyn Array) -> Result<(RowOffsets<'_>, &Buffer)> {
    match piece.data_type() {
        DataType::Utf8 => {
            let a = piece.as_string::<i32>();
            Ok((RowOffsets::Small(a.value_offsets()), a.values()))
        }
        DataType::LargeUtf8 => {
            let a = piece.as_string::<i64>();
            Ok((RowOffsets::Large(a.value_offsets()), a.values()))
        }
        DataType::Binary => {
            let a = piece.as_binary::<i32>();
            Ok((RowOffsets::Small(a.value_offsets()), a.values()))
        }
        DataType::LargeBinary => {
            let a = piece.as_binary::<i64>();
            Ok((RowOffsets::Large(a.value_offsets()), a.values()))
        }
        other => Err(Error::Internal(format!(
            "{other:?} is not a variable-length layout"
        ))),
    }
}

fn item_offsets(piece: &dyn Array) -> Result<(RowOffsets<'_>, &ArrayRef)> {
    match piece.data_type() {
        DataType::List(_) => {
            let a = piece.as_list::<i32>();
            Ok((RowOffsets::Small(a.value_offsets()), a.values()))
        }
        DataType::LargeList(_) => {
            let a = piece.as_list::<i64>();
            Ok((RowOffsets::Large(a.value_offsets()), a.values()))
        }
        other => Err(Error::Internal(format!("{other:?} is not an array layout"))),
    }
}

fn byte_row_offsets(piece: &dyn Array) -> Result<RowOffsets<'_>> {
    Ok(byte_offsets(piece)?.0)
}

fn item_row_offsets(piece: &dyn Array) -> Result<RowOffsets<'_>> {
    Ok(item_offsets(piece)?.0)
}

/// Value bytes of a fixed-width array, honouring its slice offset.
pub(crate) fn fixed_bytes(array: &dyn Array, width: usize) -> Result<Buffer> {
    let data = array.to_data();
    let buffer = data
        .buffers()
        .first()
        .ok_or_else(|| Error::Internal(format!("{:?} has no value buffer", array.data_type())))?;
    let start = data.offset() * width;
    let len = data.len() * width;
    if start + len > buffer.len() {
        return Err(Error::Internal(format!(
            "value buffer holds {} bytes, slice needs {}..{}",
            buffer.len(),
            start,
            start + len
        )));
    }
    Ok(buffer.slice_with_length(start, len))
}

/// Payload bytes of a variable-length piece.
pub(crate) fn var_len_payload(piece: &dyn Array) -> Result<Buffer> {
    let (offsets, values) = byte_offsets(piece)?;
    let first = offsets.first();
    Ok(values.slice_with_length(first, offsets.last() - first))
}

/// Element values of an array piece, sliced to the piece's rows.
pub(crate) fn array_elements(piece: &dyn Array) -> Result<ArrayRef> {
    let (offsets, values) = item_offsets(piece)?;
    let first = offsets.first();
    Ok(values.slice(first, offsets.last() - first))
}

fn data_bytes(piece: &dyn Array, layout: ChunkLayout) -> Result<Buffer> {
    match layout {
        ChunkLayout::Fixed { width } => fixed_bytes(piece, width),
        ChunkLayout::VarLen => var_len_payload(piece),
        ChunkLayout::VarLenArray { elem_width } => {
            fixed_bytes(array_elements(piece)?.as_ref(), elem_width)
        }
    }
}

/// Map an optional selector onto the sub-buffers `layout` actually has.
pub(crate) fn resolve_sub_buffer(
    layout: ChunkLayout,
    requested: Option<SubBuffer>,
) -> Result<SubBuffer> {
    let sub = requested.unwrap_or(SubBuffer::Data);
    let ok = match layout {
        ChunkLayout::Fixed { .. } => sub == SubBuffer::Data,
        ChunkLayout::VarLen => matches!(sub, SubBuffer::Data | SubBuffer::Offsets),
        ChunkLayout::VarLenArray { .. } => true,
    };
    if ok {
        Ok(sub)
    } else {
        Err(Error::InvalidArgument(format!(
            "sub-buffer {sub:?} does not exist for {layout:?}"
        )))
    }
}

fn num_rows(pieces: &[ArrayRef]) -> usize {
    pieces.iter().map(|p| p.len()).sum()
}

/// Byte size of the selected sub-buffer.
pub(crate) fn sub_buffer_size(
    pieces: &[ArrayRef],
    layout: ChunkLayout,
    sub: SubBuffer,
) -> Result<usize> {
    if sub != SubBuffer::Data {
        return Ok((num_rows(pieces) + 1) * size_of::<u32>());
    }
    match layout {
        ChunkLayout::Fixed { width } => Ok(num_rows(pieces) * width),
        ChunkLayout::VarLen => pieces.iter().try_fold(0, |acc, piece| {
            let (offsets, _) = byte_offsets(piece.as_ref())?;
            Ok(acc + offsets.last() - offsets.first())
        }),
        ChunkLayout::VarLenArray { elem_width } => pieces.iter().try_fold(0, |acc, piece| {
            let (offsets, _) = item_offsets(piece.as_ref())?;
            Ok(acc + (offsets.last() - offsets.first()) * elem_width)
        }),
    }
}

struct ByteCursor<'a> {
    dest: &'a mut [u8],
    pos: usize,
}

impl ByteCursor<'_> {
    fn put(&mut self, bytes: &[u8]) {
        self.dest[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn put_offset(&mut self, value: usize) -> Result<()> {
        let value = u32::try_from(value).map_err(|_| {
            Error::InvalidArgument(format!("offset {value} does not fit 32 bits"))
        })?;
        self.put(&value.to_le_bytes());
        Ok(())
    }
}

/// Copy the selected sub-buffer into `dest`, which must hold exactly
/// [`sub_buffer_size`] bytes.
pub(crate) fn copy_sub_buffer(
    pieces: &[ArrayRef],
    layout: ChunkLayout,
    sub: SubBuffer,
    dest: &mut [u8],
) -> Result<usize> {
    let mut cursor = ByteCursor { dest, pos: 0 };
    match (layout, sub) {
        (_, SubBuffer::Data) => {
            for piece in pieces {
                cursor.put(data_bytes(piece.as_ref(), layout)?.as_slice());
            }
        }
        (ChunkLayout::VarLen, SubBuffer::Offsets) => {
            write_offsets(&mut cursor, pieces, 1, byte_row_offsets)?;
        }
        (ChunkLayout::VarLenArray { elem_width }, SubBuffer::Offsets) => {
            write_offsets(&mut cursor, pieces, elem_width, item_row_offsets)?;
        }
        (ChunkLayout::VarLenArray { .. }, SubBuffer::ItemOffsets) => {
            write_offsets(&mut cursor, pieces, 1, item_row_offsets)?;
        }
        (layout, sub) => {
            return Err(Error::InvalidArgument(format!(
                "sub-buffer {sub:?} does not exist for {layout:?}"
            )));
        }
    }
    Ok(cursor.pos)
}

/// Emit `row_count + 1` offsets starting at zero, continuing across piece boundaries.
fn write_offsets(
    cursor: &mut ByteCursor<'_>,
    pieces: &[ArrayRef],
    scale: usize,
    offsets_of: fn(&dyn Array) -> Result<RowOffsets<'_>>,
) -> Result<()> {
    cursor.put_offset(0)?;
    let mut base = 0usize;
    for piece in pieces {
        let offsets = offsets_of(piece.as_ref())?;
        let first = offsets.first();
        for idx in 1..offsets.count() {
            cursor.put_offset(base + (offsets.get(idx) - first) * scale)?;
        }
        base += (offsets.last() - first) * scale;
    }
    Ok(())
}

/// Expose the data sub-buffer without copying, if the fragment lies in one chunk.
pub(crate) fn zero_copy(
    pieces: &[ArrayRef],
    layout: ChunkLayout,
    sub: SubBuffer,
    num_bytes: usize,
) -> Result<Option<ZeroCopyToken>> {
    if sub != SubBuffer::Data {
        return Ok(None);
    }
    let [piece] = pieces else {
        return Ok(None);
    };
    let bytes = data_bytes(piece.as_ref(), layout)?;
    let bytes = match num_bytes {
        0 => bytes,
        n if n <= bytes.len() => bytes.slice_with_length(0, n),
        n => {
            return Err(Error::InvalidArgument(format!(
                "requested {n} bytes from a {} byte buffer",
                bytes.len()
            )));
        }
    };
    Ok(Some(ZeroCopyToken {
        chunk: Arc::clone(piece),
        bytes,
    }))
}
