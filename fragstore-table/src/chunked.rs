use std::sync::Arc;

use arrow::array::{Array, ArrayRef};

/// One logical column stored as the Arrow chunks it was ingested in.
///
/// Chunks are never concatenated; a fragment may therefore span several chunks and a
/// chunk may back several fragments.
#[derive(Debug, Default)]
pub(crate) struct ChunkedColumn {
    chunks: Vec<ArrayRef>,
    /// Exclusive end row of each chunk.
    ends: Vec<usize>,
}

impl ChunkedColumn {
    pub(crate) fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub(crate) fn push(&mut self, chunk: ArrayRef) {
        if chunk.is_empty() {
            return;
        }
        let end = self.len() + chunk.len();
        self.chunks.push(chunk);
        self.ends.push(end);
    }

    pub(crate) fn into_chunks(self) -> Vec<ArrayRef> {
        self.chunks
    }

    /// Zero-copy views covering rows `offset..offset + len`, in row order.
    pub(crate) fn slices(&self, offset: usize, len: usize) -> Vec<ArrayRef> {
        let mut out = Vec::new();
        if len == 0 {
            return out;
        }
        let end = offset + len;
        let mut idx = self.ends.partition_point(|&e| e <= offset);
        let mut row = offset;
        while row < end && idx < self.chunks.len() {
            let chunk_start = if idx == 0 { 0 } else { self.ends[idx - 1] };
            let chunk = &self.chunks[idx];
            let local = row - chunk_start;
            let take = (chunk.len() - local).min(end - row);
            if local == 0 && take == chunk.len() {
                out.push(Arc::clone(chunk));
            } else {
                out.push(chunk.slice(local, take));
            }
            row += take;
            idx += 1;
        }
        out
    }
}
