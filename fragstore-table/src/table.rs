//! Per-table state guarded by the table lock.

use std::sync::Arc;

use arrow::array::ArrayRef;
use fragstore_dict::StringDictionary;
use fragstore_result::{Error, Result};
use fragstore_types::{ChunkLayout, ColumnBatch, ColumnDescription, ColumnId, FragmentId};

use crate::chunked::ChunkedColumn;
use crate::convert::to_storage;
use crate::fragmenter::build_fragments;
use crate::metadata::FragmentInfo;
use crate::schema::compare_schemas;

pub(crate) struct StoredColumn {
    pub(crate) desc: ColumnDescription,
    pub(crate) dictionary: Option<Arc<StringDictionary>>,
    pub(crate) data: ChunkedColumn,
}

impl StoredColumn {
    pub(crate) fn new(desc: ColumnDescription, dictionary: Option<Arc<StringDictionary>>) -> Self {
        Self {
            desc,
            dictionary,
            data: ChunkedColumn::default(),
        }
    }
}

/// Columns, fragments and row count of one table.
///
/// Invariant: fragments are contiguous from row 0 and their row counts sum to
/// `row_count`, which equals the length of every column.
pub(crate) struct TableData {
    pub(crate) fragment_size: usize,
    pub(crate) columns: Vec<StoredColumn>,
    pub(crate) fragments: Vec<FragmentInfo>,
    pub(crate) row_count: usize,
    dropped: bool,
}

impl TableData {
    pub(crate) fn new(fragment_size: usize, columns: Vec<StoredColumn>) -> Self {
        Self {
            fragment_size,
            columns,
            fragments: Vec::new(),
            row_count: 0,
            dropped: false,
        }
    }

    /// Fail operations that reached the table through a handle taken before it was
    /// dropped.
    pub(crate) fn ensure_live(&self, name: &str) -> Result<()> {
        if self.dropped {
            return Err(Error::table_not_found(format!("'{name}'")));
        }
        Ok(())
    }

    /// Release the table's references to its chunks. Zero-copy tokens keep their own.
    pub(crate) fn mark_dropped(&mut self) {
        self.dropped = true;
        self.columns.clear();
        self.fragments.clear();
        self.row_count = 0;
    }

    pub(crate) fn descriptions(&self) -> Vec<ColumnDescription> {
        self.columns.iter().map(|c| c.desc.clone()).collect()
    }

    /// Append `batch` as new fragments. Returns the number of fragments created.
    ///
    /// Everything that can fail runs before the first mutation, so an error leaves the
    /// table untouched.
    pub(crate) fn append(&mut self, batch: &ColumnBatch) -> Result<usize> {
        let descs = self.descriptions();
        compare_schemas(&descs, &batch.schema())?;
        let num_rows = batch.num_rows();
        if num_rows == 0 {
            return Ok(0);
        }

        let mut staged: Vec<(ChunkLayout, ChunkedColumn)> = Vec::with_capacity(self.columns.len());
        for (idx, column) in self.columns.iter().enumerate() {
            let mut chunked = ChunkedColumn::default();
            for chunk in batch.column_chunks(idx) {
                chunked.push(to_storage(&chunk, &column.desc, column.dictionary.as_deref())?);
            }
            staged.push((column.desc.layout(), chunked));
        }

        let fragments = build_fragments(
            &staged,
            self.fragments.len(),
            self.row_count,
            self.fragment_size,
        )?;
        let created = fragments.len();

        for (column, (_, chunked)) in self.columns.iter_mut().zip(staged) {
            for chunk in chunked.into_chunks() {
                column.data.push(chunk);
            }
        }
        self.fragments.extend(fragments);
        self.row_count += num_rows;
        Ok(created)
    }

    /// Layout and stored pieces backing one column of one fragment.
    pub(crate) fn fragment_pieces(
        &self,
        column_id: ColumnId,
        fragment_id: FragmentId,
    ) -> Result<(ChunkLayout, Vec<ArrayRef>)> {
        let column = usize::try_from(column_id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|idx| self.columns.get(idx))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown column id {column_id}")))?;
        let fragment = self.fragments.get(fragment_id).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "fragment {fragment_id} out of range ({} fragments)",
                self.fragments.len()
            ))
        })?;
        Ok((
            column.desc.layout(),
            column.data.slices(fragment.offset, fragment.row_count),
        ))
    }
}
