//! Per-fragment statistics surfaced to the execution layer.
//!
//! The store computes these at ingestion and never interprets them afterwards.

use fragstore_types::{ColumnId, DatabaseId, FragmentId, TableId};

/// A min or max bound. Integer-like types (including booleans, decimals as unscaled
/// values, temporal types and dictionary codes) report `Int`; floats report `Float`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum StatValue {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkStats {
    /// `None` when the column has no ordering or the slice holds only nulls.
    pub min: Option<StatValue>,
    pub max: Option<StatValue>,
    pub null_count: usize,
}

impl ChunkStats {
    pub(crate) fn merge_bounds(&mut self, lo: StatValue, hi: StatValue) {
        self.min = Some(match self.min {
            Some(cur) if cur <= lo => cur,
            _ => lo,
        });
        self.max = Some(match self.max {
            Some(cur) if cur >= hi => cur,
            _ => hi,
        });
    }
}

/// Metadata of one column within one fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMetadata {
    /// Bytes of the data sub-buffer (values, payload, or array elements).
    pub num_bytes: usize,
    /// Rows covered by the chunk.
    pub num_elements: usize,
    pub stats: ChunkStats,
}

/// One fragment of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentInfo {
    pub fragment_id: FragmentId,
    /// Table row index of the first row.
    pub offset: usize,
    pub row_count: usize,
    /// Chunk metadata in column order; column id `n` is at index `n - 1`.
    pub chunks: Vec<ChunkMetadata>,
}

impl FragmentInfo {
    pub fn chunk(&self, column_id: ColumnId) -> Option<&ChunkMetadata> {
        let idx = usize::try_from(column_id).ok()?.checked_sub(1)?;
        self.chunks.get(idx)
    }
}

/// Fragment summary of a table, as returned by `get_table_metadata`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFragmentsInfo {
    pub db_id: DatabaseId,
    pub table_id: TableId,
    pub row_count: usize,
    pub fragments: Vec<FragmentInfo>,
}

impl TableFragmentsInfo {
    pub fn num_fragments(&self) -> usize {
        self.fragments.len()
    }
}
