//! Identifiers and chunk addresses.

use std::fmt;

/// Database (schema) identifier. A store serves exactly one database id.
pub type DatabaseId = i32;

/// Table identifier, assigned by the store starting at `1` and never reused.
pub type TableId = i32;

/// Column identifier, assigned per table starting at `1` in column order.
pub type ColumnId = i32;

/// Dictionary identifier, assigned by the registry starting at `1`.
pub type DictId = i32;

/// Zero-based index into a table's fragment list.
pub type FragmentId = usize;

/// Physical sub-buffer of a variable-length chunk.
///
/// Fixed-width chunks have a single buffer and accept `Data` or no selector at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubBuffer {
    /// Values (fixed), payload bytes (var-len) or flat elements (arrays).
    Data,
    /// Row offsets in bytes, `row_count + 1` entries starting at zero.
    Offsets,
    /// Array columns only: row offsets counted in elements.
    ItemOffsets,
}

/// Fully qualified address of one physical buffer within one fragment of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub db_id: DatabaseId,
    pub table_id: TableId,
    pub column_id: ColumnId,
    pub fragment_id: FragmentId,
    pub sub_buffer: Option<SubBuffer>,
}

impl ChunkKey {
    pub fn new(
        db_id: DatabaseId,
        table_id: TableId,
        column_id: ColumnId,
        fragment_id: FragmentId,
    ) -> Self {
        Self {
            db_id,
            table_id,
            column_id,
            fragment_id,
            sub_buffer: None,
        }
    }

    pub fn with_sub_buffer(mut self, sub_buffer: SubBuffer) -> Self {
        self.sub_buffer = Some(sub_buffer);
        self
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{},{},{}",
            self.db_id, self.table_id, self.column_id, self.fragment_id
        )?;
        match self.sub_buffer {
            Some(SubBuffer::Data) => write!(f, ",data]"),
            Some(SubBuffer::Offsets) => write!(f, ",offsets]"),
            Some(SubBuffer::ItemOffsets) => write!(f, ",item_offsets]"),
            None => write!(f, "]"),
        }
    }
}

/// Table reference accepted by append and drop calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableRef {
    Id(TableId),
    Name(String),
}

impl From<TableId> for TableRef {
    fn from(id: TableId) -> Self {
        TableRef::Id(id)
    }
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        TableRef::Name(name.to_string())
    }
}

impl From<String> for TableRef {
    fn from(name: String) -> Self {
        TableRef::Name(name)
    }
}

impl From<&String> for TableRef {
    fn from(name: &String) -> Self {
        TableRef::Name(name.clone())
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRef::Id(id) => write!(f, "#{id}"),
            TableRef::Name(name) => write!(f, "'{name}'"),
        }
    }
}
