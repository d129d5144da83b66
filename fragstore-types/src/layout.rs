/// Physical layout of a column's chunks.
///
/// The variant set is closed: every fetch path matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkLayout {
    /// One value of `width` bytes per row.
    Fixed { width: usize },
    /// Row offsets plus a payload of concatenated bytes.
    VarLen,
    /// Row offsets plus a flat payload of `elem_width`-byte elements.
    VarLenArray { elem_width: usize },
}
