//! Shared vocabulary for the fragstore crates.
//!
//! These types live in their own crate so the parsers, the dictionary registry and the
//! table store can agree on identifiers and column definitions without depending on
//! each other.

pub mod batch;
pub mod column;
pub mod ids;
pub mod layout;
pub mod null;
pub mod options;

pub use batch::{ColumnBatch, arrow_schema_for};
pub use column::{ColumnDescription, ColumnEncoding, ColumnType, TimeUnit};
pub use ids::{
    ChunkKey, ColumnId, DatabaseId, DictId, FragmentId, SubBuffer, TableId, TableRef,
};
pub use layout::ChunkLayout;
pub use options::{DEFAULT_FRAGMENT_SIZE, TableOptions};
