//! Fragmented in-memory columnar tables.
//!
//! A [`TableStore`] owns a directory of tables and a dictionary registry. Each table
//! keeps its columns as the Arrow chunks they were ingested in and partitions rows into
//! fixed-capacity fragments; every append adds `ceil(rows / fragment_size)` new
//! fragments and never tops up the last one.
//!
//! The read side addresses one buffer at a time through a [`ChunkKey`](fragstore_types::ChunkKey):
//! fixed-width values, variable-length payload and offsets, or array elements with both
//! offset levels. Offsets are always returned as little-endian `u32`, starting at zero
//! for each fragment.

mod catalog;
mod chunked;
mod convert;
mod fetch;
mod fragmenter;
pub mod metadata;
mod schema;
mod store;
mod table;

pub use catalog::{ColumnInfo, TableInfo};
pub use fetch::ZeroCopyToken;
pub use metadata::{ChunkMetadata, ChunkStats, FragmentInfo, StatValue, TableFragmentsInfo};
pub use store::TableStore;
