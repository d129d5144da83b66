//! fragstore: an in-process fragmented columnar table store
//!
//! This crate is the entrypoint for the workspace. It re-exports the table store and
//! the types needed to describe tables, ingest data and address physical buffers.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{ArrayRef, Int32Array};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use arrow::record_batch::RecordBatch;
//! use fragstore::{ChunkKey, ColumnDescription, ColumnType, TableOptions, TableStore};
//!
//! let store = TableStore::new(1);
//! let info = store
//!     .create_table(
//!         "t",
//!         &[ColumnDescription::new("a", ColumnType::Int)],
//!         TableOptions::new(3),
//!     )
//!     .unwrap();
//!
//! let schema = Arc::new(Schema::new(vec![Field::new("a", DataType::Int32, true)]));
//! let values: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3, 4, 5]));
//! let batch = RecordBatch::try_new(schema, vec![values]).unwrap();
//! store.append_arrow_table(batch, "t").unwrap();
//!
//! let bytes = store.fetch_to_vec(&ChunkKey::new(1, info.table_id, 1, 1)).unwrap();
//! assert_eq!(bytes.len(), 8);
//! ```
//!
//! # Architecture
//!
//! - **Types** (`fragstore-types`): identifiers, chunk addresses, logical column types.
//! - **Dictionaries** (`fragstore-dict`): string-to-code dictionaries shared by id.
//! - **Parsers** (`fragstore-csv`, `fragstore-json`, `fragstore-parquet`): decode
//!   external formats into Arrow batches.
//! - **Storage** (`fragstore-table`): catalog, fragmenter, table store and buffer fetch.

pub use fragstore_table::{
    ChunkMetadata, ChunkStats, ColumnInfo, FragmentInfo, StatValue, TableFragmentsInfo,
    TableInfo, TableStore, ZeroCopyToken,
};

pub use fragstore_types::{
    ChunkKey, ChunkLayout, ColumnBatch, ColumnDescription, ColumnEncoding, ColumnId,
    ColumnType, DEFAULT_FRAGMENT_SIZE, DatabaseId, DictId, FragmentId, SubBuffer, TableId,
    TableOptions, TableRef, TimeUnit,
};

pub use fragstore_dict::{DictDescriptor, StringDictionary};

// Re-export parser options
pub mod formats {
    //! Options for the external formats the store ingests.

    pub use fragstore_csv::CsvParseOptions;
    pub use fragstore_json::JsonParseOptions;
    pub use fragstore_parquet::{parse_parquet_bytes, parse_parquet_file};
}

// Re-export result types for error handling
pub use fragstore_result::{Error, Result};
