//! Parquet ingestion.
//!
//! Parquet files carry their own schema, so there is no column override here: the
//! store infers column definitions from the Arrow schema the reader reports.

mod reader;

pub use reader::{parse_parquet_bytes, parse_parquet_file};
