//! Delimited-text Format Parser.
//!
//! Turns a CSV file or an in-memory CSV buffer into a [`ColumnBatch`]. When the caller
//! supplies column definitions the text is decoded straight into their Arrow input
//! types; otherwise types are inferred from a sample of the input.
//!
//! The parser is stateless: every call opens, decodes and drops its input.
//!
//! [`ColumnBatch`]: fragstore_types::ColumnBatch

mod options;
mod reader;

pub use options::CsvParseOptions;
pub use reader::{parse_csv_data, parse_csv_file};
