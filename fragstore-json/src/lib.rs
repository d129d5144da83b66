//! Line-delimited JSON ingestion.
//!
//! Each input line is one JSON object; keys are matched to columns by name. Keys absent
//! from an object read as NULL.

mod options;
mod reader;

pub use options::{DEFAULT_JSON_BLOCK_SIZE, JsonParseOptions};
pub use reader::parse_json_data;
