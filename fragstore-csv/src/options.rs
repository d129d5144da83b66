use arrow::csv::reader::Format;
use fragstore_result::{Error, Result};
use regex::Regex;

/// Default read buffer capacity: 20 MiB.
pub const DEFAULT_CSV_BLOCK_SIZE: usize = 20 << 20;

#[derive(Debug, Clone)]
pub struct CsvParseOptions {
    pub delimiter: u8,
    /// First (non-skipped) line holds column names.
    pub header: bool,
    /// Lines dropped from the start of the input before the header.
    pub skip_rows: usize,
    /// Capacity of the read buffer, in bytes.
    pub block_size: usize,
    /// Cell text treated as NULL, matched case-insensitively. Empty cells are always NULL.
    pub null_token: Option<String>,
    /// Rows sampled when inferring column types.
    pub max_read_records: Option<usize>,
    /// Rows per decoded Arrow batch.
    pub batch_size: Option<usize>,
}

impl Default for CsvParseOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: true,
            skip_rows: 0,
            block_size: DEFAULT_CSV_BLOCK_SIZE,
            null_token: None,
            max_read_records: None,
            batch_size: None,
        }
    }
}

impl CsvParseOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_null_token(mut self, token: impl Into<String>) -> Self {
        self.null_token = Some(token.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub(crate) fn to_format(&self) -> Result<Format> {
        let mut format = Format::default().with_header(self.header);
        if self.delimiter != b',' {
            format = format.with_delimiter(self.delimiter);
        }
        let pattern = match &self.null_token {
            Some(token) => format!("(?i)^(|{})$", regex::escape(token)),
            None => "^$".to_string(),
        };
        let null_regex = Regex::new(&pattern)
            .map_err(|e| Error::InvalidArgument(format!("invalid CSV null token: {e}")))?;
        Ok(format.with_null_regex(null_regex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = CsvParseOptions::default();
        assert_eq!(opts.delimiter, b',');
        assert!(opts.header);
        assert_eq!(opts.skip_rows, 0);
        assert_eq!(opts.block_size, 20 * 1024 * 1024);
    }

    #[test]
    fn null_token_with_regex_metacharacters_is_escaped() {
        let opts = CsvParseOptions::default().with_null_token("N/A?");
        assert!(opts.to_format().is_ok());
    }
}
