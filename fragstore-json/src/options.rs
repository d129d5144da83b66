/// Default read buffer capacity: 1 MiB.
pub const DEFAULT_JSON_BLOCK_SIZE: usize = 1 << 20;

#[derive(Debug, Clone)]
pub struct JsonParseOptions {
    /// Lines dropped from the start of the input.
    pub skip_rows: usize,
    /// Capacity of the read buffer, in bytes.
    pub block_size: usize,
    /// Rows per decoded Arrow batch.
    pub batch_size: Option<usize>,
}

impl Default for JsonParseOptions {
    fn default() -> Self {
        Self {
            skip_rows: 0,
            block_size: DEFAULT_JSON_BLOCK_SIZE,
            batch_size: None,
        }
    }
}

impl JsonParseOptions {
    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}
