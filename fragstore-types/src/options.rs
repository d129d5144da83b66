/// Rows per fragment when [`TableOptions::fragment_size`] is not overridden.
pub const DEFAULT_FRAGMENT_SIZE: usize = 32_000_000;

/// Per-table configuration passed to `create_table` and the `import_*` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Maximum rows per fragment. Must be greater than zero.
    pub fragment_size: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            fragment_size: DEFAULT_FRAGMENT_SIZE,
        }
    }
}

impl TableOptions {
    pub fn new(fragment_size: usize) -> Self {
        Self { fragment_size }
    }

    pub fn with_fragment_size(mut self, fragment_size: usize) -> Self {
        self.fragment_size = fragment_size;
        self
    }
}
