use std::sync::Arc;

use fragstore_types::DictId;

use crate::dictionary::StringDictionary;

/// Snapshot of a dictionary's metadata.
///
/// `dictionary` is only populated when the descriptor was requested with `load = true`;
/// the handle keeps the strings alive even if the owning table is dropped afterwards.
#[derive(Debug, Clone)]
pub struct DictDescriptor {
    pub dict_id: DictId,
    /// Number of distinct strings at the time of the request.
    pub size: usize,
    /// Bits needed to represent every assigned code.
    pub bit_width: u32,
    /// Number of columns bound to the dictionary.
    pub ref_count: usize,
    pub dictionary: Option<Arc<StringDictionary>>,
}

impl DictDescriptor {
    pub fn is_shared(&self) -> bool {
        self.ref_count > 1
    }
}
