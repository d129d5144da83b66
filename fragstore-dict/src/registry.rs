use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, RwLock};

use fragstore_result::{Error, Result};
use fragstore_types::DictId;
use rustc_hash::FxHashMap;

use crate::descriptor::DictDescriptor;
use crate::dictionary::{StringDictionary, bit_width_for};

struct DictEntry {
    dictionary: Arc<StringDictionary>,
    /// Columns currently bound to this dictionary.
    ref_count: usize,
}

/// Registry of string dictionaries, one per store.
///
/// The registry lock only guards the id -> dictionary map. Interning takes the
/// per-dictionary lock, so appends to unrelated dictionaries never contend.
pub struct DictionaryRegistry {
    next_dict_id: AtomicI32,
    dicts: RwLock<FxHashMap<DictId, DictEntry>>,
}

impl Default for DictionaryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DictionaryRegistry {
    pub fn new() -> Self {
        Self {
            next_dict_id: AtomicI32::new(1),
            dicts: RwLock::new(FxHashMap::default()),
        }
    }

    /// Register a fresh, empty dictionary bound to one column.
    pub fn create_dictionary(&self) -> Result<DictId> {
        let dict_id = self.next_dict_id.fetch_add(1, Ordering::Relaxed);
        let mut dicts = self
            .dicts
            .write()
            .map_err(|_| Error::poisoned("dictionary registry"))?;
        dicts.insert(
            dict_id,
            DictEntry {
                dictionary: Arc::new(StringDictionary::new(dict_id)),
                ref_count: 1,
            },
        );
        tracing::debug!(dict_id, "created dictionary");
        Ok(dict_id)
    }

    /// Bind one more column to an existing dictionary.
    pub fn retain(&self, dict_id: DictId) -> Result<()> {
        let mut dicts = self
            .dicts
            .write()
            .map_err(|_| Error::poisoned("dictionary registry"))?;
        let entry = dicts
            .get_mut(&dict_id)
            .ok_or(Error::DictionaryNotFound(dict_id))?;
        entry.ref_count += 1;
        Ok(())
    }

    /// Unbind one column. Returns `true` when this was the last binding and the
    /// dictionary left the registry.
    ///
    /// Outstanding [`DictDescriptor`] handles keep the strings readable after removal.
    pub fn release(&self, dict_id: DictId) -> Result<bool> {
        let mut dicts = self
            .dicts
            .write()
            .map_err(|_| Error::poisoned("dictionary registry"))?;
        let entry = dicts
            .get_mut(&dict_id)
            .ok_or(Error::DictionaryNotFound(dict_id))?;
        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count == 0 {
            dicts.remove(&dict_id);
            tracing::debug!(dict_id, "released dictionary");
            return Ok(true);
        }
        Ok(false)
    }

    pub fn dictionary(&self, dict_id: DictId) -> Result<Arc<StringDictionary>> {
        let dicts = self
            .dicts
            .read()
            .map_err(|_| Error::poisoned("dictionary registry"))?;
        dicts
            .get(&dict_id)
            .map(|entry| Arc::clone(&entry.dictionary))
            .ok_or(Error::DictionaryNotFound(dict_id))
    }

    /// Code of `value` in dictionary `dict_id`, assigning the next code if unseen.
    pub fn get_or_create(&self, dict_id: DictId, value: &str) -> Result<i32> {
        self.dictionary(dict_id)?.get_or_create(value)
    }

    /// Descriptor of `dict_id`.
    ///
    /// An unknown id yields `Ok(None)` when `load` is false and
    /// [`Error::DictionaryNotFound`] when the caller asked for the dictionary itself.
    pub fn get_dict_metadata(&self, dict_id: DictId, load: bool) -> Result<Option<DictDescriptor>> {
        let dicts = self
            .dicts
            .read()
            .map_err(|_| Error::poisoned("dictionary registry"))?;
        let Some(entry) = dicts.get(&dict_id) else {
            if load {
                return Err(Error::DictionaryNotFound(dict_id));
            }
            return Ok(None);
        };
        let size = entry.dictionary.len();
        Ok(Some(DictDescriptor {
            dict_id,
            size,
            bit_width: bit_width_for(size),
            ref_count: entry.ref_count,
            dictionary: load.then(|| Arc::clone(&entry.dictionary)),
        }))
    }

    pub fn contains(&self, dict_id: DictId) -> bool {
        self.dicts
            .read()
            .map(|dicts| dicts.contains_key(&dict_id))
            .unwrap_or(false)
    }

    /// Number of live dictionaries.
    pub fn len(&self) -> usize {
        self.dicts.read().map(|dicts| dicts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
