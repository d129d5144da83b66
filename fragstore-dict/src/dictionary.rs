use std::sync::{Arc, RwLock};

use fragstore_result::{Error, Result};
use fragstore_types::DictId;
use rustc_hash::FxHashMap;

/// Growth-only string dictionary.
///
/// Codes are assigned densely from `0` in first-seen order and never reused. Interning
/// is linearizable: two threads racing on the same unseen string observe one code.
#[derive(Debug)]
pub struct StringDictionary {
    dict_id: DictId,
    inner: RwLock<DictionaryInner>,
}

#[derive(Debug, Default)]
struct DictionaryInner {
    codes: FxHashMap<Arc<str>, i32>,
    strings: Vec<Arc<str>>,
}

impl DictionaryInner {
    fn intern(&mut self, value: &str) -> Result<i32> {
        if let Some(&code) = self.codes.get(value) {
            return Ok(code);
        }
        let code = i32::try_from(self.strings.len())
            .map_err(|_| Error::Internal("dictionary code space exhausted".into()))?;
        let value: Arc<str> = Arc::from(value);
        self.strings.push(Arc::clone(&value));
        self.codes.insert(value, code);
        Ok(code)
    }
}

impl StringDictionary {
    pub(crate) fn new(dict_id: DictId) -> Self {
        Self {
            dict_id,
            inner: RwLock::new(DictionaryInner::default()),
        }
    }

    pub fn dict_id(&self) -> DictId {
        self.dict_id
    }

    /// Return the code of `value`, assigning the next one if it was never seen.
    pub fn get_or_create(&self, value: &str) -> Result<i32> {
        {
            let inner = self
                .inner
                .read()
                .map_err(|_| Error::poisoned("dictionary"))?;
            if let Some(&code) = inner.codes.get(value) {
                return Ok(code);
            }
        }
        // Re-checked under the write lock: another writer may have interned it meanwhile.
        let mut inner = self
            .inner
            .write()
            .map_err(|_| Error::poisoned("dictionary"))?;
        inner.intern(value)
    }

    /// Intern a run of values under a single write lock.
    ///
    /// `None` entries map to `null_code` and do not touch the dictionary.
    pub fn get_or_create_bulk<'a, I>(&self, values: I, null_code: i32) -> Result<Vec<i32>>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let values = values.into_iter();
        let mut out = Vec::with_capacity(values.size_hint().0);
        let mut inner = self
            .inner
            .write()
            .map_err(|_| Error::poisoned("dictionary"))?;
        for value in values {
            match value {
                Some(v) => out.push(inner.intern(v)?),
                None => out.push(null_code),
            }
        }
        Ok(out)
    }

    /// Code of `value` if it has been interned.
    pub fn code_of(&self, value: &str) -> Option<i32> {
        self.inner.read().ok()?.codes.get(value).copied()
    }

    /// String behind `code`, for caller-side decoding.
    pub fn get_string(&self, code: i32) -> Option<Arc<str>> {
        let idx = usize::try_from(code).ok()?;
        self.inner.read().ok()?.strings.get(idx).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.strings.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bits needed to represent the largest assigned code; `0` for an empty dictionary.
    pub fn bit_width(&self) -> u32 {
        bit_width_for(self.len())
    }
}

pub(crate) fn bit_width_for(size: usize) -> u32 {
    match size {
        0 => 0,
        1 => 1,
        n => usize::BITS - (n - 1).leading_zeros(),
    }
}
