//! Dictionary Registry.
//!
//! Owns every string dictionary of a store. A dictionary maps byte strings to dense,
//! non-negative `i32` codes in first-seen order and only ever grows. Dictionaries are
//! keyed independently of tables; a column binds to one either by creating it
//! ([`DictionaryRegistry::create_dictionary`]) or by explicitly retaining an existing one
//! ([`DictionaryRegistry::retain`]).

mod descriptor;
mod dictionary;
mod registry;

pub use descriptor::DictDescriptor;
pub use dictionary::StringDictionary;
pub use registry::DictionaryRegistry;
