//! Error types and result definitions for fragstore.
//!
//! Every fragstore crate returns [`Result<T>`] and reports failures through the
//! single [`Error`] enum, so failures propagate across crate boundaries with `?`
//! and callers can match on the variant that matters to them.
//!
//! # Error Categories
//!
//! - **Schema errors** ([`Error::InvalidSchema`], [`Error::SchemaMismatch`]): malformed column
//!   lists at creation time, incompatible batches at append time
//! - **Lookup failures** ([`Error::TableNotFound`], [`Error::TableAlreadyExists`],
//!   [`Error::DictionaryNotFound`])
//! - **Fetch errors** ([`Error::BufferTooSmall`])
//! - **Ingestion errors** ([`Error::ParseFailure`], [`Error::UnsupportedType`])
//! - **Ambient errors** ([`Error::Io`], [`Error::Arrow`], [`Error::InvalidArgument`],
//!   [`Error::Internal`])
//!
//! None of these are retried internally. Retry policy belongs to whoever drives ingestion.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
