use std::{fmt, io};
use thiserror::Error;

/// Unified error type for all fragstore operations.
///
/// Errors are synchronous: they are returned from the call that detected them and
/// leave the store in the state it had before the call started.
///
/// # Thread Safety
///
/// `Error` implements `Send` and `Sync`, so a failed ingestion on one thread can be
/// reported on another.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while opening or reading a source file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow error raised while slicing, casting, or assembling column batches.
    ///
    /// Decode failures of source bytes are reported as [`Error::ParseFailure`] instead;
    /// this variant covers Arrow failures on data that was already parsed.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Malformed column list at table creation.
    ///
    /// Raised for an empty column list, duplicate column names, an empty table name, or an
    /// unsupported type/encoding combination (for example dictionary encoding on an
    /// integer column).
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A table with the requested name already exists in the store.
    #[error("table '{0}' already exists")]
    TableAlreadyExists(String),

    /// The table named by id or name does not exist.
    #[error("table {0} not found")]
    TableNotFound(String),

    /// An appended batch does not match the table's reconciled schema.
    ///
    /// The message names the first incompatible column. Nothing is appended when this
    /// error is returned.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The caller-provided destination cannot hold the requested fetch.
    #[error("destination buffer too small: {required} bytes required, {available} available")]
    BufferTooSmall { required: usize, available: usize },

    /// A source format produced, or a caller requested, a type or encoding that the store
    /// does not implement.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Source bytes could not be decoded into a column batch at all.
    #[error("parse failure: {0}")]
    ParseFailure(String),

    /// Dictionary id is not registered.
    #[error("dictionary {0} not found")]
    DictionaryNotFound(i32),

    /// Invalid API parameter (zero fragment size, bad sub-buffer selector, out-of-range
    /// fragment id, oversized byte hint).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error indicating a violated invariant or a poisoned lock.
    #[error("an internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap any displayable decode error as [`Error::ParseFailure`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fragstore_result::Error;
    ///
    /// let err = Error::parse_failure("unexpected end of input");
    /// assert!(matches!(err, Error::ParseFailure(msg) if msg.contains("end of input")));
    /// ```
    #[inline]
    pub fn parse_failure<E: fmt::Display>(err: E) -> Self {
        Error::ParseFailure(err.to_string())
    }

    #[inline]
    pub fn table_not_found(table: impl fmt::Display) -> Self {
        Error::TableNotFound(table.to_string())
    }

    /// Poisoned-lock helper used by every `RwLock`/`Mutex` acquisition in the workspace.
    #[inline]
    pub fn poisoned(what: &str) -> Self {
        Error::Internal(format!("{what} lock poisoned"))
    }
}
