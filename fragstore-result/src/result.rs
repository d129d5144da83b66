use crate::error::Error;

/// Result type alias used throughout fragstore.
pub type Result<T> = std::result::Result<T, Error>;
