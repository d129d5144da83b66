//! Inline null sentinels for fixed-width storage.
//!
//! Fixed-width value buffers never contain undefined slots: a null row holds the
//! sentinel of its physical type, so fetched bytes decode without the validity bitmap.

pub const NULL_BOOLEAN: i8 = i8::MIN;
pub const NULL_TINYINT: i8 = i8::MIN;
pub const NULL_SMALLINT: i16 = i16::MIN;
pub const NULL_INT: i32 = i32::MIN;
pub const NULL_BIGINT: i64 = i64::MIN;
pub const NULL_FLOAT: f32 = f32::MIN_POSITIVE;
pub const NULL_DOUBLE: f64 = f64::MIN_POSITIVE;

/// Dictionary code written for a null text value.
pub const NULL_DICT_CODE: i32 = i32::MIN;
