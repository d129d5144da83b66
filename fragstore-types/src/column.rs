//! Logical column types, encodings and column definitions.
//!
//! A [`ColumnType`] names what a column holds; a [`ColumnEncoding`] names how text is
//! stored. Together with a name they form a [`ColumnDescription`], the unit of schema
//! reconciliation: two columns are compatible iff all three match exactly.

use std::fmt;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, TimeUnit as ArrowTimeUnit};
use fragstore_result::{Error, Result};

use crate::ids::DictId;
use crate::layout::ChunkLayout;

/// Sub-second precision of a timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    pub fn to_arrow(self) -> ArrowTimeUnit {
        match self {
            TimeUnit::Second => ArrowTimeUnit::Second,
            TimeUnit::Millisecond => ArrowTimeUnit::Millisecond,
            TimeUnit::Microsecond => ArrowTimeUnit::Microsecond,
            TimeUnit::Nanosecond => ArrowTimeUnit::Nanosecond,
        }
    }

    pub fn from_arrow(unit: &ArrowTimeUnit) -> Self {
        match unit {
            ArrowTimeUnit::Second => TimeUnit::Second,
            ArrowTimeUnit::Millisecond => TimeUnit::Millisecond,
            ArrowTimeUnit::Microsecond => TimeUnit::Microsecond,
            ArrowTimeUnit::Nanosecond => TimeUnit::Nanosecond,
        }
    }
}

/// Logical type of a table column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    /// Fixed-precision decimal stored as an unscaled 64-bit integer.
    Decimal { precision: u8, scale: i8 },
    /// Days since the UNIX epoch.
    Date,
    /// Microseconds since midnight.
    Time,
    Timestamp(TimeUnit),
    Text,
    Binary,
    /// Variable-length array of a fixed-width primitive.
    Array(Box<ColumnType>),
}

/// Largest decimal precision that fits the 64-bit unscaled representation.
pub const MAX_DECIMAL_PRECISION: u8 = 18;

impl ColumnType {
    /// Width in bytes of one stored value, or `None` for variable-length types.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            ColumnType::Bool | ColumnType::TinyInt => Some(1),
            ColumnType::SmallInt => Some(2),
            ColumnType::Int | ColumnType::Float | ColumnType::Date => Some(4),
            ColumnType::BigInt
            | ColumnType::Double
            | ColumnType::Decimal { .. }
            | ColumnType::Time
            | ColumnType::Timestamp(_) => Some(8),
            ColumnType::Text | ColumnType::Binary | ColumnType::Array(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ColumnType::Text)
    }

    /// Arrow type a parser should produce for this column.
    ///
    /// Dictionary-encoded text is still parsed as plain `Utf8`; the table store
    /// interns it into codes during ingestion.
    pub fn arrow_input_type(&self) -> DataType {
        match self {
            ColumnType::Bool => DataType::Boolean,
            ColumnType::TinyInt => DataType::Int8,
            ColumnType::SmallInt => DataType::Int16,
            ColumnType::Int => DataType::Int32,
            ColumnType::BigInt => DataType::Int64,
            ColumnType::Float => DataType::Float32,
            ColumnType::Double => DataType::Float64,
            ColumnType::Decimal { precision, scale } => DataType::Decimal128(*precision, *scale),
            ColumnType::Date => DataType::Date32,
            ColumnType::Time => DataType::Time64(ArrowTimeUnit::Microsecond),
            ColumnType::Timestamp(unit) => DataType::Timestamp(unit.to_arrow(), None),
            ColumnType::Text => DataType::Utf8,
            ColumnType::Binary => DataType::Binary,
            ColumnType::Array(elem) => {
                DataType::List(Arc::new(Field::new("item", elem.arrow_input_type(), true)))
            }
        }
    }

    /// Map an Arrow type produced by a parser to the logical type it represents.
    ///
    /// Returns the encoding implied by the Arrow type as well: string columns come back
    /// dictionary-encoded, everything else unencoded.
    pub fn from_arrow(data_type: &DataType) -> Result<(ColumnType, ColumnEncoding)> {
        let ty = match data_type {
            DataType::Boolean => ColumnType::Bool,
            DataType::Int8 => ColumnType::TinyInt,
            DataType::Int16 => ColumnType::SmallInt,
            DataType::Int32 => ColumnType::Int,
            DataType::Int64 => ColumnType::BigInt,
            DataType::Float32 => ColumnType::Float,
            DataType::Float64 => ColumnType::Double,
            DataType::Decimal128(precision, scale) if *precision <= MAX_DECIMAL_PRECISION => {
                ColumnType::Decimal {
                    precision: *precision,
                    scale: *scale,
                }
            }
            DataType::Date32 => ColumnType::Date,
            DataType::Time32(_) | DataType::Time64(_) => ColumnType::Time,
            DataType::Timestamp(unit, None) => ColumnType::Timestamp(TimeUnit::from_arrow(unit)),
            DataType::Utf8 | DataType::LargeUtf8 => {
                return Ok((ColumnType::Text, ColumnEncoding::Dictionary));
            }
            DataType::Dictionary(_, value) if matches!(**value, DataType::Utf8 | DataType::LargeUtf8) => {
                return Ok((ColumnType::Text, ColumnEncoding::Dictionary));
            }
            DataType::Binary | DataType::LargeBinary => ColumnType::Binary,
            DataType::List(item) | DataType::LargeList(item) => {
                let (elem, _) = ColumnType::from_arrow(item.data_type())?;
                if elem.fixed_width().is_none() {
                    return Err(Error::UnsupportedType(format!(
                        "arrays of {elem} are not supported"
                    )));
                }
                ColumnType::Array(Box::new(elem))
            }
            other => {
                return Err(Error::UnsupportedType(format!(
                    "Arrow type {other:?} has no column type"
                )));
            }
        };
        Ok((ty, ColumnEncoding::None))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Bool => write!(f, "BOOLEAN"),
            ColumnType::TinyInt => write!(f, "TINYINT"),
            ColumnType::SmallInt => write!(f, "SMALLINT"),
            ColumnType::Int => write!(f, "INT"),
            ColumnType::BigInt => write!(f, "BIGINT"),
            ColumnType::Float => write!(f, "FLOAT"),
            ColumnType::Double => write!(f, "DOUBLE"),
            ColumnType::Decimal { precision, scale } => write!(f, "DECIMAL({precision},{scale})"),
            ColumnType::Date => write!(f, "DATE"),
            ColumnType::Time => write!(f, "TIME"),
            ColumnType::Timestamp(unit) => write!(f, "TIMESTAMP({unit:?})"),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Binary => write!(f, "BINARY"),
            ColumnType::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

/// Storage encoding of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColumnEncoding {
    #[default]
    None,
    /// Text stored as 32-bit codes into a dictionary owned by this column.
    Dictionary,
    /// Text stored as codes into an existing dictionary. Sharing is always explicit.
    SharedDictionary(DictId),
}

impl ColumnEncoding {
    pub fn is_dictionary(&self) -> bool {
        !matches!(self, ColumnEncoding::None)
    }
}

/// Column definition: name, logical type and encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDescription {
    pub name: String,
    pub column_type: ColumnType,
    pub encoding: ColumnEncoding,
}

impl ColumnDescription {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            encoding: ColumnEncoding::None,
        }
    }

    /// Dictionary-encoded text column with its own dictionary.
    pub fn dict_text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text).with_encoding(ColumnEncoding::Dictionary)
    }

    pub fn with_encoding(mut self, encoding: ColumnEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn is_dictionary_encoded(&self) -> bool {
        self.encoding.is_dictionary()
    }

    /// Physical layout the fetch layer reconstructs for this column.
    pub fn layout(&self) -> ChunkLayout {
        if self.is_dictionary_encoded() {
            return ChunkLayout::Fixed {
                width: std::mem::size_of::<i32>(),
            };
        }
        match &self.column_type {
            ColumnType::Text | ColumnType::Binary => ChunkLayout::VarLen,
            ColumnType::Array(elem) => ChunkLayout::VarLenArray {
                elem_width: elem.fixed_width().unwrap_or_default(),
            },
            other => ChunkLayout::Fixed {
                width: other.fixed_width().unwrap_or_default(),
            },
        }
    }

    /// Reject type/encoding combinations the store cannot hold.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidSchema("column name must not be empty".into()));
        }
        if self.encoding.is_dictionary() && !self.column_type.is_text() {
            return Err(Error::InvalidSchema(format!(
                "column '{}': dictionary encoding requires TEXT, got {}",
                self.name, self.column_type
            )));
        }
        match &self.column_type {
            ColumnType::Decimal { precision, .. } if *precision > MAX_DECIMAL_PRECISION => {
                Err(Error::InvalidSchema(format!(
                    "column '{}': decimal precision {precision} exceeds {MAX_DECIMAL_PRECISION}",
                    self.name
                )))
            }
            ColumnType::Array(elem) if elem.fixed_width().is_none() => {
                Err(Error::InvalidSchema(format!(
                    "column '{}': array elements must be fixed-width, got {elem}",
                    self.name
                )))
            }
            _ => Ok(()),
        }
    }

    /// Arrow field a parser should produce for this column.
    pub fn arrow_field(&self) -> Field {
        Field::new(&self.name, self.column_type.arrow_input_type(), true)
    }
}

impl fmt::Display for ColumnDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)?;
        match self.encoding {
            ColumnEncoding::None => Ok(()),
            ColumnEncoding::Dictionary => write!(f, " ENCODING DICT"),
            ColumnEncoding::SharedDictionary(id) => write!(f, " ENCODING DICT SHARED {id}"),
        }
    }
}
