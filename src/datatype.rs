//! Physical datatypes of array dimensions, attributes and enumerations.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Resolution of `DATETIME_*` and `TIME_*` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeUnit {
    /// Years.
    Year,
    /// Months.
    Month,
    /// Weeks.
    Week,
    /// Days.
    Day,
    /// Hours.
    Hour,
    /// Minutes.
    Minute,
    /// Seconds.
    Second,
    /// Milliseconds.
    Millisecond,
    /// Microseconds.
    Microsecond,
    /// Nanoseconds.
    Nanosecond,
    /// Picoseconds.
    Picosecond,
    /// Femtoseconds.
    Femtosecond,
    /// Attoseconds.
    Attosecond,
}

impl TimeUnit {
    /// Suffix used in canonical datatype names.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Year => "YEAR",
            TimeUnit::Month => "MONTH",
            TimeUnit::Week => "WEEK",
            TimeUnit::Day => "DAY",
            TimeUnit::Hour => "HR",
            TimeUnit::Minute => "MIN",
            TimeUnit::Second => "SEC",
            TimeUnit::Millisecond => "MS",
            TimeUnit::Microsecond => "US",
            TimeUnit::Nanosecond => "NS",
            TimeUnit::Picosecond => "PS",
            TimeUnit::Femtosecond => "FS",
            TimeUnit::Attosecond => "AS",
        }
    }
}

/// Storage datatype of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Datatype {
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// 32-bit IEEE float.
    Float32,
    /// 64-bit IEEE float.
    Float64,
    /// Single byte character.
    Char,
    /// ASCII string.
    StringAscii,
    /// UTF-8 string.
    StringUtf8,
    /// UTF-16 string.
    StringUtf16,
    /// UTF-32 string.
    StringUtf32,
    /// UCS-2 string.
    StringUcs2,
    /// UCS-4 string.
    StringUcs4,
    /// Untyped bytes.
    Any,
    /// 64-bit datetime at the given resolution.
    Datetime(TimeUnit),
    /// 64-bit time of day at the given resolution.
    Time(TimeUnit),
    /// Opaque binary object.
    Blob,
    /// Boolean stored in one byte.
    Bool,
    /// Well-known-binary geometry.
    GeomWkb,
    /// Well-known-text geometry.
    GeomWkt,
}

impl Datatype {
    /// Width in bytes of a single value of this datatype.
    #[must_use]
    pub fn size(self) -> u64 {
        match self {
            Datatype::Int8
            | Datatype::UInt8
            | Datatype::Char
            | Datatype::StringAscii
            | Datatype::StringUtf8
            | Datatype::Any
            | Datatype::Blob
            | Datatype::Bool
            | Datatype::GeomWkb
            | Datatype::GeomWkt => 1,
            Datatype::Int16 | Datatype::UInt16 | Datatype::StringUtf16 | Datatype::StringUcs2 => {
                2
            }
            Datatype::Int32
            | Datatype::UInt32
            | Datatype::Float32
            | Datatype::StringUtf32
            | Datatype::StringUcs4 => 4,
            Datatype::Int64
            | Datatype::UInt64
            | Datatype::Float64
            | Datatype::Datetime(_)
            | Datatype::Time(_) => 8,
        }
    }

    /// Returns true for single-byte string types that query conditions compare bytewise.
    #[must_use]
    pub fn is_byte_string(self) -> bool {
        matches!(
            self,
            Datatype::StringAscii | Datatype::StringUtf8 | Datatype::Char
        )
    }

    /// Returns true for the integer datatypes.
    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Datatype::Int8
                | Datatype::Int16
                | Datatype::Int32
                | Datatype::Int64
                | Datatype::UInt8
                | Datatype::UInt16
                | Datatype::UInt32
                | Datatype::UInt64
        )
    }

    /// Returns true when enumeration indices may be stored in this datatype.
    #[must_use]
    pub fn is_index_type(self) -> bool {
        self.is_integer() || self == Datatype::Bool
    }

    /// Returns true for datatypes that query conditions cannot filter on.
    #[must_use]
    pub fn is_unsupported_in_conditions(self) -> bool {
        matches!(
            self,
            Datatype::Any
                | Datatype::StringUtf16
                | Datatype::StringUtf32
                | Datatype::StringUcs2
                | Datatype::StringUcs4
                | Datatype::Blob
                | Datatype::GeomWkb
                | Datatype::GeomWkt
        )
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Datatype::Int8 => "INT8",
            Datatype::Int16 => "INT16",
            Datatype::Int32 => "INT32",
            Datatype::Int64 => "INT64",
            Datatype::UInt8 => "UINT8",
            Datatype::UInt16 => "UINT16",
            Datatype::UInt32 => "UINT32",
            Datatype::UInt64 => "UINT64",
            Datatype::Float32 => "FLOAT32",
            Datatype::Float64 => "FLOAT64",
            Datatype::Char => "CHAR",
            Datatype::StringAscii => "STRING_ASCII",
            Datatype::StringUtf8 => "STRING_UTF8",
            Datatype::StringUtf16 => "STRING_UTF16",
            Datatype::StringUtf32 => "STRING_UTF32",
            Datatype::StringUcs2 => "STRING_UCS2",
            Datatype::StringUcs4 => "STRING_UCS4",
            Datatype::Any => "ANY",
            Datatype::Datetime(unit) => return write!(f, "DATETIME_{}", unit.suffix()),
            Datatype::Time(unit) => return write!(f, "TIME_{}", unit.suffix()),
            Datatype::Blob => "BLOB",
            Datatype::Bool => "BOOL",
            Datatype::GeomWkb => "GEOM_WKB",
            Datatype::GeomWkt => "GEOM_WKT",
        };
        f.write_str(name)
    }
}
