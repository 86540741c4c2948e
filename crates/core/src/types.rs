//! Element type names and numeric domains
//!
//! Every database stores embeddings of exactly one [`ElementType`]. The
//! lower-case name returned by [`ElementType::name`] is what the storage
//! collaborator records next to each payload.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bigfloat::BIGFLOAT_WIDTH;
use crate::error::{EmbedError, EmbedResult};

/// Numeric domain of an element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericDomain {
    /// Two's complement integers
    SignedInteger,
    /// Unsigned integers
    UnsignedInteger,
    /// IEEE-754 binary floating point
    BinaryFloat,
    /// Arbitrary-precision binary floating point
    ArbitraryFloat,
}

impl NumericDomain {
    /// True for the two integer domains
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            NumericDomain::SignedInteger | NumericDomain::UnsignedInteger
        )
    }
}

/// The fourteen registered element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// 8-bit signed integer
    Int8,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit signed integer
    Int16,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit signed integer
    Int32,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit signed integer
    Int64,
    /// 64-bit unsigned integer
    UInt64,
    /// 128-bit signed integer
    Int128,
    /// 128-bit unsigned integer
    UInt128,
    /// IEEE-754 binary16
    Float16,
    /// IEEE-754 binary32
    Float32,
    /// IEEE-754 binary64
    Float64,
    /// 256-bit mantissa binary float
    BigFloat,
}

impl ElementType {
    /// All registered element types
    pub const ALL: [ElementType; 14] = [
        ElementType::Int8,
        ElementType::UInt8,
        ElementType::Int16,
        ElementType::UInt16,
        ElementType::Int32,
        ElementType::UInt32,
        ElementType::Int64,
        ElementType::UInt64,
        ElementType::Int128,
        ElementType::UInt128,
        ElementType::Float16,
        ElementType::Float32,
        ElementType::Float64,
        ElementType::BigFloat,
    ];

    /// Canonical lower-case name
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Int8 => "int8",
            ElementType::UInt8 => "uint8",
            ElementType::Int16 => "int16",
            ElementType::UInt16 => "uint16",
            ElementType::Int32 => "int32",
            ElementType::UInt32 => "uint32",
            ElementType::Int64 => "int64",
            ElementType::UInt64 => "uint64",
            ElementType::Int128 => "int128",
            ElementType::UInt128 => "uint128",
            ElementType::Float16 => "float16",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
            ElementType::BigFloat => "bigfloat",
        }
    }

    /// Parse from a type name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_ascii_lowercase();
        ElementType::ALL.into_iter().find(|t| t.name() == lower)
    }

    /// Parse, failing with `UnsupportedType`
    pub fn resolve(s: &str) -> EmbedResult<Self> {
        Self::parse(s).ok_or_else(|| EmbedError::unsupported_type(s))
    }

    /// Encoded width of one element in bytes
    pub fn width(&self) -> usize {
        match self {
            ElementType::Int8 | ElementType::UInt8 => 1,
            ElementType::Int16 | ElementType::UInt16 | ElementType::Float16 => 2,
            ElementType::Int32 | ElementType::UInt32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::UInt64 | ElementType::Float64 => 8,
            ElementType::Int128 | ElementType::UInt128 => 16,
            ElementType::BigFloat => BIGFLOAT_WIDTH,
        }
    }

    /// Numeric domain
    pub fn domain(&self) -> NumericDomain {
        match self {
            ElementType::Int8
            | ElementType::Int16
            | ElementType::Int32
            | ElementType::Int64
            | ElementType::Int128 => NumericDomain::SignedInteger,
            ElementType::UInt8
            | ElementType::UInt16
            | ElementType::UInt32
            | ElementType::UInt64
            | ElementType::UInt128 => NumericDomain::UnsignedInteger,
            ElementType::Float16 | ElementType::Float32 | ElementType::Float64 => {
                NumericDomain::BinaryFloat
            }
            ElementType::BigFloat => NumericDomain::ArbitraryFloat,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ElementType {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}
