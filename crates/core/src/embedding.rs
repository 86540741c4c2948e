//! Typed embedding vectors
//!
//! [`Embedding`] is a vector tagged with its element type. Conversions
//! between element types go through [`BigFloat`] and are accepted only when
//! they are exact, so a value is never silently truncated or rounded.

use byteorder::{ByteOrder, LittleEndian};
use half::f16;

use crate::bigfloat::{BigFloat, BIGFLOAT_WIDTH};
use crate::error::{EmbedError, EmbedResult};
use crate::types::ElementType;

/// A numeric element type that can be stored in an embedding
pub trait Element: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Registered element type
    const TYPE: ElementType;

    /// Exact lift into the pivot domain
    fn to_big(self) -> BigFloat;

    /// Exact conversion from the pivot domain, `None` if the value would change
    fn from_big(value: &BigFloat) -> Option<Self>;

    /// Coercion into the common distance domain (may round)
    fn to_f64(self) -> f64;

    /// Write little-endian bytes into `buf` (`buf.len() == TYPE.width()`)
    fn write_le(self, buf: &mut [u8]);

    /// Read little-endian bytes (`buf.len() == TYPE.width()`)
    fn read_le(buf: &[u8]) -> Option<Self>;

    /// Borrow the values if `embedding` holds this element type
    fn slice_of(embedding: &Embedding) -> Option<&[Self]>;

    /// Wrap values into the matching `Embedding` variant
    fn into_embedding(values: Vec<Self>) -> Embedding;
}

/// Typed embedding vector
#[derive(Debug, Clone, PartialEq)]
pub enum Embedding {
    /// 8-bit signed integers
    Int8(Vec<i8>),
    /// 8-bit unsigned integers
    UInt8(Vec<u8>),
    /// 16-bit signed integers
    Int16(Vec<i16>),
    /// 16-bit unsigned integers
    UInt16(Vec<u16>),
    /// 32-bit signed integers
    Int32(Vec<i32>),
    /// 32-bit unsigned integers
    UInt32(Vec<u32>),
    /// 64-bit signed integers
    Int64(Vec<i64>),
    /// 64-bit unsigned integers
    UInt64(Vec<u64>),
    /// 128-bit signed integers
    Int128(Vec<i128>),
    /// 128-bit unsigned integers
    UInt128(Vec<u128>),
    /// IEEE-754 binary16
    Float16(Vec<f16>),
    /// IEEE-754 binary32
    Float32(Vec<f32>),
    /// IEEE-754 binary64
    Float64(Vec<f64>),
    /// 256-bit mantissa binary floats
    BigFloat(Vec<BigFloat>),
}

/// Apply `$body` to the inner `Vec` of whichever variant `$e` holds
macro_rules! with_values {
    ($e:expr, $v:ident => $body:expr) => {
        match $e {
            Embedding::Int8($v) => $body,
            Embedding::UInt8($v) => $body,
            Embedding::Int16($v) => $body,
            Embedding::UInt16($v) => $body,
            Embedding::Int32($v) => $body,
            Embedding::UInt32($v) => $body,
            Embedding::Int64($v) => $body,
            Embedding::UInt64($v) => $body,
            Embedding::Int128($v) => $body,
            Embedding::UInt128($v) => $body,
            Embedding::Float16($v) => $body,
            Embedding::Float32($v) => $body,
            Embedding::Float64($v) => $body,
            Embedding::BigFloat($v) => $body,
        }
    };
}

impl Embedding {
    /// Number of elements
    pub fn len(&self) -> usize {
        with_values!(self, v => v.len())
    }

    /// True if there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type carried by this vector
    pub fn element_type(&self) -> ElementType {
        match self {
            Embedding::Int8(_) => ElementType::Int8,
            Embedding::UInt8(_) => ElementType::UInt8,
            Embedding::Int16(_) => ElementType::Int16,
            Embedding::UInt16(_) => ElementType::UInt16,
            Embedding::Int32(_) => ElementType::Int32,
            Embedding::UInt32(_) => ElementType::UInt32,
            Embedding::Int64(_) => ElementType::Int64,
            Embedding::UInt64(_) => ElementType::UInt64,
            Embedding::Int128(_) => ElementType::Int128,
            Embedding::UInt128(_) => ElementType::UInt128,
            Embedding::Float16(_) => ElementType::Float16,
            Embedding::Float32(_) => ElementType::Float32,
            Embedding::Float64(_) => ElementType::Float64,
            Embedding::BigFloat(_) => ElementType::BigFloat,
        }
    }

    /// Borrow the values as `T` if this vector holds `T`
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice_of(self)
    }

    /// Coerce into `f64` for distance computation
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_values!(self, v => v.iter().map(|x| x.to_f64()).collect())
    }

    /// Exact lift of every element into the pivot domain
    pub fn to_big_vec(&self) -> Vec<BigFloat> {
        with_values!(self, v => v.iter().map(|x| x.to_big()).collect())
    }

    /// Exact conversion to element type `T`
    ///
    /// Fails with `TypeMismatch` naming the first element that cannot be
    /// represented exactly in `T`.
    pub fn to_values<T: Element>(&self) -> EmbedResult<Vec<T>> {
        if let Some(same) = T::slice_of(self) {
            return Ok(same.to_vec());
        }
        with_values!(self, v => convert_values::<_, T>(v.as_slice()))
    }

    /// Exact conversion to the given element type
    pub fn convert_to(&self, target: ElementType) -> EmbedResult<Embedding> {
        if self.element_type() == target {
            return Ok(self.clone());
        }
        Ok(match target {
            ElementType::Int8 => Embedding::Int8(self.to_values()?),
            ElementType::UInt8 => Embedding::UInt8(self.to_values()?),
            ElementType::Int16 => Embedding::Int16(self.to_values()?),
            ElementType::UInt16 => Embedding::UInt16(self.to_values()?),
            ElementType::Int32 => Embedding::Int32(self.to_values()?),
            ElementType::UInt32 => Embedding::UInt32(self.to_values()?),
            ElementType::Int64 => Embedding::Int64(self.to_values()?),
            ElementType::UInt64 => Embedding::UInt64(self.to_values()?),
            ElementType::Int128 => Embedding::Int128(self.to_values()?),
            ElementType::UInt128 => Embedding::UInt128(self.to_values()?),
            ElementType::Float16 => Embedding::Float16(self.to_values()?),
            ElementType::Float32 => Embedding::Float32(self.to_values()?),
            ElementType::Float64 => Embedding::Float64(self.to_values()?),
            ElementType::BigFloat => Embedding::BigFloat(self.to_values()?),
        })
    }
}

fn convert_values<S: Element, T: Element>(values: &[S]) -> EmbedResult<Vec<T>> {
    values
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            T::from_big(&x.to_big()).ok_or_else(|| {
                EmbedError::type_mismatch(format!(
                    "element {} ({:?} as {}) is not exactly representable as {}",
                    i,
                    x,
                    S::TYPE,
                    T::TYPE
                ))
            })
        })
        .collect()
}

macro_rules! slice_and_wrap {
    ($t:ty, $variant:ident) => {
        fn slice_of(embedding: &Embedding) -> Option<&[$t]> {
            match embedding {
                Embedding::$variant(v) => Some(v.as_slice()),
                _ => None,
            }
        }

        fn into_embedding(values: Vec<$t>) -> Embedding {
            Embedding::$variant(values)
        }
    };
}

macro_rules! signed_element {
    ($t:ty, $variant:ident, $write:ident, $read:ident) => {
        impl Element for $t {
            const TYPE: ElementType = ElementType::$variant;

            fn to_big(self) -> BigFloat {
                BigFloat::from_i128(self as i128)
            }

            fn from_big(value: &BigFloat) -> Option<Self> {
                value.to_i128().and_then(|v| <$t>::try_from(v).ok())
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn write_le(self, buf: &mut [u8]) {
                LittleEndian::$write(buf, self)
            }

            fn read_le(buf: &[u8]) -> Option<Self> {
                Some(LittleEndian::$read(buf))
            }

            slice_and_wrap!($t, $variant);
        }
    };
}

macro_rules! unsigned_element {
    ($t:ty, $variant:ident, $write:ident, $read:ident) => {
        impl Element for $t {
            const TYPE: ElementType = ElementType::$variant;

            fn to_big(self) -> BigFloat {
                BigFloat::from_u128(self as u128)
            }

            fn from_big(value: &BigFloat) -> Option<Self> {
                value.to_u128().and_then(|v| <$t>::try_from(v).ok())
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn write_le(self, buf: &mut [u8]) {
                LittleEndian::$write(buf, self)
            }

            fn read_le(buf: &[u8]) -> Option<Self> {
                Some(LittleEndian::$read(buf))
            }

            slice_and_wrap!($t, $variant);
        }
    };
}

signed_element!(i16, Int16, write_i16, read_i16);
signed_element!(i32, Int32, write_i32, read_i32);
signed_element!(i64, Int64, write_i64, read_i64);
signed_element!(i128, Int128, write_i128, read_i128);
unsigned_element!(u16, UInt16, write_u16, read_u16);
unsigned_element!(u32, UInt32, write_u32, read_u32);
unsigned_element!(u64, UInt64, write_u64, read_u64);
unsigned_element!(u128, UInt128, write_u128, read_u128);

impl Element for i8 {
    const TYPE: ElementType = ElementType::Int8;

    fn to_big(self) -> BigFloat {
        BigFloat::from_i128(self as i128)
    }

    fn from_big(value: &BigFloat) -> Option<Self> {
        value.to_i128().and_then(|v| i8::try_from(v).ok())
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn write_le(self, buf: &mut [u8]) {
        buf[0] = self as u8;
    }

    fn read_le(buf: &[u8]) -> Option<Self> {
        Some(buf[0] as i8)
    }

    slice_and_wrap!(i8, Int8);
}

impl Element for u8 {
    const TYPE: ElementType = ElementType::UInt8;

    fn to_big(self) -> BigFloat {
        BigFloat::from_u128(self as u128)
    }

    fn from_big(value: &BigFloat) -> Option<Self> {
        value.to_u128().and_then(|v| u8::try_from(v).ok())
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn write_le(self, buf: &mut [u8]) {
        buf[0] = self;
    }

    fn read_le(buf: &[u8]) -> Option<Self> {
        Some(buf[0])
    }

    slice_and_wrap!(u8, UInt8);
}

impl Element for f16 {
    const TYPE: ElementType = ElementType::Float16;

    fn to_big(self) -> BigFloat {
        BigFloat::from_f64(self.to_f64())
    }

    fn from_big(value: &BigFloat) -> Option<Self> {
        let candidate = f16::from_f64(value.to_f64());
        (BigFloat::from_f64(candidate.to_f64()) == *value).then_some(candidate)
    }

    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    fn write_le(self, buf: &mut [u8]) {
        LittleEndian::write_u16(buf, self.to_bits())
    }

    fn read_le(buf: &[u8]) -> Option<Self> {
        Some(f16::from_bits(LittleEndian::read_u16(buf)))
    }

    slice_and_wrap!(f16, Float16);
}

impl Element for f32 {
    const TYPE: ElementType = ElementType::Float32;

    fn to_big(self) -> BigFloat {
        BigFloat::from_f64(self as f64)
    }

    fn from_big(value: &BigFloat) -> Option<Self> {
        let candidate = value.to_f64() as f32;
        (BigFloat::from_f64(candidate as f64) == *value).then_some(candidate)
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn write_le(self, buf: &mut [u8]) {
        LittleEndian::write_f32(buf, self)
    }

    fn read_le(buf: &[u8]) -> Option<Self> {
        Some(LittleEndian::read_f32(buf))
    }

    slice_and_wrap!(f32, Float32);
}

impl Element for f64 {
    const TYPE: ElementType = ElementType::Float64;

    fn to_big(self) -> BigFloat {
        BigFloat::from_f64(self)
    }

    fn from_big(value: &BigFloat) -> Option<Self> {
        let candidate = value.to_f64();
        (BigFloat::from_f64(candidate) == *value).then_some(candidate)
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn write_le(self, buf: &mut [u8]) {
        LittleEndian::write_f64(buf, self)
    }

    fn read_le(buf: &[u8]) -> Option<Self> {
        Some(LittleEndian::read_f64(buf))
    }

    slice_and_wrap!(f64, Float64);
}

impl Element for BigFloat {
    const TYPE: ElementType = ElementType::BigFloat;

    fn to_big(self) -> BigFloat {
        self
    }

    fn from_big(value: &BigFloat) -> Option<Self> {
        Some(*value)
    }

    fn to_f64(self) -> f64 {
        BigFloat::to_f64(&self)
    }

    fn write_le(self, buf: &mut [u8]) {
        buf.copy_from_slice(&self.to_le_bytes())
    }

    fn read_le(buf: &[u8]) -> Option<Self> {
        let bytes: &[u8; BIGFLOAT_WIDTH] = buf.try_into().ok()?;
        BigFloat::from_le_bytes(bytes)
    }

    slice_and_wrap!(BigFloat, BigFloat);
}

impl<T: Element> From<Vec<T>> for Embedding {
    fn from(values: Vec<T>) -> Self {
        T::into_embedding(values)
    }
}

impl<T: Element> From<&[T]> for Embedding {
    fn from(values: &[T]) -> Self {
        T::into_embedding(values.to_vec())
    }
}
