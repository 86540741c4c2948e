//! Embedding payload codec and type registry
//!
//! Payloads are flat arrays of fixed-width little-endian elements with no
//! header: `payload.len() == vector.len() * width`. The element type travels
//! next to the payload (the storage collaborator keeps it in its own column),
//! so decoding always needs the type name and the expected length.
//!
//! ## Payload Layout
//!
//! ```text
//! int8/uint8         1 byte
//! int16/uint16       2 bytes LE
//! float16            2 bytes LE (IEEE-754 binary16 bits)
//! int32/uint32       4 bytes LE
//! float32            4 bytes LE
//! int64/uint64       8 bytes LE
//! float64            8 bytes LE
//! int128/uint128    16 bytes LE
//! bigfloat          41 bytes: [flags u8][exponent i64 LE][mantissa lo u128 LE][mantissa hi u128 LE]
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::bigfloat::BigFloat;
use crate::embedding::{Element, Embedding};
use crate::error::{EmbedError, EmbedResult};
use crate::types::{ElementType, NumericDomain};
use half::f16;

/// Encodes a vector into a payload of the registered type
pub type EncodeFn = fn(&Embedding) -> EmbedResult<Vec<u8>>;

/// Decodes a payload whose length is a multiple of the element width
pub type DecodeFn = fn(&[u8]) -> EmbedResult<Embedding>;

/// Registry entry for one element type
#[derive(Clone, Copy)]
pub struct TypeSpec {
    /// Element type
    pub element_type: ElementType,
    /// Registered (lower-case) name
    pub name: &'static str,
    /// Bytes per element
    pub width: usize,
    /// Numeric domain
    pub domain: NumericDomain,
    /// Encoder (exact conversion, then LE serialization)
    pub encode_fn: EncodeFn,
    /// Decoder
    pub decode_fn: DecodeFn,
}

impl TypeSpec {
    fn of<T: Element>() -> Self {
        TypeSpec {
            element_type: T::TYPE,
            name: T::TYPE.name(),
            width: T::TYPE.width(),
            domain: T::TYPE.domain(),
            encode_fn: encode_as::<T>,
            decode_fn: decode_as::<T>,
        }
    }

    /// Encode `vector` as this type
    pub fn encode(&self, vector: &Embedding) -> EmbedResult<Vec<u8>> {
        (self.encode_fn)(vector)
    }

    /// Decode `payload` as this type, checking its length
    pub fn decode(&self, payload: &[u8], expected_length: usize) -> EmbedResult<Embedding> {
        if payload.len() % self.width != 0 {
            return Err(EmbedError::corrupt_payload(format!(
                "{} bytes is not a multiple of the {} element width ({})",
                payload.len(),
                self.name,
                self.width
            )));
        }
        let count = payload.len() / self.width;
        if count != expected_length {
            return Err(EmbedError::corrupt_payload(format!(
                "payload holds {} {} elements, expected {}",
                count, self.name, expected_length
            )));
        }
        (self.decode_fn)(payload)
    }
}

impl std::fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeSpec")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("domain", &self.domain)
            .finish()
    }
}

static REGISTRY: Lazy<BTreeMap<&'static str, TypeSpec>> = Lazy::new(|| {
    [
        TypeSpec::of::<i8>(),
        TypeSpec::of::<u8>(),
        TypeSpec::of::<i16>(),
        TypeSpec::of::<u16>(),
        TypeSpec::of::<i32>(),
        TypeSpec::of::<u32>(),
        TypeSpec::of::<i64>(),
        TypeSpec::of::<u64>(),
        TypeSpec::of::<i128>(),
        TypeSpec::of::<u128>(),
        TypeSpec::of::<f16>(),
        TypeSpec::of::<f32>(),
        TypeSpec::of::<f64>(),
        TypeSpec::of::<BigFloat>(),
    ]
    .into_iter()
    .map(|spec| (spec.name, spec))
    .collect()
});

fn encode_as<T: Element>(vector: &Embedding) -> EmbedResult<Vec<u8>> {
    let width = T::TYPE.width();
    let values = vector.to_values::<T>()?;
    let mut out = vec![0u8; values.len() * width];
    for (chunk, value) in out.chunks_exact_mut(width).zip(values) {
        value.write_le(chunk);
    }
    Ok(out)
}

fn decode_as<T: Element>(payload: &[u8]) -> EmbedResult<Embedding> {
    let width = T::TYPE.width();
    let values = payload
        .chunks_exact(width)
        .enumerate()
        .map(|(i, chunk)| {
            T::read_le(chunk).ok_or_else(|| {
                EmbedError::corrupt_payload(format!(
                    "element {} is not a valid {} encoding",
                    i,
                    T::TYPE
                ))
            })
        })
        .collect::<EmbedResult<Vec<T>>>()?;
    Ok(T::into_embedding(values))
}

/// Look up a registered type (case-insensitive)
///
/// Fails with `UnsupportedType` for unknown names.
pub fn resolve(type_name: &str) -> EmbedResult<&'static TypeSpec> {
    REGISTRY
        .get(type_name.to_ascii_lowercase().as_str())
        .ok_or_else(|| EmbedError::unsupported_type(type_name))
}

/// Registry entry for an already-parsed element type
pub fn spec_for(element_type: ElementType) -> &'static TypeSpec {
    &REGISTRY[element_type.name()]
}

/// Sorted names of all registered element types
pub fn list_supported_types() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}

/// Encode `vector` into a payload of `type_name`
///
/// Every element must be exactly representable in the target type, otherwise
/// `TypeMismatch` is returned and nothing is produced.
pub fn encode(vector: &Embedding, type_name: &str) -> EmbedResult<Vec<u8>> {
    resolve(type_name)?.encode(vector)
}

/// Decode a payload of `type_name` holding exactly `expected_length` elements
pub fn decode(payload: &[u8], type_name: &str, expected_length: usize) -> EmbedResult<Embedding> {
    resolve(type_name)?.decode(payload, expected_length)
}

/// Registered type name matching the vector's element representation
pub fn infer_type(vector: &Embedding) -> &'static str {
    vector.element_type().name()
}
