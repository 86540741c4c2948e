//! Core types for embedstore
//!
//! This crate defines the foundational types used throughout the system:
//! - ElementType: the fourteen registered element types and their domains
//! - BigFloat: 256-bit mantissa binary float, the exact conversion pivot
//! - Embedding: typed vector with exact cross-type conversion
//! - Codec: type registry plus fixed-width little-endian payload encoding
//! - Traits: storage collaborator interfaces (EmbeddingSource, EmbeddingSink)
//! - Error: EmbedError and the EmbedResult alias

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bigfloat;
pub mod codec;
pub mod embedding;
pub mod error;
pub mod limits;
pub mod traits;
pub mod types;

pub use bigfloat::{BigFloat, FloatClass, BIGFLOAT_PRECISION, BIGFLOAT_WIDTH};
pub use codec::{
    decode, encode, infer_type, list_supported_types, resolve, spec_for, DecodeFn, EncodeFn,
    TypeSpec,
};
pub use embedding::{Element, Embedding};
pub use error::{CollaboratorSource, EmbedError, EmbedResult};
pub use limits::{check_bulk_limit, DEFAULT_BATCH_SIZE, DEFAULT_BULK_LIMIT, DEFAULT_TOP_K};
pub use traits::{
    DatabaseMeta, Direction, EmbeddingRecord, EmbeddingSink, EmbeddingSource, RawEmbedding,
};
pub use types::{ElementType, NumericDomain};

pub use half::f16;
