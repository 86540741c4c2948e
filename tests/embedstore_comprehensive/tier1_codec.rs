//! Tier 1: Codec
//!
//! Round-trip law, payload length invariant, and exactness enforcement
//! through the public API.

use embedstore::{
    decode, encode, infer_type, list_supported_types, resolve, BigFloat, EmbedError, Embedding,
    ElementType, f16,
};
use proptest::prelude::*;

#[test]
fn tier1_fourteen_registered_types() {
    let names = list_supported_types();
    assert_eq!(names.len(), 14);
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    for name in &names {
        let spec = resolve(name).unwrap();
        assert_eq!(spec.name, *name);
        assert_eq!(spec.width, spec.element_type.width());
    }
}

#[test]
fn tier1_unknown_type() {
    let err = resolve("float8").unwrap_err();
    assert!(matches!(err, EmbedError::UnsupportedType { .. }));
    let err = encode(&Embedding::Int8(vec![1]), "decimal").unwrap_err();
    assert!(matches!(err, EmbedError::UnsupportedType { .. }));
}

#[test]
fn tier1_fractional_into_integer_rejected() {
    let err = encode(&Embedding::Float64(vec![1.0, 2.5]), "int32").unwrap_err();
    assert!(matches!(err, EmbedError::TypeMismatch { .. }));
}

#[test]
fn tier1_out_of_range_rejected() {
    let err = encode(&Embedding::Int16(vec![300]), "int8").unwrap_err();
    assert!(matches!(err, EmbedError::TypeMismatch { .. }));
    let err = encode(&Embedding::Int8(vec![-1]), "uint64").unwrap_err();
    assert!(matches!(err, EmbedError::TypeMismatch { .. }));
}

#[test]
fn tier1_exact_cross_type_encoding_accepted() {
    let payload = encode(&Embedding::Float64(vec![1.0, -2.0]), "int16").unwrap();
    assert_eq!(payload, vec![1, 0, 0xfe, 0xff]);
    let back = decode(&payload, "int16", 2).unwrap();
    assert_eq!(back, Embedding::Int16(vec![1, -2]));
}

#[test]
fn tier1_float_narrowing_must_be_exact() {
    assert!(encode(&Embedding::Float64(vec![0.5]), "float16").is_ok());
    let err = encode(&Embedding::Float64(vec![0.1]), "float32").unwrap_err();
    assert!(matches!(err, EmbedError::TypeMismatch { .. }));
}

#[test]
fn tier1_bigfloat_holds_u128_max() {
    let v = Embedding::UInt128(vec![u128::MAX, 0, 1]);
    let payload = encode(&v, "bigfloat").unwrap();
    assert_eq!(payload.len(), 3 * 41);
    let back = decode(&payload, "bigfloat", 3).unwrap();
    assert_eq!(back.convert_to(ElementType::UInt128).unwrap(), v);
}

#[test]
fn tier1_bad_payload_lengths() {
    let err = decode(&[0u8; 7], "float32", 2).unwrap_err();
    assert!(matches!(err, EmbedError::CorruptPayload { .. }));
    let err = decode(&[0u8; 8], "float32", 3).unwrap_err();
    assert!(matches!(err, EmbedError::CorruptPayload { .. }));
}

#[test]
fn tier1_infer_type_matches_variant() {
    assert_eq!(infer_type(&Embedding::Float16(vec![f16::ONE])), "float16");
    assert_eq!(infer_type(&Embedding::BigFloat(vec![BigFloat::ZERO])), "bigfloat");
    assert_eq!(infer_type(&Embedding::Int128(vec![])), "int128");
}

proptest! {
    #[test]
    fn tier1_int32_round_trip(v in prop::collection::vec(any::<i32>(), 0..64)) {
        let e = Embedding::Int32(v.clone());
        let payload = encode(&e, "int32").unwrap();
        prop_assert_eq!(payload.len(), v.len() * 4);
        prop_assert_eq!(decode(&payload, "int32", v.len()).unwrap(), e);
    }

    #[test]
    fn tier1_float64_round_trip_bitwise(bits in prop::collection::vec(any::<u64>(), 0..32)) {
        let values: Vec<f64> = bits.iter().map(|b| f64::from_bits(*b)).collect();
        let payload = encode(&Embedding::Float64(values), "float64").unwrap();
        let back = decode(&payload, "float64", bits.len()).unwrap();
        let back_bits: Vec<u64> = back.as_slice::<f64>().unwrap().iter().map(|x| x.to_bits()).collect();
        prop_assert_eq!(back_bits, bits);
    }

    #[test]
    fn tier1_payload_not_multiple_of_width_fails(extra in 1usize..8, n in 0usize..8) {
        let payload = vec![0u8; n * 8 + extra];
        let err = decode(&payload, "int64", n).unwrap_err();
        let is_corrupt = matches!(err, EmbedError::CorruptPayload { .. });
        prop_assert!(is_corrupt);
    }
}
