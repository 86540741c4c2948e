//! Tier 2: Distance Metrics

use embedstore::{cosine, distance, euclidean, list_supported_metrics, EmbedError, Embedding};
use proptest::prelude::*;

#[test]
fn tier2_builtin_metrics_listed() {
    assert_eq!(list_supported_metrics(), vec!["cosine", "euclidean"]);
}

#[test]
fn tier2_coerced_integer_vectors() {
    let a = Embedding::Int128(vec![i128::MAX, 0]).to_f64_vec();
    let b = Embedding::Int128(vec![i128::MIN, 0]).to_f64_vec();
    let d = euclidean(&a, &b).unwrap();
    assert!(d.is_finite());
    assert!((d / 2f64.powi(128) - 1.0).abs() < 1e-12);
}

#[test]
fn tier2_cosine_scale_invariant() {
    let a = [1e-200, 2e-200, 3e-200];
    let b = [1e200, 2e200, 3e200];
    assert!(cosine(&a, &b).unwrap().abs() < 1e-12);
}

#[test]
fn tier2_zero_norm_propagates() {
    let err = distance(&[0.0, 0.0], &[0.0, 1.0], "cosine").unwrap_err();
    assert!(matches!(err, EmbedError::DegenerateVector { .. }));
}

fn pair() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..24).prop_flat_map(|n| {
        (
            prop::collection::vec(-1e3f64..1e3, n),
            prop::collection::vec(-1e3f64..1e3, n),
        )
    })
}

proptest! {
    #[test]
    fn tier2_euclidean_identity_and_symmetry((a, b) in pair()) {
        prop_assert_eq!(distance(&a, &a, "euclidean").unwrap(), 0.0);
        prop_assert_eq!(
            distance(&a, &b, "euclidean").unwrap(),
            distance(&b, &a, "euclidean").unwrap()
        );
    }

    #[test]
    fn tier2_cosine_bounded((a, b) in pair()) {
        prop_assume!(a.iter().any(|x| *x != 0.0) && b.iter().any(|x| *x != 0.0));
        let d = distance(&a, &b, "cosine").unwrap();
        prop_assert!((0.0..=2.0).contains(&d));
    }
}
