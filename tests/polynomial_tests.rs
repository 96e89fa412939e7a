mod common;

use common::{counts, graph_state_optimum};
use merminforge::codec::{PackedCoefficients, Variant};
use merminforge::error::MerminError;
use merminforge::hypergraph::HypergraphState;
use merminforge::polynomial::operator::{expectation, to_complex};
use merminforge::polynomial::*;
use rstest::rstest;
use std::collections::BTreeMap;
use std::f64::consts::SQRT_2;

#[rstest]
#[case(&[("00", 50), ("11", 50)], 100, 0, 1.0)]
#[case(&[("01", 30), ("10", 10)], 0, 40, -1.0)]
#[case(&[("000", 10), ("011", 10), ("001", 20)], 20, 20, 0.0)]
fn test_parity_breakdown(
    #[case] pairs: &[(&str, u64)],
    #[case] even: u64,
    #[case] odd: u64,
    #[case] expected: f64,
) {
    let breakdown = measures_exploitation(&counts(pairs));
    assert_eq!(breakdown.even, even);
    assert_eq!(breakdown.odd, odd);
    assert_eq!(breakdown.total, even + odd);
    assert!((breakdown.expectation().unwrap() - expected).abs() < 1e-12);
}

#[test]
fn test_empty_counts_are_an_empty_sample() {
    let breakdown = measures_exploitation(&counts(&[]));
    assert!(matches!(breakdown.expectation(), Err(MerminError::EmptySample)));
}

#[test]
fn test_chsh_like_polynomial_on_correlated_counts() {
    let poly = MerminPolynomial::from_coefficients(2, vec![1.0, 0.0, 0.0, -1.0]).unwrap();
    assert_eq!(poly.required_settings(), vec![0, 3]);

    let mut batches = BTreeMap::new();
    batches.insert(0, counts(&[("00", 50), ("11", 50)]));
    batches.insert(3, counts(&[("00", 25), ("01", 25), ("10", 25), ("11", 25)]));
    let value = evaluate_polynomial(&poly, &batches).unwrap();
    assert!((value - 1.0).abs() < 1e-12);
}

#[test]
fn test_missing_setting_is_reported() {
    let poly = MerminPolynomial::from_coefficients(2, vec![1.0, 0.0, 0.0, -1.0]).unwrap();
    let mut batches = BTreeMap::new();
    batches.insert(0, counts(&[("00", 1)]));
    assert!(matches!(
        evaluate_polynomial(&poly, &batches),
        Err(MerminError::Validation(_))
    ));
}

#[test]
fn test_empty_batch_propagates() {
    let poly = MerminPolynomial::new(2, Variant::Unprimed).unwrap();
    let batches: BTreeMap<usize, _> = poly
        .required_settings()
        .into_iter()
        .map(|s| (s, counts(&[])))
        .collect();
    assert!(matches!(
        evaluate_polynomial(&poly, &batches),
        Err(MerminError::EmptySample)
    ));
}

#[test]
fn test_from_coefficients_checks_length() {
    assert!(matches!(
        MerminPolynomial::from_coefficients(2, vec![1.0, 0.0, 0.0]),
        Err(MerminError::ShapeMismatch { expected: 4, actual: 3 })
    ));
}

#[test]
fn test_dense_expectation() {
    // <Z0 Z1> on perfectly correlated counts is 1, so I - Z0Z1 gives 0.
    let c = counts(&[("00", 50), ("11", 50)]);
    let v = evaluate_expectation(&[1.0, 0.0, 0.0, -1.0], &c).unwrap();
    assert!(v.abs() < 1e-12);

    // <Z0> reads the right-most character.
    let c = counts(&[("01", 100)]);
    let v = evaluate_expectation(&[0.0, 1.0, 0.0, 0.0], &c).unwrap();
    assert!((v + 1.0).abs() < 1e-12);
    let v = evaluate_expectation(&[0.0, 0.0, 1.0, 0.0], &c).unwrap();
    assert!((v - 1.0).abs() < 1e-12);
}

#[test]
fn test_dense_expectation_rejects_bad_input() {
    let c = counts(&[("00", 1)]);
    assert!(evaluate_expectation(&[1.0, 0.0, 0.0], &c).is_err());
    assert!(matches!(
        evaluate_expectation(&[1.0, 0.0], &c),
        Err(MerminError::ShapeMismatch { expected: 1, actual: 2 })
    ));
    assert!(matches!(
        evaluate_expectation(&[1.0, 0.0, 0.0, 1.0], &counts(&[])),
        Err(MerminError::EmptySample)
    ));
}

#[rstest]
#[case("0", 0b1, 1.0)]
#[case("1", 0b1, -1.0)]
#[case("10", 0b01, 1.0)]
#[case("10", 0b10, -1.0)]
#[case("110", 0b111, 1.0)]
#[case("111", 0b101, 1.0)]
#[case("111", 0b111, -1.0)]
fn test_evaluate_monomial(#[case] bits: &str, #[case] mask: usize, #[case] expected: f64) {
    let value = evaluate_monomial(bits, &Monomial::from_mask(mask)).unwrap();
    assert_eq!(value, expected);
}

#[test]
fn test_monomial_wider_than_outcome() {
    assert!(evaluate_monomial("01", &Monomial::full(3).unwrap()).is_err());
    assert!(evaluate_monomial("0a", &Monomial::full(2).unwrap()).is_err());
    assert!(Monomial::full(3).unwrap().contains(2));
    assert!(!Monomial::from_mask(0b10).contains(0));
}

#[test]
fn test_parse_outcome_is_little_endian() {
    assert_eq!(parse_outcome("001").unwrap(), 1);
    assert_eq!(parse_outcome("100").unwrap(), 4);
    assert!(parse_outcome("").is_err());
}

#[rstest]
#[case(1, vec![1.0, 0.0])]
#[case(2, vec![0.5, 0.5, 0.5, -0.5])]
#[case(3, vec![0.0, 0.5, 0.5, 0.0, 0.5, 0.0, 0.0, -0.5])]
fn test_mermin_coefficients(#[case] n: usize, #[case] expected: Vec<f64>) {
    assert_eq!(mermin_coefficients(n), expected);
}

#[test]
fn test_primed_polynomial_is_reversed() {
    let m = MerminPolynomial::new(3, Variant::Unprimed).unwrap();
    let mp = MerminPolynomial::new(3, Variant::Primed).unwrap();
    let reversed: Vec<f64> = m.coefficients().iter().rev().copied().collect();
    assert_eq!(mp.coefficients(), reversed.as_slice());
    assert_eq!(mp.variant(), Variant::Primed);
    assert_eq!(m.required_settings(), vec![1, 2, 4, 7]);
    assert_eq!(mp.required_settings(), vec![0, 3, 5, 6]);
}

#[test]
fn test_setting_variants_msb_first() {
    use Variant::*;
    assert_eq!(setting_variants(1, 3).unwrap(), vec![Unprimed, Unprimed, Primed]);
    assert_eq!(setting_variants(6, 3).unwrap(), vec![Primed, Primed, Unprimed]);
    assert!(setting_variants(8, 3).is_err());
}

#[rstest]
#[case(MuKind::Absolute, -0.5, 3.0, 0.5)]
#[case(MuKind::SumOfSquares, -0.5, 1.0, 1.25)]
fn test_mu_kind_combine(#[case] kind: MuKind, #[case] m: f64, #[case] mp: f64, #[case] mu: f64) {
    assert!((kind.combine(m, mp) - mu).abs() < 1e-12);
}

#[test]
fn test_graph_state_reaches_quantum_bound() {
    let state = HypergraphState::from_pattern(2, 1).unwrap();
    let psi = to_complex(&state.ideal_state_vector());
    let poly = MerminPolynomial::new(2, Variant::Unprimed).unwrap();
    let value = expectation(&poly, &graph_state_optimum(), &psi).unwrap();
    assert!((value.abs() - SQRT_2).abs() < 1e-9, "got {}", value);
}

#[test]
fn test_product_state_stays_classical() {
    // Pattern 0 is |+>^3; with every observable along X the polynomial gives 1.
    let state = HypergraphState::from_pattern(3, 0).unwrap();
    let psi = to_complex(&state.ideal_state_vector());
    let x_everywhere = PackedCoefficients {
        a: vec![[1.0, 0.0, 0.0]; 3],
        a_prime: vec![[1.0, 0.0, 0.0]; 3],
    };
    let poly = MerminPolynomial::new(3, Variant::Unprimed).unwrap();
    let value = expectation(&poly, &x_everywhere, &psi).unwrap();
    assert!((value - 1.0).abs() < 1e-9);
}

#[test]
fn test_expectation_shape_checks() {
    let state = HypergraphState::from_pattern(2, 1).unwrap();
    let psi = to_complex(&state.ideal_state_vector());
    let poly = MerminPolynomial::new(3, Variant::Unprimed).unwrap();
    assert!(matches!(
        expectation(&poly, &graph_state_optimum(), &psi),
        Err(MerminError::ShapeMismatch { expected: 18, actual: 12 })
    ));
}

#[rstest]
#[case(0)]
#[case(21)]
#[case(64)]
#[case(usize::MAX)]
fn test_full_monomial_outside_register_limits(#[case] qubits: usize) {
    assert!(matches!(Monomial::full(qubits), Err(MerminError::Validation(_))));
}

#[test]
fn test_monomial_contains_ignores_wide_indices() {
    let m = Monomial::from_mask(usize::MAX);
    assert!(m.contains(63));
    assert!(!m.contains(64));
    assert!(!m.contains(usize::MAX));
}
