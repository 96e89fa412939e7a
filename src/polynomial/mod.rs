pub mod operator;

use crate::codec::Variant;
use crate::error::{MerminError, MfResult};
use crate::executor::MeasurementCounts;
use crate::hypergraph::{check_qubits, convert_to_binary, MAX_QUBITS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::warn;

/// How the violation is read off the polynomial expectation values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MuKind {
    /// `|<M_n>|`
    Absolute,
    /// `<M_n>^2 + <M'_n>^2`
    SumOfSquares,
}

impl MuKind {
    pub fn needs_primed(self) -> bool {
        matches!(self, MuKind::SumOfSquares)
    }

    pub fn combine(self, unprimed: f64, primed: f64) -> f64 {
        match self {
            MuKind::Absolute => unprimed.abs(),
            MuKind::SumOfSquares => unprimed * unprimed + primed * primed,
        }
    }
}

/// Monomial coefficients of the Mermin polynomial:
/// `M_1 = [1, 0]`, `M_n = (M_{n-1} (x) [1, 1] + rev(M_{n-1}) (x) [1, -1]) / 2`.
pub fn mermin_coefficients(qubits: usize) -> Vec<f64> {
    let mut m = vec![1.0, 0.0];
    for _ in 1..qubits {
        let reversed: Vec<f64> = m.iter().rev().copied().collect();
        m = m
            .iter()
            .zip(reversed.iter())
            .flat_map(|(&fwd, &rev)| [0.5 * (fwd + rev), 0.5 * (fwd - rev)])
            .collect();
    }
    m
}

/// Observable family per qubit for monomial `index`: character `k` of the
/// `qubits`-bit expansion picks `a` (`0`) or `a'` (`1`) for qubit `k`.
pub fn setting_variants(index: usize, qubits: usize) -> MfResult<Vec<Variant>> {
    Ok(convert_to_binary(index as u128, qubits)?
        .chars()
        .map(|c| {
            if c == '1' {
                Variant::Primed
            } else {
                Variant::Unprimed
            }
        })
        .collect())
}

/// A polynomial over the `2^N` measurement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerminPolynomial {
    qubits: usize,
    variant: Variant,
    coefficients: Vec<f64>,
}

impl MerminPolynomial {
    pub fn new(qubits: usize, variant: Variant) -> MfResult<Self> {
        check_qubits(qubits)?;
        let mut coefficients = mermin_coefficients(qubits);
        if variant == Variant::Primed {
            coefficients.reverse();
        }
        Ok(Self {
            qubits,
            variant,
            coefficients,
        })
    }

    /// Arbitrary setting coefficients, e.g. a CHSH-style combination.
    pub fn from_coefficients(qubits: usize, coefficients: Vec<f64>) -> MfResult<Self> {
        check_qubits(qubits)?;
        let expected = 1usize << qubits;
        if coefficients.len() != expected {
            return Err(MerminError::ShapeMismatch {
                expected,
                actual: coefficients.len(),
            });
        }
        Ok(Self {
            qubits,
            variant: Variant::Unprimed,
            coefficients,
        })
    }

    pub fn qubits(&self) -> usize {
        self.qubits
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// `(setting, coefficient)` for every non-zero coefficient.
    pub fn terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.coefficients
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, c)| *c != 0.0)
    }

    pub fn required_settings(&self) -> Vec<usize> {
        self.terms().map(|(i, _)| i).collect()
    }
}

/// A product of `Z` outcomes over the qubits in `mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Monomial {
    mask: usize,
}

impl Monomial {
    pub fn from_mask(mask: usize) -> Self {
        Self { mask }
    }

    /// All of `qubits`; every Mermin monomial has this shape.
    pub fn full(qubits: usize) -> MfResult<Self> {
        check_qubits(qubits)?;
        Ok(Self {
            mask: (1usize << qubits) - 1,
        })
    }

    pub fn mask(&self) -> usize {
        self.mask
    }

    pub fn contains(&self, qubit: usize) -> bool {
        qubit < usize::BITS as usize && self.mask & (1 << qubit) != 0
    }

    /// `+1` or `-1` for the outcome encoded as a basis index.
    #[inline(always)]
    pub fn sign(&self, outcome: usize) -> f64 {
        if (outcome & self.mask).count_ones() % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }
}

/// Basis index of a measured bit-string. The right-most character is qubit 0.
pub fn parse_outcome(bitstring: &str) -> MfResult<usize> {
    if bitstring.is_empty() || bitstring.len() > MAX_QUBITS {
        return Err(MerminError::Validation(format!(
            "outcome '{}' must hold 1..={} bits",
            bitstring, MAX_QUBITS
        )));
    }
    bitstring.chars().try_fold(0usize, |acc, c| match c {
        '0' => Ok(acc << 1),
        '1' => Ok((acc << 1) | 1),
        other => Err(MerminError::Validation(format!(
            "outcome '{}' contains '{}'",
            bitstring, other
        ))),
    })
}

/// Product of `(-1)^bit` over the monomial's qubits.
pub fn evaluate_monomial(bitstring: &str, monomial: &Monomial) -> MfResult<f64> {
    let outcome = parse_outcome(bitstring)?;
    if monomial.mask >> bitstring.len() != 0 {
        return Err(MerminError::Validation(format!(
            "monomial reaches past the {} measured qubits",
            bitstring.len()
        )));
    }
    Ok(monomial.sign(outcome))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParityBreakdown {
    pub even: u64,
    pub odd: u64,
    pub total: u64,
}

impl ParityBreakdown {
    /// `(even - odd) / total`.
    pub fn expectation(&self) -> MfResult<f64> {
        if self.total == 0 {
            return Err(MerminError::EmptySample);
        }
        Ok((self.even as f64 - self.odd as f64) / self.total as f64)
    }
}

/// Splits counts by the parity of the number of `1`s in each outcome.
pub fn measures_exploitation(counts: &MeasurementCounts) -> ParityBreakdown {
    counts
        .iter()
        .fold(ParityBreakdown::default(), |mut acc, (outcome, n)| {
            if outcome.chars().filter(|&c| c == '1').count() % 2 == 0 {
                acc.even += n;
            } else {
                acc.odd += n;
            }
            acc.total += n;
            acc
        })
}

/// `sum_i c_i * <parity>_i` over the non-zero terms, each read from the counts
/// measured in setting `i`.
pub fn evaluate_polynomial(
    polynomial: &MerminPolynomial,
    counts_by_setting: &BTreeMap<usize, MeasurementCounts>,
) -> MfResult<f64> {
    let mut total = 0.0;
    for (setting, coefficient) in polynomial.terms() {
        let counts = counts_by_setting.get(&setting).ok_or_else(|| {
            MerminError::Validation(format!("no counts for measurement setting {}", setting))
        })?;
        total += coefficient * measures_exploitation(counts).expectation()?;
    }
    Ok(total)
}

/// Single-batch expectation of a dense Z-string operator: `coefficients[m]`
/// weighs the parity of the qubits in mask `m`.
pub fn evaluate_expectation(coefficients: &[f64], counts: &MeasurementCounts) -> MfResult<f64> {
    if !coefficients.len().is_power_of_two() {
        return Err(MerminError::Validation(format!(
            "coefficient vector length {} is not a power of two",
            coefficients.len()
        )));
    }
    let qubits = coefficients.len().trailing_zeros() as usize;

    let shots = counts.total();
    if shots == 0 {
        return Err(MerminError::EmptySample);
    }

    let mut value = 0.0;
    for (bitstring, n) in counts.iter() {
        if bitstring.len() != qubits {
            return Err(MerminError::ShapeMismatch {
                expected: qubits,
                actual: bitstring.len(),
            });
        }
        let outcome = parse_outcome(bitstring)?;
        let weight: f64 = coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0.0)
            .map(|(m, c)| c * Monomial::from_mask(m).sign(outcome))
            .sum();
        value += weight * n as f64;
    }
    Ok(value / shots as f64)
}

/// Checks a batch against the expected shot count; a short batch is still
/// usable since expectations divide by the observed total.
pub fn check_shot_total(counts: &MeasurementCounts, shots: u64, setting: usize) {
    let total = counts.total();
    if total != 0 && total != shots {
        warn!(
            "Setting {} returned {} counts for {} shots; normalizing by the observed total",
            setting, total, shots
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_qubit_mermin_coefficients() {
        assert_eq!(
            mermin_coefficients(3),
            vec![0.0, 0.5, 0.5, 0.0, 0.5, 0.0, 0.0, -0.5]
        );
    }

    #[test]
    fn test_parse_outcome_is_little_endian() {
        assert_eq!(parse_outcome("001").unwrap(), 1);
        assert_eq!(parse_outcome("100").unwrap(), 4);
        assert!(parse_outcome("10a").is_err());
    }
}
