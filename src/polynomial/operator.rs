//! Exact expectation of a polynomial on a known state vector.

use super::{setting_variants, MerminPolynomial};
use crate::codec::{self, PackedCoefficients, Triple};
use crate::error::{MerminError, MfResult};
use num_complex::Complex64;

pub type Matrix2 = [[Complex64; 2]; 2];

/// `x X + y Y + z Z` as a 2x2 matrix.
pub fn observable(t: &Triple) -> Matrix2 {
    let [x, y, z] = *t;
    [
        [Complex64::new(z, 0.0), Complex64::new(x, -y)],
        [Complex64::new(x, y), Complex64::new(-z, 0.0)],
    ]
}

/// Applies `m` to `qubit` in place. Qubit `q` is bit `q` of the basis index.
pub fn apply_single_qubit(state: &mut [Complex64], qubit: usize, m: &Matrix2) {
    let stride = 1usize << qubit;
    for base in 0..state.len() {
        if base & stride != 0 {
            continue;
        }
        let lo = state[base];
        let hi = state[base | stride];
        state[base] = m[0][0] * lo + m[0][1] * hi;
        state[base | stride] = m[1][0] * lo + m[1][1] * hi;
    }
}

pub fn to_complex(amplitudes: &[f64]) -> Vec<Complex64> {
    amplitudes.iter().map(|&a| Complex64::new(a, 0.0)).collect()
}

/// `<psi| sum_i c_i (x)_q O_{q,i} |psi>` where `O_{q,i}` is the observable of
/// qubit `q` in setting `i`. Triples are normalized the way the measurement
/// rotation normalizes them, so a zero triple reads as `Z`.
pub fn expectation(
    polynomial: &MerminPolynomial,
    packed: &PackedCoefficients,
    state: &[Complex64],
) -> MfResult<f64> {
    let n = polynomial.qubits();
    packed.check_shape(n)?;
    if state.len() != 1usize << n {
        return Err(MerminError::ShapeMismatch {
            expected: 1usize << n,
            actual: state.len(),
        });
    }

    let mut total = 0.0;
    let mut scratch = vec![Complex64::new(0.0, 0.0); state.len()];
    for (setting, coefficient) in polynomial.terms() {
        scratch.copy_from_slice(state);
        for (qubit, variant) in setting_variants(setting, n)?.into_iter().enumerate() {
            let axis = codec::normalized(packed.triple(qubit, variant)).unwrap_or([0.0, 0.0, 1.0]);
            apply_single_qubit(&mut scratch, qubit, &observable(&axis));
        }
        let braket: Complex64 = state
            .iter()
            .zip(scratch.iter())
            .map(|(bra, ket)| bra.conj() * ket)
            .sum();
        total += coefficient * braket.re;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_z_on_zero_state() {
        let mut state = vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];
        apply_single_qubit(&mut state, 0, &observable(&[0.0, 0.0, 1.0]));
        assert_eq!(state[0], Complex64::new(1.0, 0.0));
    }
}
