use crate::executor::ExecutionError;
use crate::hypergraph::{Gate, GatePlacement};
use crate::polynomial::operator::{apply_single_qubit, Matrix2};
use num_complex::Complex64;
use std::f64::consts::FRAC_1_SQRT_2;

/// Registers above this size are refused rather than allocated.
pub const MAX_SIMULATED_QUBITS: usize = 24;

fn hadamard() -> Matrix2 {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

#[inline(always)]
fn all_set(index: usize, mask: usize) -> bool {
    index & mask == mask
}

fn mask_of(qubits: &[usize]) -> usize {
    qubits.iter().fold(0, |m, &q| m | (1 << q))
}

/// Runs every unitary gate of `placement` on `|0..0>`. `Measure` gates are
/// skipped; sampling happens on the returned amplitudes.
pub fn simulate(placement: &GatePlacement) -> Result<Vec<Complex64>, ExecutionError> {
    let width = placement.total_qubits();
    if width > MAX_SIMULATED_QUBITS {
        return Err(ExecutionError::BackendUnavailable(format!(
            "{} qubits exceed the {}-qubit simulator",
            width, MAX_SIMULATED_QUBITS
        )));
    }
    placement.validate()?;

    let mut state = vec![Complex64::new(0.0, 0.0); 1 << width];
    state[0] = Complex64::new(1.0, 0.0);
    let h = hadamard();

    for gate in &placement.gates {
        match gate {
            Gate::H(q) => apply_single_qubit(&mut state, *q, &h),
            Gate::U3 { qubit, angles } => apply_single_qubit(&mut state, *qubit, &angles.matrix()),
            Gate::Cz(a, b) => flip_phase(&mut state, mask_of(&[*a, *b])),
            Gate::Mcz { controls, target } => {
                flip_phase(&mut state, mask_of(controls) | (1 << target))
            }
            Gate::Ccx { controls, target } => {
                let control_mask = mask_of(controls);
                let t = 1usize << target;
                for i in 0..state.len() {
                    if i & t == 0 && all_set(i, control_mask) {
                        state.swap(i, i | t);
                    }
                }
            }
            Gate::Measure { .. } => {}
        }
    }
    Ok(state)
}

fn flip_phase(state: &mut [Complex64], mask: usize) {
    for (i, amp) in state.iter_mut().enumerate() {
        if all_set(i, mask) {
            *amp = -*amp;
        }
    }
}

/// Outcome probabilities of the low `logical` qubits, summing out the rest.
pub fn marginal_probabilities(state: &[Complex64], logical: usize) -> Vec<f64> {
    let mut probs = vec![0.0; 1 << logical];
    let low = (1usize << logical) - 1;
    for (i, amp) in state.iter().enumerate() {
        probs[i & low] += amp.norm_sqr();
    }
    probs
}

/// Probability mass that sits on non-zero ancilla values.
pub fn ancilla_leakage(state: &[Complex64], logical: usize) -> f64 {
    state
        .iter()
        .enumerate()
        .filter(|(i, _)| i >> logical != 0)
        .map(|(_, a)| a.norm_sqr())
        .sum()
}

/// Largest-remainder rounding of `probs * shots`; always sums to `shots`.
pub fn expected_counts(probs: &[f64], shots: u64) -> Vec<u64> {
    let total: f64 = probs.iter().sum();
    if total <= 0.0 {
        return vec![0; probs.len()];
    }

    let scaled: Vec<f64> = probs.iter().map(|p| p / total * shots as f64).collect();
    let mut counts: Vec<u64> = scaled.iter().map(|s| s.floor() as u64).collect();
    let assigned: u64 = counts.iter().sum();

    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = scaled[a] - scaled[a].floor();
        let rb = scaled[b] - scaled[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &i in order.iter().take(shots.saturating_sub(assigned) as usize) {
        counts[i] += 1;
    }
    counts
}

/// Draws `shots` outcomes from `probs`.
pub fn sampled_counts(probs: &[f64], shots: u64, rng: &mut fastrand::Rng) -> Vec<u64> {
    let mut cumulative = Vec::with_capacity(probs.len());
    let mut acc = 0.0;
    for p in probs {
        acc += p;
        cumulative.push(acc);
    }

    let mut counts = vec![0u64; probs.len()];
    if acc <= 0.0 {
        return counts;
    }
    for _ in 0..shots {
        let r = rng.f64() * acc;
        let idx = cumulative.partition_point(|&c| c <= r).min(probs.len() - 1);
        counts[idx] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_counts_sum_to_shots() {
        let counts = expected_counts(&[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0], 100);
        assert_eq!(counts.iter().sum::<u64>(), 100);
        assert_eq!(counts, vec![34, 33, 33]);
    }

    #[test]
    fn test_ccx_flips_target_only_when_controls_set() {
        let mut placement = GatePlacement::new(3);
        placement.gates.push(Gate::H(0));
        placement.gates.push(Gate::H(1));
        placement.gates.push(Gate::Ccx {
            controls: [0, 1],
            target: 2,
        });
        let probs = marginal_probabilities(&simulate(&placement).unwrap(), 3);
        assert!((probs[0b111] - 0.25).abs() < 1e-12);
        assert!(probs[0b011].abs() < 1e-12);
    }
}
