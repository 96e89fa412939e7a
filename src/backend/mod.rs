//! Local stand-in for a remote circuit service.

pub mod statevector;

use crate::executor::{CircuitExecutor, CircuitJob, ExecutionError, MeasurementCounts};
use crate::hypergraph::HypergraphState;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
    /// Seeded multinomial draws, like a real device.
    Sampled,
    /// Deterministic rounding of the exact distribution.
    Expected,
}

/// State-vector executor.
pub struct ReferenceBackend {
    mode: CountMode,
    rng: fastrand::Rng,
    decompose: bool,
    jobs_run: usize,
}

impl ReferenceBackend {
    pub fn new(mode: CountMode, seed: Option<u64>) -> Self {
        let rng = if let Some(s) = seed {
            fastrand::Rng::with_seed(s)
        } else {
            fastrand::Rng::new()
        };
        Self {
            mode,
            rng,
            decompose: false,
            jobs_run: 0,
        }
    }

    pub fn sampled(seed: u64) -> Self {
        Self::new(CountMode::Sampled, Some(seed))
    }

    pub fn expected() -> Self {
        Self::new(CountMode::Expected, None)
    }

    /// Run the H/CZ/CCX lowering (with ancillas) instead of native MCZ gates.
    pub fn with_decomposition(mut self, decompose: bool) -> Self {
        self.decompose = decompose;
        self
    }

    pub fn jobs_run(&self) -> usize {
        self.jobs_run
    }
}

impl CircuitExecutor for ReferenceBackend {
    fn execute(&mut self, job: &CircuitJob) -> Result<MeasurementCounts, ExecutionError> {
        let start = Instant::now();
        self.jobs_run += 1;

        let logical = job.placement.qubits;
        if job.rotations.len() != logical {
            return Err(ExecutionError::InvalidGatePlacement(format!(
                "{} rotations for {} measured qubits",
                job.rotations.len(),
                logical
            )));
        }

        let preparation = if self.decompose {
            job.placement.decompose()
        } else {
            job.placement.clone()
        };
        let circuit = preparation.with_measurement(&job.rotations);
        let state = statevector::simulate(&circuit)?;

        let leakage = statevector::ancilla_leakage(&state, logical);
        if leakage > 1e-9 {
            warn!("Ancillas left entangled: {:.3e} probability off |0>", leakage);
        }

        let probs = statevector::marginal_probabilities(&state, logical);
        let raw = match self.mode {
            CountMode::Expected => statevector::expected_counts(&probs, job.shots),
            CountMode::Sampled => statevector::sampled_counts(&probs, job.shots, &mut self.rng),
        };

        if let Some(limit) = job.timeout {
            let elapsed = start.elapsed();
            if elapsed > limit {
                return Err(ExecutionError::ExecutionTimeout(limit));
            }
        }

        let counts: MeasurementCounts = raw
            .into_iter()
            .enumerate()
            .filter(|(_, n)| *n > 0)
            .map(|(idx, n)| (format!("{:0width$b}", idx, width = logical), n))
            .collect();

        debug!(
            "Setting {} on {} qubits: {} outcomes",
            job.setting,
            circuit.total_qubits(),
            counts.0.len()
        );
        Ok(counts)
    }
}

/// Largest amplitude difference between the simulated preparation circuit and
/// the ideal state vector. Ancillas must come back to `|0>`, so only the
/// ancilla-free block of the register is compared and any leftover weight
/// outside it counts as deviation.
pub fn verify_placement(
    state: &HypergraphState,
    decompose: bool,
) -> Result<f64, ExecutionError> {
    let native = state.gate_placement();
    let placement = if decompose { native.decompose() } else { native };
    let simulated = statevector::simulate(&placement)?;
    let ideal = state.ideal_state_vector();

    let block = ideal
        .iter()
        .zip(simulated.iter())
        .map(|(want, got)| (got - Complex64::new(*want, 0.0)).norm())
        .fold(0.0, f64::max);
    let leakage = statevector::ancilla_leakage(&simulated, state.qubits()).sqrt();
    Ok(block.max(leakage))
}
