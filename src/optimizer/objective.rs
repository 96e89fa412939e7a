use crate::basis::BasisAngles;
use crate::codec::{PackedCoefficients, Variant};
use crate::error::{MerminError, MfResult};
use crate::executor::{CircuitExecutor, CircuitJob, MeasurementCounts};
use crate::hypergraph::{GatePlacement, HypergraphState};
use crate::polynomial::{self, operator, MerminPolynomial, MuKind};
use num_complex::Complex64;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Scores a candidate coefficient set. Higher is better.
pub trait Objective {
    fn qubits(&self) -> usize;
    fn score(&mut self, candidate: &PackedCoefficients) -> MfResult<f64>;
}

impl<O: Objective + ?Sized> Objective for Box<O> {
    fn qubits(&self) -> usize {
        (**self).qubits()
    }

    fn score(&mut self, candidate: &PackedCoefficients) -> MfResult<f64> {
        (**self).score(candidate)
    }
}

/// Measures the polynomial through an executor, one circuit per setting.
pub struct CircuitObjective<E: CircuitExecutor> {
    executor: E,
    state: HypergraphState,
    placement: GatePlacement,
    shots: u64,
    timeout: Option<Duration>,
    mu_kind: MuKind,
    unprimed: MerminPolynomial,
    primed: MerminPolynomial,
}

impl<E: CircuitExecutor> CircuitObjective<E> {
    /// The state is prepared by every circuit this objective submits.
    pub fn new(executor: E, state: HypergraphState, shots: u64, mu_kind: MuKind) -> MfResult<Self> {
        if shots == 0 {
            return Err(MerminError::Config("shots must be positive".to_string()));
        }
        let qubits = state.qubits();

        Ok(Self {
            executor,
            placement: state.gate_placement(),
            state,
            shots,
            timeout: None,
            mu_kind,
            unprimed: MerminPolynomial::new(qubits, Variant::Unprimed)?,
            primed: MerminPolynomial::new(qubits, Variant::Primed)?,
        })
    }

    pub fn from_pattern(
        executor: E,
        qubits: usize,
        pattern: u128,
        shots: u64,
        mu_kind: MuKind,
    ) -> MfResult<Self> {
        Self::new(executor, HypergraphState::from_pattern(qubits, pattern)?, shots, mu_kind)
    }

    pub fn state(&self) -> &HypergraphState {
        &self.state
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    fn measure(
        &mut self,
        variant: Variant,
        angles: &BasisAngles,
        batches: &mut BTreeMap<usize, MeasurementCounts>,
    ) -> MfResult<f64> {
        let polynomial = match variant {
            Variant::Unprimed => &self.unprimed,
            Variant::Primed => &self.primed,
        };

        for setting in polynomial.required_settings() {
            if batches.contains_key(&setting) {
                continue;
            }
            let job = CircuitJob {
                placement: self.placement.clone(),
                rotations: angles.rotations_for_setting(setting)?,
                shots: self.shots,
                timeout: self.timeout,
                setting,
            };
            let counts = self.executor.execute(&job)?;
            polynomial::check_shot_total(&counts, self.shots, setting);
            batches.insert(setting, counts);
        }

        polynomial::evaluate_polynomial(polynomial, batches)
    }
}

impl<E: CircuitExecutor> Objective for CircuitObjective<E> {
    fn qubits(&self) -> usize {
        self.state.qubits()
    }

    fn score(&mut self, candidate: &PackedCoefficients) -> MfResult<f64> {
        candidate.check_shape(self.state.qubits())?;

        let angles = BasisAngles::from_packed(candidate);
        let mut batches = BTreeMap::new();

        let m = self.measure(Variant::Unprimed, &angles, &mut batches)?;
        let m_prime = if self.mu_kind.needs_primed() {
            self.measure(Variant::Primed, &angles, &mut batches)?
        } else {
            0.0
        };

        let mu = self.mu_kind.combine(m, m_prime);
        debug!("Circuit score over {} settings: {:.6}", batches.len(), mu);
        Ok(mu)
    }
}

/// Exact expectation on the ideal state vector; no executor involved.
pub struct AnalyticObjective {
    qubits: usize,
    state: Vec<Complex64>,
    mu_kind: MuKind,
    unprimed: MerminPolynomial,
    primed: MerminPolynomial,
}

impl AnalyticObjective {
    pub fn new(state: &HypergraphState, mu_kind: MuKind) -> MfResult<Self> {
        let qubits = state.qubits();
        Ok(Self {
            qubits,
            state: operator::to_complex(&state.ideal_state_vector()),
            mu_kind,
            unprimed: MerminPolynomial::new(qubits, Variant::Unprimed)?,
            primed: MerminPolynomial::new(qubits, Variant::Primed)?,
        })
    }

    pub fn from_pattern(qubits: usize, pattern: u128, mu_kind: MuKind) -> MfResult<Self> {
        Self::new(&HypergraphState::from_pattern(qubits, pattern)?, mu_kind)
    }
}

impl Objective for AnalyticObjective {
    fn qubits(&self) -> usize {
        self.qubits
    }

    fn score(&mut self, candidate: &PackedCoefficients) -> MfResult<f64> {
        candidate.check_shape(self.qubits)?;
        let m = operator::expectation(&self.unprimed, candidate, &self.state)?;
        let m_prime = if self.mu_kind.needs_primed() {
            operator::expectation(&self.primed, candidate, &self.state)?
        } else {
            0.0
        };
        Ok(self.mu_kind.combine(m, m_prime))
    }
}
