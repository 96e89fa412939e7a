#![allow(dead_code)]

use merminforge::codec::PackedCoefficients;
use merminforge::error::{MerminError, MfResult};
use merminforge::executor::{CircuitExecutor, CircuitJob, ExecutionError, MeasurementCounts};
use merminforge::optimizer::Objective;
use std::collections::HashSet;
use std::f64::consts::FRAC_1_SQRT_2;

/// CZ|++> reaches mu = sqrt(2) with these settings.
pub fn graph_state_optimum() -> PackedCoefficients {
    PackedCoefficients {
        a: vec![[1.0, 0.0, 0.0], [FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2]],
        a_prime: vec![[0.0, 0.0, 1.0], [-FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2]],
    }
}

pub fn counts(pairs: &[(&str, u64)]) -> MeasurementCounts {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Fails every call with a fixed error.
pub struct FailingExecutor {
    pub error: ExecutionError,
    pub calls: usize,
}

impl FailingExecutor {
    pub fn new(error: ExecutionError) -> Self {
        Self { error, calls: 0 }
    }
}

impl CircuitExecutor for FailingExecutor {
    fn execute(&mut self, _job: &CircuitJob) -> Result<MeasurementCounts, ExecutionError> {
        self.calls += 1;
        Err(self.error.clone())
    }
}

/// Returns an empty count dictionary every time.
#[derive(Default)]
pub struct EmptyExecutor {
    pub calls: usize,
}

impl CircuitExecutor for EmptyExecutor {
    fn execute(&mut self, _job: &CircuitJob) -> Result<MeasurementCounts, ExecutionError> {
        self.calls += 1;
        Ok(MeasurementCounts::new())
    }
}

/// Delegates to `inner` except on the listed call numbers (0-based), which time out.
pub struct FlakyExecutor<E: CircuitExecutor> {
    pub inner: E,
    pub fail_on: HashSet<usize>,
    pub calls: usize,
}

impl<E: CircuitExecutor> FlakyExecutor<E> {
    pub fn new(inner: E, fail_on: impl IntoIterator<Item = usize>) -> Self {
        Self {
            inner,
            fail_on: fail_on.into_iter().collect(),
            calls: 0,
        }
    }
}

impl<E: CircuitExecutor> CircuitExecutor for FlakyExecutor<E> {
    fn execute(&mut self, job: &CircuitJob) -> Result<MeasurementCounts, ExecutionError> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on.contains(&call) {
            return Err(ExecutionError::ExecutionTimeout(
                job.timeout.unwrap_or_default(),
            ));
        }
        self.inner.execute(job)
    }
}

/// Scores every candidate the same.
pub struct ConstantObjective {
    pub qubits: usize,
    pub value: f64,
    pub calls: usize,
}

impl ConstantObjective {
    pub fn new(qubits: usize, value: f64) -> Self {
        Self {
            qubits,
            value,
            calls: 0,
        }
    }
}

impl Objective for ConstantObjective {
    fn qubits(&self) -> usize {
        self.qubits
    }

    fn score(&mut self, _candidate: &PackedCoefficients) -> MfResult<f64> {
        self.calls += 1;
        Ok(self.value)
    }
}

/// Replays a fixed sequence of outcomes, then repeats the last one.
pub struct ScriptedObjective {
    pub qubits: usize,
    pub script: Vec<MfResult<f64>>,
    pub calls: usize,
}

impl ScriptedObjective {
    pub fn new(qubits: usize, script: Vec<MfResult<f64>>) -> Self {
        Self {
            qubits,
            script,
            calls: 0,
        }
    }
}

impl Objective for ScriptedObjective {
    fn qubits(&self) -> usize {
        self.qubits
    }

    fn score(&mut self, _candidate: &PackedCoefficients) -> MfResult<f64> {
        let idx = self.calls.min(self.script.len().saturating_sub(1));
        self.calls += 1;
        match self.script.get(idx) {
            Some(Ok(v)) => Ok(*v),
            Some(Err(MerminError::EmptySample)) => Err(MerminError::EmptySample),
            Some(Err(MerminError::Execution(e))) => Err(MerminError::Execution(e.clone())),
            Some(Err(e)) => Err(MerminError::Validation(e.to_string())),
            None => Ok(0.0),
        }
    }
}
