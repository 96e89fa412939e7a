//! The seam between the search and whatever actually runs circuits.

use crate::basis::U3Angles;
use crate::hypergraph::GatePlacement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("execution timed out after {0:?}")]
    ExecutionTimeout(Duration),
    #[error("invalid gate placement: {0}")]
    InvalidGatePlacement(String),
}

/// Outcome bit-string -> count. The right-most character is qubit 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementCounts(pub BTreeMap<String, u64>);

impl MeasurementCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn insert(&mut self, outcome: impl Into<String>, count: u64) {
        *self.0.entry(outcome.into()).or_insert(0) += count;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for MeasurementCounts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut counts = MeasurementCounts::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }
}

/// One circuit to run: state preparation, then a rotation per logical qubit,
/// then measurement of the logical qubits.
#[derive(Debug, Clone)]
pub struct CircuitJob {
    pub placement: GatePlacement,
    pub rotations: Vec<U3Angles>,
    pub shots: u64,
    pub timeout: Option<Duration>,
    /// Monomial index this job measures; informational for executors.
    pub setting: usize,
}

pub trait CircuitExecutor {
    fn execute(&mut self, job: &CircuitJob) -> Result<MeasurementCounts, ExecutionError>;
}

impl<E: CircuitExecutor + ?Sized> CircuitExecutor for Box<E> {
    fn execute(&mut self, job: &CircuitJob) -> Result<MeasurementCounts, ExecutionError> {
        (**self).execute(job)
    }
}
