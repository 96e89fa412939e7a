use crate::executor::ExecutionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MerminError {
    #[error("Shape Mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Out Of Range: {number} does not fit in {width} bits")]
    OutOfRange { number: u128, width: usize },

    #[error("Empty Sample: measurement counts sum to zero")]
    EmptySample,

    #[error("Execution Error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),
}

impl MerminError {
    /// Errors that sink a single candidate rather than the whole run.
    pub fn is_candidate_failure(&self) -> bool {
        matches!(self, MerminError::EmptySample | MerminError::Execution(_))
    }
}

pub type MfResult<T> = Result<T, MerminError>;
