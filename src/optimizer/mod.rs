pub mod objective;
pub mod perturb;
pub mod runner;

pub use self::objective::{AnalyticObjective, CircuitObjective, Objective};
pub use self::runner::{
    run_batch, MerminOptimizer, OptimizationOptions, OptimizationResult, ProgressCallback,
    SilentProgress,
};

use crate::codec::PackedCoefficients;
use crate::error::MerminError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// What happens to the radius after an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RadiusPolicy {
    Keep,
    /// Back to the initial radius.
    Reset,
    /// Multiply by the growth factor, capped at the initial radius.
    Grow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Termination {
    RadiusExhausted,
    IterationBudget,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    Initializing,
    Perturbing,
    Evaluating,
    Accepting,
    Converged(Termination),
    Failed,
}

#[derive(Debug)]
pub enum RunStatus {
    Converged(Termination),
    /// The consecutive failure budget ran out; carries the last failure.
    Failed(MerminError),
}

impl RunStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, RunStatus::Converged(_))
    }

    pub fn label(&self) -> String {
        match self {
            RunStatus::Converged(t) => format!("converged:{}", t),
            RunStatus::Failed(_) => "failed".to_string(),
        }
    }
}

/// Mutable search state of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationState {
    pub xbest: PackedCoefficients,
    /// `-inf` until a candidate scores.
    pub best_mu: f64,
    pub radius: f64,
    /// Perturbed candidates scored so far; the seed is not counted.
    pub iteration: usize,
    pub consecutive_failures: usize,
    pub rejections_at_radius: usize,
    pub failed_candidates: usize,
}

impl OptimizationState {
    pub fn new(xbest: PackedCoefficients, radius: f64) -> Self {
        Self {
            xbest,
            best_mu: f64::NEG_INFINITY,
            radius,
            iteration: 0,
            consecutive_failures: 0,
            rejections_at_radius: 0,
            failed_candidates: 0,
        }
    }

    pub fn has_score(&self) -> bool {
        self.best_mu.is_finite()
    }

    /// Records a scored candidate. Returns `true` when it became the new best.
    pub fn accept(
        &mut self,
        candidate: PackedCoefficients,
        mu: f64,
        options: &OptimizationOptions,
    ) -> bool {
        self.consecutive_failures = 0;
        if mu > self.best_mu {
            self.xbest = candidate;
            self.best_mu = mu;
            self.rejections_at_radius = 0;
            self.radius = match options.radius_policy {
                RadiusPolicy::Keep => self.radius,
                RadiusPolicy::Reset => options.initial_radius,
                RadiusPolicy::Grow => (self.radius * options.growth_factor).min(options.initial_radius),
            };
            true
        } else {
            self.reject(options);
            false
        }
    }

    /// A failed candidate is rejected like a losing one and charged to the
    /// failure budget.
    pub fn fail(&mut self, options: &OptimizationOptions) {
        self.charge_failure();
        self.reject(options);
    }

    /// Counts a failure without touching the radius (used for the seed).
    pub fn charge_failure(&mut self) {
        self.consecutive_failures += 1;
        self.failed_candidates += 1;
    }

    fn reject(&mut self, options: &OptimizationOptions) {
        self.rejections_at_radius += 1;
        if self.rejections_at_radius >= options.attempts_per_radius {
            self.radius *= options.decay_factor;
            self.rejections_at_radius = 0;
        }
    }

    pub fn termination(&self, options: &OptimizationOptions) -> Option<Termination> {
        if self.radius < options.min_radius {
            Some(Termination::RadiusExhausted)
        } else if self.iteration >= options.max_iterations {
            Some(Termination::IterationBudget)
        } else {
            None
        }
    }
}
