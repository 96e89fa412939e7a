use super::perturb;
use super::{Objective, OptimizationState, Phase, RadiusPolicy, RunStatus, Termination};
use crate::codec::PackedCoefficients;
use crate::config::Config;
use crate::error::{MerminError, MfResult};
use crate::persistence::{NullSink, ResultSink, RunRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, PartialEq, TypedBuilder, Serialize, Deserialize)]
pub struct OptimizationOptions {
    #[builder(default = 1.0)]
    pub initial_radius: f64,
    #[builder(default = 0.01)]
    pub min_radius: f64,
    #[builder(default = 0.5)]
    pub decay_factor: f64,
    #[builder(default = 2000)]
    pub max_iterations: usize,
    /// Consecutive rejections tolerated before the radius decays.
    #[builder(default = 1)]
    pub attempts_per_radius: usize,
    #[builder(default = 5)]
    pub failure_threshold: usize,
    #[builder(default = RadiusPolicy::Keep)]
    pub radius_policy: RadiusPolicy,
    #[builder(default = 1.0)]
    pub growth_factor: f64,
    /// Checkpoint every N iterations; 0 disables periodic checkpoints.
    #[builder(default = 0)]
    pub checkpoint_every: usize,
    #[builder(default, setter(strip_option))]
    pub seed: Option<u64>,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl OptimizationOptions {
    pub fn validate(&self) -> MfResult<()> {
        let bad = |msg: String| Err(MerminError::Config(msg));
        if !(self.initial_radius > 0.0 && self.initial_radius.is_finite()) {
            return bad(format!("initial_radius must be positive, got {}", self.initial_radius));
        }
        if !(self.min_radius > 0.0) {
            return bad(format!("min_radius must be positive, got {}", self.min_radius));
        }
        if !(self.decay_factor > 0.0 && self.decay_factor < 1.0) {
            return bad(format!("decay_factor must lie in (0, 1), got {}", self.decay_factor));
        }
        if self.attempts_per_radius == 0 {
            return bad("attempts_per_radius must be at least 1".to_string());
        }
        if self.failure_threshold == 0 {
            return bad("failure_threshold must be at least 1".to_string());
        }
        if self.radius_policy == RadiusPolicy::Grow && self.growth_factor < 1.0 {
            return bad(format!("growth_factor must be >= 1, got {}", self.growth_factor));
        }
        Ok(())
    }

    /// Options for run `run_id` of a batch: same settings, offset seed.
    pub fn for_run(&self, run_id: usize) -> Self {
        let mut opts = self.clone();
        opts.seed = self.seed.map(|s| s.wrapping_add(run_id as u64));
        opts
    }
}

impl From<&Config> for OptimizationOptions {
    fn from(cfg: &Config) -> Self {
        let s = &cfg.search;
        Self {
            initial_radius: s.initial_radius,
            min_radius: s.min_radius,
            decay_factor: s.decay_factor,
            max_iterations: s.max_iterations,
            attempts_per_radius: s.attempts_per_radius,
            failure_threshold: s.failure_threshold,
            radius_policy: s.radius_policy,
            growth_factor: s.growth_factor,
            checkpoint_every: s.checkpoint_every,
            seed: s.seed,
        }
    }
}

/// Receives the state after every scored candidate.
/// Returning `false` cancels the run.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, state: &OptimizationState) -> bool;
}

pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_progress(&self, _state: &OptimizationState) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct OptimizationResult {
    pub run_id: usize,
    pub status: RunStatus,
    pub initial: PackedCoefficients,
    pub first_mu: Option<f64>,
    pub state: OptimizationState,
    /// Best mu after each scored candidate, seed included.
    pub history: Vec<f64>,
}

impl OptimizationResult {
    pub fn best_mu(&self) -> f64 {
        self.state.best_mu
    }

    pub fn xbest(&self) -> &PackedCoefficients {
        &self.state.xbest
    }

    pub fn iterations(&self) -> usize {
        self.state.iteration
    }
}

pub struct MerminOptimizer<O: Objective> {
    objective: O,
    options: OptimizationOptions,
    sink: Box<dyn ResultSink>,
    run_id: usize,
}

impl<O: Objective> MerminOptimizer<O> {
    pub fn new(objective: O, options: OptimizationOptions) -> MfResult<Self> {
        options.validate()?;
        Ok(Self {
            objective,
            options,
            sink: Box::new(NullSink),
            run_id: 0,
        })
    }

    pub fn with_sink(mut self, sink: Box<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_run_id(mut self, run_id: usize) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn options(&self) -> &OptimizationOptions {
        &self.options
    }

    pub fn objective(&self) -> &O {
        &self.objective
    }

    fn checkpoint(&mut self, state: &OptimizationState, status: &str) -> MfResult<()> {
        let record = RunRecord::new(
            self.run_id,
            state.iteration,
            state.best_mu,
            state.radius,
            status,
            &state.xbest,
        )?;
        self.sink.record(&record)
    }

    /// Runs the search to completion.
    ///
    /// Candidate-level failures (`EmptySample`, executor errors) are absorbed
    /// until `failure_threshold` of them happen in a row, which ends the run
    /// with `RunStatus::Failed`. Any other error aborts with `Err`.
    pub fn run<CB: ProgressCallback + ?Sized>(
        &mut self,
        initial: Option<PackedCoefficients>,
        callback: &CB,
    ) -> MfResult<OptimizationResult> {
        let opts = self.options.clone();
        let qubits = self.objective.qubits();
        let mut rng = if let Some(s) = opts.seed {
            fastrand::Rng::with_seed(s)
        } else {
            fastrand::Rng::new()
        };

        let mut phase = Phase::Initializing;
        let mut state = OptimizationState::new(PackedCoefficients::default(), opts.initial_radius);
        let mut initial_point = PackedCoefficients::default();
        let mut first_mu = None;
        let mut history = Vec::new();
        let mut candidate: Option<PackedCoefficients> = None;
        let mut scored: Option<MfResult<f64>> = None;
        let mut last_failure: Option<MerminError> = None;

        info!(
            "Run {}: {} qubits, radius {} -> {}, decay {}",
            self.run_id, qubits, opts.initial_radius, opts.min_radius, opts.decay_factor
        );

        loop {
            phase = match phase {
                Phase::Initializing => {
                    let seed = match initial.clone() {
                        Some(p) => {
                            p.check_shape(qubits)?;
                            p
                        }
                        None => perturb::random_packed(&mut rng, qubits),
                    };
                    initial_point = seed.clone();
                    state.xbest = seed.clone();

                    match self.objective.score(&seed) {
                        Ok(mu) => {
                            state.best_mu = mu;
                            first_mu = Some(mu);
                        }
                        Err(e) if e.is_candidate_failure() => {
                            warn!("Run {}: seed evaluation failed: {}", self.run_id, e);
                            state.charge_failure();
                            last_failure = Some(e);
                        }
                        Err(e) => return Err(e),
                    }
                    history.push(state.best_mu);

                    if state.consecutive_failures >= opts.failure_threshold {
                        Phase::Failed
                    } else if !callback.on_progress(&state) {
                        Phase::Converged(Termination::Cancelled)
                    } else {
                        match state.termination(&opts) {
                            Some(t) => Phase::Converged(t),
                            None => Phase::Perturbing,
                        }
                    }
                }

                Phase::Perturbing => {
                    candidate = Some(perturb::perturb(&mut rng, &state.xbest, state.radius));
                    Phase::Evaluating
                }

                Phase::Evaluating => {
                    scored = candidate.as_ref().map(|c| self.objective.score(c));
                    Phase::Accepting
                }

                Phase::Accepting => {
                    state.iteration += 1;
                    match (candidate.take(), scored.take()) {
                        (Some(c), Some(Ok(mu))) => {
                            if state.accept(c, mu, &opts) {
                                debug!(
                                    "Run {} iter {}: mu {:.6} (radius {:.4})",
                                    self.run_id, state.iteration, mu, state.radius
                                );
                            }
                        }
                        (_, Some(Err(e))) if e.is_candidate_failure() => {
                            debug!("Run {} iter {}: candidate failed: {}", self.run_id, state.iteration, e);
                            state.fail(&opts);
                            last_failure = Some(e);
                        }
                        (_, Some(Err(e))) => return Err(e),
                        _ => state.fail(&opts),
                    }
                    history.push(state.best_mu);

                    if opts.checkpoint_every > 0 && state.iteration % opts.checkpoint_every == 0 {
                        self.checkpoint(&state, "running")?;
                    }

                    if state.consecutive_failures >= opts.failure_threshold {
                        Phase::Failed
                    } else if !callback.on_progress(&state) {
                        Phase::Converged(Termination::Cancelled)
                    } else {
                        match state.termination(&opts) {
                            Some(t) => Phase::Converged(t),
                            None => Phase::Perturbing,
                        }
                    }
                }

                Phase::Converged(reason) => {
                    info!(
                        "Run {} converged ({}) after {} iterations: mu = {:.6}",
                        self.run_id, reason, state.iteration, state.best_mu
                    );
                    let status = RunStatus::Converged(reason);
                    return self.finish(status, initial_point, first_mu, state, history);
                }

                Phase::Failed => {
                    let err = last_failure.take().unwrap_or_else(|| {
                        MerminError::Validation("failure budget exhausted".to_string())
                    });
                    warn!(
                        "Run {} failed after {} consecutive failures: {}",
                        self.run_id, state.consecutive_failures, err
                    );
                    let status = RunStatus::Failed(err);
                    return self.finish(status, initial_point, first_mu, state, history);
                }
            };
        }
    }

    fn finish(
        &mut self,
        status: RunStatus,
        initial: PackedCoefficients,
        first_mu: Option<f64>,
        state: OptimizationState,
        history: Vec<f64>,
    ) -> MfResult<OptimizationResult> {
        self.checkpoint(&state, &status.label())?;
        self.sink.flush()?;
        Ok(OptimizationResult {
            run_id: self.run_id,
            status,
            initial,
            first_mu,
            state,
            history,
        })
    }
}

/// Runs `runs` independent searches on the rayon pool. `make` builds the
/// optimizer for each run id inside its worker, so nothing mutable is shared.
pub fn run_batch<O, F, CB>(
    runs: usize,
    make: F,
    callback: &CB,
) -> Vec<MfResult<OptimizationResult>>
where
    O: Objective,
    F: Fn(usize) -> MfResult<MerminOptimizer<O>> + Sync,
    CB: ProgressCallback,
{
    (0..runs)
        .into_par_iter()
        .map(|run_id| {
            let mut optimizer = make(run_id)?.with_run_id(run_id);
            optimizer.run(None, callback)
        })
        .collect()
}
