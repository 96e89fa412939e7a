use crate::reports;
use clap::Args;
use merminforge::backend::ReferenceBackend;
use merminforge::codec::{unpacked_to_packed, UnpackedCoefficients};
use merminforge::config::{Config, ObjectiveKind};
use merminforge::error::{MerminError, MfResult};
use merminforge::hypergraph::HypergraphState;
use merminforge::optimizer::{
    run_batch, AnalyticObjective, CircuitObjective, MerminOptimizer, Objective,
    OptimizationOptions, OptimizationResult, OptimizationState, ProgressCallback,
};
use merminforge::persistence::{CsvSink, NullSink, ResultSink};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub config: Config,

    /// Independent runs, executed in parallel.
    #[arg(short = 'r', long, default_value_t = 1)]
    pub runs: usize,

    /// CSV file for checkpoints; one file per run when --runs > 1.
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Starting point as 6N unpacked coefficients (single run only).
    #[arg(long, allow_hyphen_values = true)]
    pub initial: Option<String>,
}

struct ConsoleProgress {
    report_every: usize,
}

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, state: &OptimizationState) -> bool {
        if state.iteration > 0 && state.iteration % self.report_every == 0 {
            info!(
                "Iter {:6} | mu {:.6} | radius {:.3e} | failures {}",
                state.iteration, state.best_mu, state.radius, state.failed_candidates
            );
        }
        true
    }
}

fn run_output_path(base: &str, run_id: usize, runs: usize) -> PathBuf {
    let path = Path::new(base);
    if runs <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "results".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "csv".to_string());
    path.with_file_name(format!("{}_run{}.{}", stem, run_id, ext))
}

fn build_objective(
    config: &Config,
    state: &HypergraphState,
    run_id: usize,
) -> MfResult<Box<dyn Objective>> {
    let exp = &config.experiment;

    Ok(match exp.objective {
        ObjectiveKind::Analytic => Box::new(AnalyticObjective::new(state, exp.mu_kind)?),
        ObjectiveKind::Circuit => {
            let backend = ReferenceBackend::new(
                exp.count_mode,
                config.search.seed.map(|s| s.wrapping_add(10_000 + run_id as u64)),
            )
            .with_decomposition(exp.decompose);
            Box::new(
                CircuitObjective::new(backend, state.clone(), exp.shots, exp.mu_kind)?
                    .with_timeout(exp.timeout()),
            )
        }
    })
}

fn build_optimizer(
    config: &Config,
    state: &HypergraphState,
    output: Option<&str>,
    runs: usize,
    run_id: usize,
) -> MfResult<MerminOptimizer<Box<dyn Objective>>> {
    let options = OptimizationOptions::from(config).for_run(run_id);
    let sink: Box<dyn ResultSink> = match output {
        Some(base) => Box::new(CsvSink::create(run_output_path(base, run_id, runs))?),
        None => Box::new(NullSink),
    };
    Ok(MerminOptimizer::new(build_objective(config, state, run_id)?, options)?
        .with_sink(sink)
        .with_run_id(run_id))
}

pub fn run(args: SearchArgs, config: Config, debug: bool) -> MfResult<()> {
    if args.runs == 0 {
        return Err(MerminError::Config("--runs must be at least 1".to_string()));
    }
    let exp = &config.experiment;
    let state = exp.build_state()?;
    info!(
        "Searching {} qubits, hyperedges {}, objective {}, mu {}",
        exp.qubits,
        state.edges(),
        exp.objective,
        exp.mu_kind
    );

    let progress = ConsoleProgress {
        report_every: if debug { 10 } else { 100 },
    };
    let start = Instant::now();

    let results: Vec<OptimizationResult> = if args.runs == 1 {
        let initial = match &args.initial {
            Some(text) => {
                let unpacked: UnpackedCoefficients = text.parse()?;
                Some(unpacked_to_packed(&unpacked, exp.qubits)?)
            }
            None => None,
        };
        let mut optimizer = build_optimizer(&config, &state, args.output.as_deref(), 1, 0)?;
        vec![optimizer.run(initial, &progress)?]
    } else {
        if args.initial.is_some() {
            warn!("--initial is ignored when --runs > 1");
        }
        run_batch(
            args.runs,
            |run_id| build_optimizer(&config, &state, args.output.as_deref(), args.runs, run_id),
            &progress,
        )
        .into_iter()
        .collect::<MfResult<Vec<_>>>()?
    };

    info!("Search finished in {:.2?}", start.elapsed());
    reports::print_run_summary(&results);

    let best = results
        .iter()
        .filter(|r| r.status.is_converged())
        .max_by(|a, b| a.best_mu().total_cmp(&b.best_mu()));

    match best {
        Some(r) => {
            reports::print_coefficients(&format!("run {}", r.run_id), r.xbest());
            println!("Best mu: {:.6}", r.best_mu());
            Ok(())
        }
        None => Err(MerminError::Validation(
            "every run exhausted its failure budget".to_string(),
        )),
    }
}
