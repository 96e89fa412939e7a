use crate::backend::CountMode;
use crate::error::{MerminError, MfResult};
use crate::hypergraph::HypergraphState;
use crate::optimizer::RadiusPolicy;
use crate::polynomial::MuKind;
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Circuits through an executor, scored from counts.
    Circuit,
    /// Exact expectation on the ideal state vector.
    Analytic,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub experiment: ExperimentParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[arg(long, default_value_t = 1.0)]
    pub initial_radius: f64,
    #[arg(long, default_value_t = 0.01)]
    pub min_radius: f64,
    #[arg(long, default_value_t = 0.5)]
    pub decay_factor: f64,
    #[arg(long, default_value_t = 2000)]
    pub max_iterations: usize,
    #[arg(long, default_value_t = 1)]
    pub attempts_per_radius: usize,
    #[arg(long, default_value_t = 5)]
    pub failure_threshold: usize,
    #[arg(long, default_value = "keep")]
    pub radius_policy: RadiusPolicy,
    #[arg(long, default_value_t = 1.0)]
    pub growth_factor: f64,
    #[arg(long, default_value_t = 0)]
    pub checkpoint_every: usize,
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            initial_radius: 1.0,
            min_radius: 0.01,
            decay_factor: 0.5,
            max_iterations: 2000,
            attempts_per_radius: 1,
            failure_threshold: 5,
            radius_policy: RadiusPolicy::Keep,
            growth_factor: 1.0,
            checkpoint_every: 0,
            seed: None,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentParams {
    #[arg(short = 'q', long, default_value_t = 3)]
    pub qubits: usize,
    /// Hyperedge selection over the canonical enumeration, MSB first.
    #[arg(long, default_value_t = 1)]
    pub pattern: u128,
    /// Same selection as a bit-string of exactly 2^N-N-1 characters; wins
    /// over --pattern and reaches every edge for any N.
    #[arg(long)]
    pub pattern_bits: Option<String>,
    #[arg(long, default_value_t = 1024)]
    pub shots: u64,
    #[arg(long, default_value = "absolute")]
    pub mu_kind: MuKind,
    #[arg(long, default_value = "circuit")]
    pub objective: ObjectiveKind,
    #[arg(long, default_value = "sampled")]
    pub count_mode: CountMode,
    /// Lower hyperedges to H/CZ/CCX with ancillas before execution.
    #[arg(long, default_value_t = false)]
    pub decompose: bool,
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl Default for ExperimentParams {
    fn default() -> Self {
        Self {
            qubits: 3,
            pattern: 1,
            pattern_bits: None,
            shots: 1024,
            mu_kind: MuKind::Absolute,
            objective: ObjectiveKind::Circuit,
            count_mode: CountMode::Sampled,
            decompose: false,
            timeout_ms: None,
        }
    }
}

impl ExperimentParams {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// The hypergraph state the experiment runs on. A non-empty
    /// `pattern_bits` must be exactly `2^N - N - 1` characters and wins over
    /// `pattern`.
    pub fn build_state(&self) -> MfResult<HypergraphState> {
        match self.pattern_bits.as_deref() {
            Some(bits) if !bits.is_empty() => HypergraphState::from_bits(self.qubits, bits),
            _ => HypergraphState::from_pattern(self.qubits, self.pattern),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> MfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MerminError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Copies every value the user typed on the command line over this
    /// (file-loaded) config. Defaults never override file values.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(search.initial_radius);
        update_if_present!(search.min_radius);
        update_if_present!(search.decay_factor);
        update_if_present!(search.max_iterations);
        update_if_present!(search.attempts_per_radius);
        update_if_present!(search.failure_threshold);
        update_if_present!(search.radius_policy);
        update_if_present!(search.growth_factor);
        update_if_present!(search.checkpoint_every);
        update_if_present!(search.seed);

        update_if_present!(experiment.qubits);
        update_if_present!(experiment.pattern);
        update_if_present!(experiment.pattern_bits);
        update_if_present!(experiment.shots);
        update_if_present!(experiment.mu_kind);
        update_if_present!(experiment.objective);
        update_if_present!(experiment.count_mode);
        update_if_present!(experiment.decompose);
        update_if_present!(experiment.timeout_ms);
    }
}
