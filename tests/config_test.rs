use clap::{CommandFactory, FromArgMatches, Parser};
use merminforge::backend::CountMode;
use merminforge::config::{Config, ObjectiveKind};
use merminforge::error::MerminError;
use merminforge::hypergraph::HypergraphState;
use merminforge::optimizer::{OptimizationOptions, RadiusPolicy};
use merminforge::polynomial::MuKind;
use rstest::rstest;
use std::io::Write;

#[derive(Parser, Debug)]
struct TestCli {
    #[command(flatten)]
    config: Config,
}

fn parse(args: &[&str]) -> (Config, clap::ArgMatches) {
    let mut argv = vec!["test"];
    argv.extend_from_slice(args);
    let matches = TestCli::command().get_matches_from(argv);
    let cli = TestCli::from_arg_matches(&matches).unwrap();
    (cli.config, matches)
}

#[test]
fn test_cli_defaults_match_struct_defaults() {
    let (from_cli, _) = parse(&[]);
    let defaults = Config::default();
    assert_eq!(
        serde_json::to_value(&from_cli).unwrap(),
        serde_json::to_value(&defaults).unwrap()
    );
}

#[test]
fn test_default_values() {
    let config = Config::default();
    assert_eq!(config.experiment.qubits, 3);
    assert_eq!(config.experiment.pattern, 1);
    assert_eq!(config.experiment.shots, 1024);
    assert_eq!(config.experiment.mu_kind, MuKind::Absolute);
    assert_eq!(config.experiment.objective, ObjectiveKind::Circuit);
    assert_eq!(config.experiment.count_mode, CountMode::Sampled);
    assert_eq!(config.search.attempts_per_radius, 1);
    assert_eq!(config.experiment.timeout(), None);
}

#[test]
fn test_partial_json_keeps_defaults() {
    let json = r#"{ "search": { "decay_factor": 0.8, "radius_policy": "reset" },
                    "experiment": { "qubits": 4, "mu_kind": "sum_of_squares" } }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.search.decay_factor, 0.8);
    assert_eq!(config.search.radius_policy, RadiusPolicy::Reset);
    assert_eq!(config.search.max_iterations, 2000);
    assert_eq!(config.experiment.qubits, 4);
    assert_eq!(config.experiment.mu_kind, MuKind::SumOfSquares);
    assert_eq!(config.experiment.shots, 1024);
}

#[test]
fn test_options_follow_config() {
    let mut config = Config::default();
    config.search.decay_factor = 0.75;
    config.search.seed = Some(99);
    config.search.checkpoint_every = 25;
    let opts = OptimizationOptions::from(&config);
    assert_eq!(opts.decay_factor, 0.75);
    assert_eq!(opts.seed, Some(99));
    assert_eq!(opts.checkpoint_every, 25);
    assert_eq!(opts.for_run(3).seed, Some(102));
}

#[test]
fn test_cli_flags_override_file_values() {
    let mut file_config: Config = serde_json::from_str(
        r#"{ "search": { "max_iterations": 50, "seed": 7 }, "experiment": { "qubits": 4, "shots": 10 } }"#,
    )
    .unwrap();
    let (cli, matches) = parse(&["--shots", "2048", "--radius-policy", "grow"]);
    file_config.merge_from_cli(&cli, &matches);

    // Typed on the command line.
    assert_eq!(file_config.experiment.shots, 2048);
    assert_eq!(file_config.search.radius_policy, RadiusPolicy::Grow);
    // Left to the file.
    assert_eq!(file_config.experiment.qubits, 4);
    assert_eq!(file_config.search.max_iterations, 50);
    assert_eq!(file_config.search.seed, Some(7));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "experiment": {{ "pattern_bits": "1001", "qubits": 3 }} }}"#).unwrap();
    let config = Config::load_from_file(file.path()).unwrap();
    // "1001" selects the first and last canonical edges, same as pattern 9.
    let state = config.experiment.build_state().unwrap();
    assert_eq!(state.edges().to_string(), "{[0,1] [0,1,2]}");
    assert_eq!(state, HypergraphState::from_pattern(3, 9).unwrap());
}

#[test]
fn test_load_errors() {
    assert!(Config::load_from_file("/nonexistent/merminforge.json").is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    assert!(Config::load_from_file(file.path()).is_err());
}

#[test]
fn test_bad_pattern_bits() {
    let mut config = Config::default();
    config.experiment.pattern_bits = Some("10a1".to_string());
    assert!(matches!(config.experiment.build_state(), Err(MerminError::Validation(_))));
    config.experiment.pattern_bits = Some(String::new());
    assert_eq!(
        config.experiment.build_state().unwrap(),
        HypergraphState::from_pattern(3, 1).unwrap()
    );
}

#[rstest]
#[case("1", 1)]
#[case("00001", 5)]
#[case("0001000", 7)]
fn test_pattern_bits_of_wrong_width(#[case] bits: &str, #[case] actual: usize) {
    let mut config = Config::default();
    config.experiment.pattern_bits = Some(bits.to_string());
    assert!(matches!(
        config.experiment.build_state(),
        Err(MerminError::ShapeMismatch { expected: 4, actual: a }) if a == actual
    ));
}

#[test]
fn test_pattern_bits_select_low_order_edges_at_eight_qubits() {
    let bits = format!("1{}", "0".repeat(246));
    let (cli, _) = parse(&["-q", "8", "--pattern-bits", &bits]);
    let state = cli.experiment.build_state().unwrap();
    assert_eq!(state.qubits(), 8);
    assert_eq!(state.edges().to_string(), "{[0,1]}");
}
