use crate::reports;
use clap::Args;
use merminforge::backend::ReferenceBackend;
use merminforge::basis::coefficients_to_rotation_angles;
use merminforge::codec::{unpacked_to_packed, UnpackedCoefficients, Variant};
use merminforge::config::Config;
use merminforge::error::MfResult;
use merminforge::executor::{CircuitExecutor, CircuitJob, MeasurementCounts};
use merminforge::polynomial::{self, operator, MerminPolynomial};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub config: Config,

    /// 6N unpacked coefficients, comma separated.
    #[arg(short = 'c', long, allow_hyphen_values = true)]
    pub coefficients: String,
}

pub fn run(args: EvaluateArgs, config: Config) -> MfResult<()> {
    let exp = &config.experiment;
    let n = exp.qubits;
    let unpacked: UnpackedCoefficients = args.coefficients.parse()?;
    let packed = unpacked_to_packed(&unpacked, n)?;
    let angles = coefficients_to_rotation_angles(&unpacked, n)?;
    let state = exp.build_state()?;
    let placement = state.gate_placement();

    let mut backend = ReferenceBackend::new(exp.count_mode, config.search.seed)
        .with_decomposition(exp.decompose);

    let mut values = HashMap::new();
    let variants: &[Variant] = if exp.mu_kind.needs_primed() {
        &[Variant::Unprimed, Variant::Primed]
    } else {
        &[Variant::Unprimed]
    };

    for &variant in variants {
        let poly = MerminPolynomial::new(n, variant)?;
        let mut batches: BTreeMap<usize, MeasurementCounts> = BTreeMap::new();
        for setting in poly.required_settings() {
            let job = CircuitJob {
                placement: placement.clone(),
                rotations: angles.rotations_for_setting(setting)?,
                shots: exp.shots,
                timeout: exp.timeout(),
                setting,
            };
            let counts = backend.execute(&job)?;
            polynomial::check_shot_total(&counts, exp.shots, setting);
            batches.insert(setting, counts);
        }

        let measured = polynomial::evaluate_polynomial(&poly, &batches)?;
        let exact = operator::expectation(
            &poly,
            &packed,
            &operator::to_complex(&state.ideal_state_vector()),
        )?;
        info!("<M> ({}): measured {:.6}, exact {:.6}", variant, measured, exact);

        let listing: Vec<(usize, MeasurementCounts)> = batches.into_iter().collect();
        reports::print_evaluation(&poly, &listing, measured);
        values.insert(variant, (measured, exact));
    }

    let (m, m_exact) = values.get(&Variant::Unprimed).copied().unwrap_or((0.0, 0.0));
    let (mp, mp_exact) = values.get(&Variant::Primed).copied().unwrap_or((0.0, 0.0));
    println!(
        "mu ({}): {:.6} (exact {:.6})",
        exp.mu_kind,
        exp.mu_kind.combine(m, mp),
        exp.mu_kind.combine(m_exact, mp_exact)
    );
    Ok(())
}
