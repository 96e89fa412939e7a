use crate::reports;
use clap::Args;
use merminforge::backend::verify_placement;
use merminforge::config::Config;
use merminforge::error::{MerminError, MfResult};
use tracing::info;

const TOLERANCE: f64 = 1e-9;

#[derive(Args, Debug, Clone)]
pub struct StateArgs {
    #[command(flatten)]
    pub config: Config,

    /// Skip the simulated check of the circuit against the ideal amplitudes.
    #[arg(long, default_value_t = false)]
    pub no_verify: bool,
}

pub fn run(args: StateArgs, config: Config) -> MfResult<()> {
    let exp = &config.experiment;
    let state = exp.build_state()?;

    let native = state.gate_placement();
    let placement = if exp.decompose {
        native.decompose()
    } else {
        native
    };
    reports::print_state(&state, &placement, &state.ideal_state_vector());

    if !args.no_verify {
        let deviation = verify_placement(&state, exp.decompose)?;
        info!("Circuit vs ideal state: max deviation {:.3e}", deviation);
        if deviation > TOLERANCE {
            return Err(MerminError::Validation(format!(
                "circuit prepares a different state (deviation {:.3e})",
                deviation
            )));
        }
        println!("Verified: circuit matches ideal state (deviation {:.3e})", deviation);
    }
    Ok(())
}
