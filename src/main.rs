use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use merminforge::config::Config;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file; explicit flags override its values.
    #[arg(global = true, long)]
    config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search measurement settings that maximize mu.
    Search(cmd::search::SearchArgs),
    /// Build a hypergraph state and check its circuit.
    State(cmd::state::StateArgs),
    /// Evaluate mu for a given coefficient vector.
    Evaluate(cmd::evaluate::EvaluateArgs),
}

fn main() {
    // 1. Parse raw matches (to distinguish user input from defaults)
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // 2. Subcommand config and its matches (flags live on the subcommand)
    let (cli_config, name) = match &cli.command {
        Commands::Search(args) => (&args.config, "search"),
        Commands::State(args) => (&args.config, "state"),
        Commands::Evaluate(args) => (&args.config, "evaluate"),
    };

    // 3. Resolve config: JSON file as base, explicit CLI flags on top
    let config = match &cli.config {
        Some(path) => {
            info!("Loading config from {}", path);
            let mut file_config = Config::load_from_file(path).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            });
            match matches.subcommand_matches(name) {
                Some(sub_matches) => file_config.merge_from_cli(cli_config, sub_matches),
                None => {
                    error!("No arguments found for subcommand '{}'", name);
                    process::exit(1);
                }
            }
            file_config
        }
        None => cli_config.clone(),
    };

    // 4. Execute
    let result = match cli.command {
        Commands::Search(args) => cmd::search::run(args, config, cli.debug),
        Commands::State(args) => cmd::state::run(args, config),
        Commands::Evaluate(args) => cmd::evaluate::run(args, config),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}
