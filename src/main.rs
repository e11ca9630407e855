mod commands;
mod config;
mod display;
mod error;
mod github;
mod language;
mod signal;

use clap::{Parser, Subcommand};
use commands::ScopeArgs;
use error::OrglangError;
use language::ByteUnit;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "orglang",
    version,
    about = "Report programming language usage across GitHub organizations and enterprises"
)]
pub struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Show verbose output (rate limits, debug info)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count how many repositories use each language
    Count {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Sum the bytes of code written in each language
    Data {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Unit used to display byte totals
        #[arg(long, value_enum, default_value_t = ByteUnit::Megabytes)]
        unit: ByteUnit,
    },
    /// Count languages per repository creation year
    Trend {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "orglang=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: &Cli) -> error::Result<()> {
    match &cli.command {
        Commands::Count { scope } => commands::count::run(scope, cli.json, cli.verbose).await,
        Commands::Data { scope, unit } => {
            commands::data::run(scope, *unit, cli.json, cli.verbose).await
        }
        Commands::Trend { scope } => commands::trend::run(scope, cli.json, cli.verbose).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Once anything listens for Ctrl-C the default SIGINT exit is gone, so
    // this listener must stay alive for the whole run.
    let result = tokio::select! {
        result = dispatch(&cli) => result,
        _ = signal::interrupted() => Err(OrglangError::Interrupted),
    };

    if let Err(e) = result {
        display::error(&e.to_string());
        let code = if matches!(e, OrglangError::Interrupted) { 130 } else { 1 };
        std::process::exit(code);
    }
}
