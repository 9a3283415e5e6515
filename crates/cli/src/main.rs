// fleetmatch CLI - match a fuel-card ledger against a toll/payment ledger

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "fleetmatch")]
#[command(about = "Match fuel-card transactions against toll/payment records by vehicle, time and amount")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match two CSV ledgers using the default column names
    #[command(after_help = "\
Examples:
  fleetmatch match petron.csv soliduz.csv
  fleetmatch match petron.csv soliduz.csv --tolerance-hours 2 --out-dir results/
  fleetmatch match petron.csv soliduz.csv --json > result.json

Ledger A columns: 'Date Time', 'Transaction Amount (RM)', 'Vehicle Number'
Ledger B columns: 'TransactionDateTime', 'Amount', 'VehicleRegistrationNo'
Timestamps are read as dd/mm/yyyy HH:MM.")]
    Match {
        /// Fuel-card issuer ledger (ledger A)
        ledger_a: PathBuf,

        /// Toll/payment processor ledger (ledger B)
        ledger_b: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Match the ledgers described by a TOML config file
    #[command(after_help = "\
Examples:
  fleetmatch run march.recon.toml
  fleetmatch run march.recon.toml --tolerance-hours 0.5
  fleetmatch run march.recon.toml --out-dir results/ --output result.json")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Validate a config file without reading any ledger
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Half-width of the time window in hours, 0 to 24 (default 1, or the config's value)
    #[arg(long, short = 't', value_name = "HOURS")]
    pub tolerance_hours: Option<f64>,

    /// Write matched_transactions.csv and TransactionListing_with_matched.csv here
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Print the full result as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Write the full result as JSON to this file
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Split ledger A across this many threads
    #[arg(long, default_value_t = 1, env = "FLEETMATCH_SHARDS")]
    pub shards: usize,

    /// Suppress the summary on stderr
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  fleetmatch-recon ", env!("CARGO_PKG_VERSION"),
        "\namount tolerance: 0.01 (exclusive)",
    )
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Match { ledger_a, ledger_b, run } => recon::cmd_match(ledger_a, ledger_b, run),
        Commands::Run { config, run } => recon::cmd_run(config, run),
        Commands::Validate { config } => recon::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
