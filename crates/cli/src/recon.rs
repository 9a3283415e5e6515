//! `fleetmatch match|run|validate`: load two ledgers, match, export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use fleetmatch_recon::config::{ColumnMapping, LedgerConfig, OutputConfig};
use fleetmatch_recon::export::{
    write_flagged_csv, write_pairs_csv, DEFAULT_FLAGGED_FILE, DEFAULT_PAIRS_FILE,
};
use fleetmatch_recon::normalize::load_csv_ledger;
use fleetmatch_recon::{
    Ledger, LedgerSide, MatchTolerance, ReconConfig, ReconError, ReconInput, ReconResult,
    RunOptions,
};

use crate::exit_codes::{recon_exit_code, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_RUNTIME, EXIT_USAGE};
use crate::{CliError, RunArgs};

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError::new(code, msg)
}

fn io_err(action: &str, path: &Path, e: impl std::fmt::Display) -> CliError {
    recon_err(EXIT_RECON_RUNTIME, format!("cannot {action} {}: {e}", path.display()))
}

pub fn cmd_match(ledger_a: PathBuf, ledger_b: PathBuf, args: RunArgs) -> Result<(), CliError> {
    let config = ReconConfig::for_files(
        ledger_a.to_string_lossy(),
        ledger_b.to_string_lossy(),
        MatchTolerance::DEFAULT_HOURS,
    );
    execute(&config, Path::new(""), &args)
}

pub fn cmd_run(config_path: PathBuf, args: RunArgs) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    // Ledger and output paths resolve relative to the config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    execute(&config, base_dir, &args)
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "valid: '{}' ({} vs {}, tolerance {}h)",
        config.name, config.ledger_a.file, config.ledger_b.file, config.tolerance.hours,
    );
    Ok(())
}

fn read_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str =
        std::fs::read_to_string(config_path).map_err(|e| io_err("read config", config_path, e))?;
    ReconConfig::from_toml(&config_str).map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))
}

fn execute(config: &ReconConfig, base_dir: &Path, args: &RunArgs) -> Result<(), CliError> {
    let tolerance = resolve_tolerance(config, args)?;

    let input = ReconInput {
        ledger_a: load_ledger(LedgerSide::A, base_dir, &config.ledger_a)?,
        ledger_b: load_ledger(LedgerSide::B, base_dir, &config.ledger_b)?,
    };

    let result = fleetmatch_recon::run(
        &config.name,
        &input,
        &RunOptions { tolerance, shards: args.shards },
    );

    let outputs = OutputPaths::resolve(&config.output, base_dir, args);
    write_outputs(&input.ledger_a, &result, &outputs)?;

    if args.json {
        println!("{}", to_json(&result)?);
    }

    if !args.quiet {
        print_summary(&result);
    }

    Ok(())
}

fn resolve_tolerance(config: &ReconConfig, args: &RunArgs) -> Result<MatchTolerance, CliError> {
    match args.tolerance_hours {
        Some(hours) => MatchTolerance::from_hours(hours).map_err(|e| {
            recon_err(EXIT_USAGE, e.to_string()).with_hint("pass --tolerance-hours between 0 and 24")
        }),
        None => config
            .tolerance
            .to_tolerance()
            .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string())),
    }
}

fn load_ledger(
    side: LedgerSide,
    base_dir: &Path,
    ledger_config: &LedgerConfig,
) -> Result<Ledger, CliError> {
    let path = base_dir.join(&ledger_config.file);
    let csv_data = std::fs::read_to_string(&path).map_err(|e| io_err("read", &path, e))?;

    let ledger = load_csv_ledger(side, &csv_data, ledger_config).map_err(|e| {
        let err = recon_err(recon_exit_code(&e), format!("{}: {e}", path.display()));
        match e {
            ReconError::Schema { .. } => err.with_hint(expected_columns_hint(
                side,
                &ledger_config.resolved_columns(side),
            )),
            _ => err,
        }
    })?;

    debug!("{side}: loaded {} record(s) from {}", ledger.len(), path.display());
    Ok(ledger)
}

fn expected_columns_hint(side: LedgerSide, cols: &ColumnMapping) -> String {
    format!(
        "{side} needs columns '{}', '{}', '{}'; map other headers under [{side}.columns] in a config file",
        cols.timestamp, cols.amount, cols.vehicle_id,
    )
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq)]
struct OutputPaths {
    pairs_csv: Option<PathBuf>,
    flagged_csv: Option<PathBuf>,
    json: Option<PathBuf>,
}

impl OutputPaths {
    /// `--out-dir` writes both tables into one directory; otherwise the
    /// config's paths apply. `--output` overrides the config's JSON path.
    fn resolve(config: &OutputConfig, base_dir: &Path, args: &RunArgs) -> Self {
        let (pairs_csv, flagged_csv) = match &args.out_dir {
            Some(dir) => (
                Some(dir.join(config.matched_csv.as_deref().unwrap_or(DEFAULT_PAIRS_FILE))),
                Some(dir.join(config.flagged_csv.as_deref().unwrap_or(DEFAULT_FLAGGED_FILE))),
            ),
            None => (
                config.matched_csv.as_ref().map(|p| base_dir.join(p)),
                config.flagged_csv.as_ref().map(|p| base_dir.join(p)),
            ),
        };
        let json = args
            .output
            .clone()
            .or_else(|| config.json.as_ref().map(|p| base_dir.join(p)));

        Self { pairs_csv, flagged_csv, json }
    }
}

fn create_file(path: &Path) -> Result<BufWriter<File>, CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err("create directory", parent, e))?;
    }
    let file = File::create(path).map_err(|e| io_err("create", path, e))?;
    Ok(BufWriter::new(file))
}

fn write_outputs(ledger_a: &Ledger, result: &ReconResult, outputs: &OutputPaths) -> Result<(), CliError> {
    if let Some(ref path) = outputs.pairs_csv {
        write_pairs_csv(&result.pairs, create_file(path)?).map_err(|e| io_err("write", path, e))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = outputs.flagged_csv {
        write_flagged_csv(ledger_a, &result.flagged, create_file(path)?)
            .map_err(|e| io_err("write", path, e))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = outputs.json {
        let json_str = to_json(result)?;
        let mut file = create_file(path)?;
        file.write_all(json_str.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| io_err("write", path, e))?;
        eprintln!("wrote {}", path.display());
    }

    Ok(())
}

fn to_json(result: &ReconResult) -> Result<String, CliError> {
    serde_json::to_string_pretty(result)
        .map_err(|e| recon_err(EXIT_RECON_RUNTIME, format!("JSON serialization error: {e}")))
}

fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!("Total transactions in ledger A: {}", s.count_a);
    eprintln!("Total transactions in ledger B: {}", s.count_b);
    eprintln!(
        "Total matched transactions: {} ({} ledger A record(s) matched, tolerance {}h)",
        s.count_matches, s.matched_a_records, result.meta.tolerance_hours,
    );
    if s.ineligible_a + s.ineligible_b > 0 {
        eprintln!(
            "skipped {} ledger A / {} ledger B record(s) with an unreadable date or amount",
            s.ineligible_a, s.ineligible_b,
        );
    }
}
