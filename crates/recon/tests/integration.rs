use std::path::PathBuf;

use fleetmatch_recon::config::ReconConfig;
use fleetmatch_recon::engine::{run, RunOptions};
use fleetmatch_recon::export::{write_flagged_csv, write_pairs_csv};
use fleetmatch_recon::model::{LedgerSide, MatchTolerance, ReconInput, ReconResult};
use fleetmatch_recon::normalize::load_csv_ledger;
use fleetmatch_recon::ReconError;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_input(config: &ReconConfig) -> Result<ReconInput, ReconError> {
    let dir = fixtures_dir();
    let read = |file: &str| {
        let path = dir.join(file);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
    };

    Ok(ReconInput {
        ledger_a: load_csv_ledger(LedgerSide::A, &read(&config.ledger_a.file), &config.ledger_a)?,
        ledger_b: load_csv_ledger(LedgerSide::B, &read(&config.ledger_b.file), &config.ledger_b)?,
    })
}

fn load_and_run(config_file: &str, hours: Option<f64>) -> (ReconInput, ReconResult) {
    let toml = std::fs::read_to_string(fixtures_dir().join(config_file)).unwrap();
    let config = ReconConfig::from_toml(&toml).unwrap();
    let input = load_input(&config).unwrap();
    let tolerance = match hours {
        Some(h) => MatchTolerance::from_hours(h).unwrap(),
        None => config.tolerance.to_tolerance().unwrap(),
    };
    let result = run(&config.name, &input, &RunOptions { tolerance, shards: 1 });
    (input, result)
}

// -------------------------------------------------------------------------
// Fleet card fixtures
// -------------------------------------------------------------------------

#[test]
fn fleet_default_tolerance() {
    let (_, result) = load_and_run("fleet.recon.toml", None);

    assert_eq!(result.meta.config_name, "Petron vs Soliduz, March 2024");
    assert_eq!(result.summary.count_a, 7);
    assert_eq!(result.summary.count_b, 8);
    assert_eq!(result.summary.count_matches, 6);
    assert_eq!(result.summary.matched_a_records, 4);
    assert_eq!(result.summary.ineligible_a, 2);
    assert_eq!(result.summary.ineligible_b, 0);

    let pairs: Vec<(usize, usize)> = result.pairs.iter().map(|p| (p.a_index, p.b_index)).collect();
    assert_eq!(pairs, vec![(0, 0), (1, 1), (2, 3), (2, 4), (3, 3), (3, 4)]);

    let flags: Vec<bool> = result.flagged.iter().map(|f| f.matched).collect();
    assert_eq!(flags, vec![true, true, true, true, false, false, false]);
}

#[test]
fn fleet_zero_tolerance() {
    let (_, result) = load_and_run("fleet.recon.toml", Some(0.0));
    assert_eq!(result.summary.count_matches, 0);
    assert!(result.flagged.iter().all(|f| !f.matched));
}

#[test]
fn fleet_two_hour_tolerance_picks_up_late_lane_record() {
    let (_, result) = load_and_run("fleet.recon.toml", Some(2.0));
    assert_eq!(result.summary.count_matches, 7);
    let for_a1: Vec<usize> = result
        .pairs
        .iter()
        .filter(|p| p.a_index == 1)
        .map(|p| p.b_index)
        .collect();
    assert_eq!(for_a1, vec![1, 2]);
}

#[test]
fn fleet_one_cent_across_midnight_stays_unmatched() {
    let (_, result) = load_and_run("fleet.recon.toml", Some(24.0));
    assert!(result.pairs.iter().all(|p| p.a_index != 4));
    assert!(!result.flagged[4].matched);
}

#[test]
fn fleet_exports() {
    let (input, result) = load_and_run("fleet.recon.toml", None);

    let mut pairs_csv = Vec::new();
    write_pairs_csv(&result.pairs, &mut pairs_csv).unwrap();
    let pairs_csv = String::from_utf8(pairs_csv).unwrap();
    let lines: Vec<&str> = pairs_csv.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "TransactionDateTime,Amount1,VehicleNumber1,Amount2,VehicleNumber2");
    assert_eq!(lines[1], "2024-03-01 08:15:00,150.0,WXY1234,150.0,WXY1234");
    assert_eq!(lines[4], "2024-03-01 09:05:00,60.0,BKL5678,60.004,BKL5678");

    let mut flagged_csv = Vec::new();
    write_flagged_csv(&input.ledger_a, &result.flagged, &mut flagged_csv).unwrap();
    let flagged_csv = String::from_utf8(flagged_csv).unwrap();
    let lines: Vec<&str> = flagged_csv.lines().collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(
        lines[0],
        "Card Number,Date Time,Station,Vehicle Number,Product,Transaction Amount (RM),Matched"
    );
    assert_eq!(
        lines[1],
        "7000123400001111,2024-03-01 08:15:00,PETRON JALAN KUCHING,WXY1234,DIESEL,150.0,true"
    );
    assert_eq!(lines[6], "7000123400003333,,PETRON SEREMBAN,VAN9001,DIESEL,45.0,false");
    assert_eq!(lines[7], "7000123400004444,2024-03-02 07:30:00,PETRON KLANG,JHB4321,DIESEL,,false");
}

// -------------------------------------------------------------------------
// Custom column mappings
// -------------------------------------------------------------------------

#[test]
fn custom_columns_and_formats() {
    let (_, result) = load_and_run("custom.recon.toml", None);
    assert_eq!(result.meta.tolerance_hours, 0.5);
    assert_eq!(result.summary.count_a, 2);
    assert_eq!(result.summary.count_b, 2);
    assert_eq!(result.summary.count_matches, 1);
    assert_eq!((result.pairs[0].a_index, result.pairs[0].b_index), (0, 0));
    assert!(result.flagged[0].matched);
    assert!(!result.flagged[1].matched);
}

// -------------------------------------------------------------------------
// Errors
// -------------------------------------------------------------------------

#[test]
fn schema_error_names_missing_columns() {
    let config = ReconConfig::for_files("petron.csv", "missing_columns.csv", 1.0);
    config.validate().unwrap();

    let err = match load_input(&config) {
        Ok(_) => panic!("expected a schema error"),
        Err(e) => e,
    };
    match err {
        ReconError::Schema { ledger, missing } => {
            assert_eq!(ledger, "ledger_b");
            assert_eq!(missing, vec!["TransactionDateTime".to_string(), "Amount".to_string()]);
        }
        other => panic!("expected schema error, got {other}"),
    }
}

#[test]
fn sharded_run_is_identical() {
    let toml = std::fs::read_to_string(fixtures_dir().join("fleet.recon.toml")).unwrap();
    let config = ReconConfig::from_toml(&toml).unwrap();
    let input = load_input(&config).unwrap();

    let inline = run(&config.name, &input, &RunOptions::default());
    let sharded = run(
        &config.name,
        &input,
        &RunOptions { tolerance: MatchTolerance::default(), shards: 3 },
    );
    assert_eq!(inline.pairs, sharded.pairs);
    assert_eq!(inline.flagged, sharded.flagged);
    assert_eq!(inline.summary, sharded.summary);
}
