use log::info;

use crate::aggregate::{aggregate, Aggregation};
use crate::matcher::{match_candidates, match_candidates_sharded};
use crate::model::{MatchTolerance, ReconInput, ReconMeta, ReconResult, AMOUNT_TOLERANCE};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub tolerance: MatchTolerance,
    /// Number of ledger A shards to scan in parallel; 0 or 1 scans inline.
    pub shards: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tolerance: MatchTolerance::default(),
            shards: 1,
        }
    }
}

/// Match both ledgers and aggregate. Total over any pair of ledgers.
pub fn run(config_name: &str, input: &ReconInput, options: &RunOptions) -> ReconResult {
    let set_a = &input.ledger_a.transactions;
    let set_b = &input.ledger_b.transactions;

    let pairs = if options.shards > 1 {
        match_candidates_sharded(set_a, set_b, &options.tolerance, options.shards)
    } else {
        match_candidates(set_a, set_b, &options.tolerance)
    };

    let Aggregation { summary, flagged } = aggregate(set_a, set_b, &pairs);

    info!(
        "{config_name}: {} ledger A / {} ledger B record(s), {} candidate pair(s) within {}h",
        summary.count_a,
        summary.count_b,
        summary.count_matches,
        options.tolerance.hours(),
    );

    ReconResult {
        meta: ReconMeta {
            config_name: config_name.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            tolerance_hours: options.tolerance.hours(),
            amount_tolerance: AMOUNT_TOLERANCE,
        },
        summary,
        pairs,
        flagged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::model::LedgerSide;
    use crate::normalize::load_csv_ledger;

    const PETRON: &str = "\
Date Time,Transaction Amount (RM),Vehicle Number
01/01/2024 10:00,50.00,ABC123
01/01/2024 18:00,75.20,XYZ789
";

    const SOLIDUZ: &str = "\
TransactionDateTime,Amount,VehicleRegistrationNo
01/01/2024 10:30,50.00,ABC123
01/01/2024 14:00,50.00,ABC123
01/01/2024 18:00,75.20,XYZ788
";

    fn input() -> ReconInput {
        ReconInput {
            ledger_a: load_csv_ledger(LedgerSide::A, PETRON, &LedgerConfig::with_defaults("a.csv"))
                .unwrap(),
            ledger_b: load_csv_ledger(LedgerSide::B, SOLIDUZ, &LedgerConfig::with_defaults("b.csv"))
                .unwrap(),
        }
    }

    #[test]
    fn run_end_to_end() {
        let result = run("test", &input(), &RunOptions::default());
        assert_eq!(result.summary.count_a, 2);
        assert_eq!(result.summary.count_b, 3);
        assert_eq!(result.summary.count_matches, 1);
        assert_eq!(result.pairs[0].b_index, 0);
        assert!(result.flagged[0].matched);
        assert!(!result.flagged[1].matched);
        assert_eq!(result.meta.tolerance_hours, 1.0);
        assert_eq!(result.meta.amount_tolerance, 0.01);
    }

    #[test]
    fn wider_window_and_shards() {
        let options = RunOptions {
            tolerance: MatchTolerance::from_hours(4.0).unwrap(),
            shards: 2,
        };
        let result = run("test", &input(), &options);
        assert_eq!(result.summary.count_matches, 2);
        assert_eq!(result.summary.matched_a_records, 1);
    }

    #[test]
    fn result_serializes() {
        let result = run("test", &input(), &RunOptions::default());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["count_matches"], 1);
        assert_eq!(json["pairs"][0]["a"]["vehicle_id"], "ABC123");
        assert_eq!(json["pairs"][0]["a"]["timestamp"], "2024-01-01T10:00:00");
        assert_eq!(json["flagged"][1]["matched"], false);
    }
}
