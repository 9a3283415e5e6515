use std::io;

use chrono::NaiveDateTime;

use crate::error::ReconError;
use crate::model::{FlaggedRecord, Ledger, MatchCandidate};

pub const PAIRS_HEADER: [&str; 5] = [
    "TransactionDateTime",
    "Amount1",
    "VehicleNumber1",
    "Amount2",
    "VehicleNumber2",
];

pub const MATCHED_COLUMN: &str = "Matched";

pub const TIMESTAMP_EXPORT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DEFAULT_PAIRS_FILE: &str = "matched_transactions.csv";
pub const DEFAULT_FLAGGED_FILE: &str = "TransactionListing_with_matched.csv";

/// Unknown timestamps render as an empty cell.
pub fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format(TIMESTAMP_EXPORT_FORMAT).to_string())
        .unwrap_or_default()
}

/// Shortest decimal form that round-trips, always with a fractional part
/// (`50.0`, `60.004`); unknown amounts render empty.
pub fn format_amount(amount: Option<f64>) -> String {
    amount
        .map(|a| {
            let s = a.to_string();
            if s.contains('.') {
                s
            } else {
                format!("{s}.0")
            }
        })
        .unwrap_or_default()
}

/// Write the candidate pairs. The event time column carries ledger A's timestamp.
pub fn write_pairs_csv<W: io::Write>(pairs: &[MatchCandidate], writer: W) -> Result<(), ReconError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(PAIRS_HEADER)?;

    for pair in pairs {
        wtr.write_record([
            format_timestamp(pair.a.timestamp),
            format_amount(pair.a.amount),
            pair.a.vehicle_id.clone(),
            format_amount(pair.b.amount),
            pair.b.vehicle_id.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write ledger A with its original columns plus `Matched`. Mapped timestamp
/// and amount cells are re-rendered from their parsed values.
pub fn write_flagged_csv<W: io::Write>(
    ledger_a: &Ledger,
    flagged: &[FlaggedRecord],
    writer: W,
) -> Result<(), ReconError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = ledger_a.headers.iter().map(|h| h.as_str()).collect();
    header.push(MATCHED_COLUMN);
    wtr.write_record(&header)?;

    let cols = ledger_a.columns;
    for record in flagged {
        let raw = ledger_a.rows.get(record.index);
        let mut cells: Vec<String> = (0..ledger_a.headers.len())
            .map(|i| {
                if i == cols.timestamp {
                    format_timestamp(record.transaction.timestamp)
                } else if i == cols.amount {
                    format_amount(record.transaction.amount)
                } else {
                    raw.and_then(|r| r.get(i)).cloned().unwrap_or_default()
                }
            })
            .collect();
        cells.push(record.matched.to_string());
        wtr.write_record(&cells)?;
    }

    wtr.flush()?;
    Ok(())
}
