use chrono::{NaiveDate, NaiveDateTime};
use log::debug;

use crate::config::LedgerConfig;
use crate::error::ReconError;
use crate::model::{ColumnIndex, Ledger, LedgerSide, Transaction};

/// day/month/year hour:minute, as both source systems export it.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Parse a timestamp cell. Empty or malformed cells yield `None`.
///
/// A format without time fields is accepted and resolves to midnight.
pub fn parse_timestamp(raw: &str, format: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(s, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse an amount cell. Empty, non-numeric and non-finite cells yield `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read one ledger's CSV into typed transactions.
///
/// Fails only when mapped columns are missing from the header row or the
/// data cannot be decoded as CSV; bad individual cells become unknown.
pub fn load_csv_ledger(
    side: LedgerSide,
    csv_data: &str,
    ledger_config: &LedgerConfig,
) -> Result<Ledger, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let col = ledger_config.resolved_columns(side);
    let position = |name: &str| headers.iter().position(|h| h == name);

    let mut missing = Vec::new();
    for name in [&col.timestamp, &col.amount, &col.vehicle_id] {
        if position(name.as_str()).is_none() && !missing.contains(name) {
            missing.push(name.clone());
        }
    }
    let (Some(timestamp), Some(amount), Some(vehicle_id)) = (
        position(col.timestamp.as_str()),
        position(col.amount.as_str()),
        position(col.vehicle_id.as_str()),
    ) else {
        return Err(ReconError::Schema {
            ledger: side.to_string(),
            missing,
        });
    };
    let columns = ColumnIndex {
        timestamp,
        amount,
        vehicle_id,
    };

    let mut transactions = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut unknown_timestamps = 0usize;
    let mut unknown_amounts = 0usize;

    for record in reader.records() {
        let record = record?;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let ts = parse_timestamp(cell(columns.timestamp), &ledger_config.timestamp_format);
        let amt = parse_amount(cell(columns.amount));
        if ts.is_none() {
            unknown_timestamps += 1;
        }
        if amt.is_none() {
            unknown_amounts += 1;
        }

        transactions.push(Transaction::new(ts, amt, cell(columns.vehicle_id)));
        rows.push((0..headers.len()).map(|i| cell(i).to_string()).collect());
    }

    debug!(
        "{side}: {} row(s), {unknown_timestamps} unknown timestamp(s), {unknown_amounts} unknown amount(s)",
        transactions.len()
    );

    Ok(Ledger {
        side,
        headers,
        columns,
        transactions,
        rows,
    })
}
