use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::error::ReconError;

/// Two amounts match only when they differ by strictly less than this.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// Slack subtracted from [`AMOUNT_TOLERANCE`] so that amounts exactly one
/// cent apart stay unmatched despite binary rounding (50.01 - 50.00 is
/// 0.00999999999999801 in f64).
pub const AMOUNT_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LedgerSide {
    #[serde(rename = "ledger_a")]
    A,
    #[serde(rename = "ledger_b")]
    B,
}

impl std::fmt::Display for LedgerSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "ledger_a"),
            Self::B => write!(f, "ledger_b"),
        }
    }
}

/// The typed core of one ledger row. `None` means the cell could not be
/// parsed. An empty `vehicle_id` is an unknown vehicle. A transaction with
/// any unknown field never takes part in a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub timestamp: Option<NaiveDateTime>,
    pub amount: Option<f64>,
    pub vehicle_id: String,
}

impl Transaction {
    pub fn new(
        timestamp: Option<NaiveDateTime>,
        amount: Option<f64>,
        vehicle_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            amount,
            vehicle_id: vehicle_id.into(),
        }
    }

    /// Timestamp and amount, if both are known and the vehicle id is not empty.
    pub fn eligible(&self) -> Option<(NaiveDateTime, f64)> {
        if self.vehicle_id.is_empty() {
            return None;
        }
        Some((self.timestamp?, self.amount?))
    }

    pub fn is_eligible(&self) -> bool {
        self.eligible().is_some()
    }
}

/// Positions of the mapped columns within a ledger's header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnIndex {
    pub timestamp: usize,
    pub amount: usize,
    pub vehicle_id: usize,
}

/// One ingested ledger. `transactions[i]` was parsed from `rows[i]`; both
/// vectors keep file order and always have the same length.
#[derive(Debug, Clone, Serialize)]
pub struct Ledger {
    pub side: LedgerSide,
    pub headers: Vec<String>,
    pub columns: ColumnIndex,
    pub transactions: Vec<Transaction>,
    #[serde(skip)]
    pub rows: Vec<Vec<String>>,
}

impl Ledger {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn ineligible_count(&self) -> usize {
        self.transactions.iter().filter(|t| !t.is_eligible()).count()
    }
}

pub struct ReconInput {
    pub ledger_a: Ledger,
    pub ledger_b: Ledger,
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

/// Half-width of the matching time window, in hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchTolerance {
    hours: f64,
}

impl MatchTolerance {
    pub const DEFAULT_HOURS: f64 = 1.0;
    pub const MAX_HOURS: f64 = 24.0;

    pub fn from_hours(hours: f64) -> Result<Self, ReconError> {
        if !hours.is_finite() || !(0.0..=Self::MAX_HOURS).contains(&hours) {
            return Err(ReconError::ToleranceOutOfRange(hours));
        }
        Ok(Self { hours })
    }

    pub fn hours(&self) -> f64 {
        self.hours
    }

    /// The window as an exact duration, rounded to the millisecond.
    pub fn window(&self) -> Duration {
        Duration::milliseconds((self.hours * 3_600_000.0).round() as i64)
    }
}

impl Default for MatchTolerance {
    fn default() -> Self {
        Self {
            hours: Self::DEFAULT_HOURS,
        }
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// A ledger A / ledger B pair that satisfies the match predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub a_index: usize,
    pub b_index: usize,
    pub a: Transaction,
    pub b: Transaction,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedRecord {
    pub index: usize,
    pub transaction: Transaction,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub count_a: usize,
    pub count_b: usize,
    /// Number of candidate pairs, not of distinct matched A records.
    pub count_matches: usize,
    pub matched_a_records: usize,
    pub ineligible_a: usize,
    pub ineligible_b: usize,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub pairs: Vec<MatchCandidate>,
    pub flagged: Vec<FlaggedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub tolerance_hours: f64,
    pub amount_tolerance: f64,
}
