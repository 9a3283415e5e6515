use std::collections::HashSet;

use chrono::NaiveDateTime;
use ordered_float::OrderedFloat;

use crate::model::{FlaggedRecord, MatchCandidate, ReconSummary, Transaction};

/// Value identity of a transaction; equal rows at different positions share
/// one key.
#[derive(Debug, PartialEq, Eq, Hash)]
struct ValueKey<'a> {
    timestamp: NaiveDateTime,
    amount: OrderedFloat<f64>,
    vehicle_id: &'a str,
}

impl<'a> ValueKey<'a> {
    fn of(t: &'a Transaction) -> Option<Self> {
        let (timestamp, amount) = t.eligible()?;
        Some(Self {
            timestamp,
            amount: OrderedFloat(amount),
            vehicle_id: &t.vehicle_id,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Aggregation {
    pub summary: ReconSummary,
    pub flagged: Vec<FlaggedRecord>,
}

/// Flag each ledger A record whose value tuple appears on the `a` side of at
/// least one candidate.
pub fn flag_matched(set_a: &[Transaction], matches: &[MatchCandidate]) -> Vec<FlaggedRecord> {
    let matched_keys: HashSet<ValueKey<'_>> =
        matches.iter().filter_map(|m| ValueKey::of(&m.a)).collect();

    set_a
        .iter()
        .enumerate()
        .map(|(index, t)| FlaggedRecord {
            index,
            transaction: t.clone(),
            matched: ValueKey::of(t).is_some_and(|k| matched_keys.contains(&k)),
        })
        .collect()
}

/// Counts plus the flagged copy of ledger A.
pub fn aggregate(
    set_a: &[Transaction],
    set_b: &[Transaction],
    matches: &[MatchCandidate],
) -> Aggregation {
    let flagged = flag_matched(set_a, matches);

    let summary = ReconSummary {
        count_a: set_a.len(),
        count_b: set_b.len(),
        count_matches: matches.len(),
        matched_a_records: flagged.iter().filter(|f| f.matched).count(),
        ineligible_a: set_a.iter().filter(|t| !t.is_eligible()).count(),
        ineligible_b: set_b.iter().filter(|t| !t.is_eligible()).count(),
    };

    Aggregation { summary, flagged }
}
