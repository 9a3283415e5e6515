use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use crate::model::{MatchCandidate, MatchTolerance, Transaction, AMOUNT_EPSILON, AMOUNT_TOLERANCE};

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// Closed window: `b` may sit exactly `window` before or after `a`.
pub fn within_window(a: NaiveDateTime, b: NaiveDateTime, window: Duration) -> bool {
    let offset = b - a;
    offset >= -window && offset <= window
}

/// Open band: amounts exactly one cent apart do not agree.
pub fn amounts_agree(a: f64, b: f64) -> bool {
    (a - b).abs() < AMOUNT_TOLERANCE - AMOUNT_EPSILON
}

/// The full match predicate. False whenever either side has an unknown field.
pub fn is_candidate(a: &Transaction, b: &Transaction, tolerance: &MatchTolerance) -> bool {
    let (Some((a_ts, a_amt)), Some((b_ts, b_amt))) = (a.eligible(), b.eligible()) else {
        return false;
    };
    a.vehicle_id == b.vehicle_id
        && within_window(a_ts, b_ts, tolerance.window())
        && amounts_agree(a_amt, b_amt)
}

// ---------------------------------------------------------------------------
// Ledger B index
// ---------------------------------------------------------------------------

/// Eligible ledger B positions grouped by vehicle id, ascending within each
/// vehicle. Read-only once built.
#[derive(Debug)]
pub struct VehicleIndex<'a> {
    by_vehicle: HashMap<&'a str, Vec<usize>>,
}

impl<'a> VehicleIndex<'a> {
    pub fn build(set_b: &'a [Transaction]) -> Self {
        let mut by_vehicle: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (i, b) in set_b.iter().enumerate() {
            if b.is_eligible() {
                by_vehicle.entry(b.vehicle_id.as_str()).or_default().push(i);
            }
        }
        Self { by_vehicle }
    }

    pub fn positions(&self, vehicle_id: &str) -> &[usize] {
        self.by_vehicle
            .get(vehicle_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn vehicle_count(&self) -> usize {
        self.by_vehicle.len()
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Every (a, b) pair satisfying the match predicate, ordered by ledger A
/// position then ledger B position. No deduplication: one record may appear
/// in any number of pairs on either side.
pub fn match_candidates(
    set_a: &[Transaction],
    set_b: &[Transaction],
    tolerance: &MatchTolerance,
) -> Vec<MatchCandidate> {
    let index = VehicleIndex::build(set_b);
    match_shard(set_a, 0, set_b, &index, tolerance)
}

/// Same output as [`match_candidates`], with ledger A split into contiguous
/// shards scanned on scoped threads against one shared index.
pub fn match_candidates_sharded(
    set_a: &[Transaction],
    set_b: &[Transaction],
    tolerance: &MatchTolerance,
    shards: usize,
) -> Vec<MatchCandidate> {
    let shards = shards.clamp(1, set_a.len().max(1));
    if shards == 1 {
        return match_candidates(set_a, set_b, tolerance);
    }

    let index = VehicleIndex::build(set_b);
    let chunk = set_a.len().div_ceil(shards);

    std::thread::scope(|s| {
        let handles: Vec<_> = set_a
            .chunks(chunk)
            .enumerate()
            .map(|(n, shard)| {
                let index = &index;
                s.spawn(move || match_shard(shard, n * chunk, set_b, index, tolerance))
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}

fn match_shard(
    shard: &[Transaction],
    offset: usize,
    set_b: &[Transaction],
    index: &VehicleIndex<'_>,
    tolerance: &MatchTolerance,
) -> Vec<MatchCandidate> {
    let window = tolerance.window();
    let mut matched = Vec::new();

    for (i, a) in shard.iter().enumerate() {
        let Some((a_ts, a_amt)) = a.eligible() else {
            continue;
        };

        for &bi in index.positions(&a.vehicle_id) {
            let b = &set_b[bi];
            let Some((b_ts, b_amt)) = b.eligible() else {
                continue;
            };
            if within_window(a_ts, b_ts, window) && amounts_agree(a_amt, b_amt) {
                matched.push(MatchCandidate {
                    a_index: offset + i,
                    b_index: bi,
                    a: a.clone(),
                    b: b.clone(),
                });
            }
        }
    }

    matched
}
