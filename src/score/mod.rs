//! Staleness scoring
//!
//! Two signals drive priority. When the contract changed after its test, the
//! gap in days is the score. Otherwise the test's own age stands in, so tests
//! nobody has touched in a long time still surface.

use crate::domain::SECONDS_PER_DAY;

/// Signed day gap between the contract's and the test's last change.
/// Positive means the contract is newer.
pub fn staleness_days(test_ts: Option<i64>, contract_ts: Option<i64>) -> Option<f64> {
    match (test_ts, contract_ts) {
        (Some(test), Some(contract)) => Some((contract - test) as f64 / SECONDS_PER_DAY),
        _ => None,
    }
}

/// Priority score; higher is more urgent. `now` is Unix seconds.
pub fn score(staleness_days: Option<f64>, test_ts: Option<i64>, now: i64) -> Option<f64> {
    match (staleness_days, test_ts) {
        (Some(stale), _) if stale > 0.0 => Some(stale),
        (_, Some(test)) => Some((now - test) as f64 / SECONDS_PER_DAY),
        _ => None,
    }
}

/// `(staleness_days, score)` for one test/contract pair.
pub fn score_pair(
    test_ts: Option<i64>,
    contract_ts: Option<i64>,
    now: i64,
) -> (Option<f64>, Option<f64>) {
    let stale = staleness_days(test_ts, contract_ts);
    (stale, score(stale, test_ts, now))
}
