// ── Freshness Checker ───────────────────────────────────────────────────
// Validates the client-claimed timestamp against the current wall clock
// within a configurable window. Forward-dated timestamps are never
// granted tolerance.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::atoms::error::{EngineError, EngineResult};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> EngineResult<i64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .map_err(|e| EngineError::Clock(format!("system clock before epoch: {e}")))
}

/// Returns true iff `0 <= now_ms - timestamp_ms <= max_age_ms`.
/// A future-dated timestamp (negative delta) fails: clock-skew tolerance
/// is not granted forward.
pub fn is_fresh(timestamp_ms: i64, now_ms: i64, max_age_ms: i64) -> bool {
    let delta = now_ms - timestamp_ms;
    (0..=max_age_ms).contains(&delta)
}
