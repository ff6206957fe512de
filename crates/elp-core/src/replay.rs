// ── Replay Guard ────────────────────────────────────────────────────────
// Atomic test-and-insert nonce table. Entries older than the retention
// horizon are swept lazily on insert, off the hot path for the common
// case of a small table.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::atoms::constants::GC_SWEEP_THRESHOLD;

/// Outcome of a replay check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// Nonce had not been seen within the retention horizon; it is now
    /// recorded.
    Fresh,
    /// Nonce was already present and still within its retention horizon.
    Replay,
}

/// Thread-safe nonce table mapping nonce -> first-seen wall-clock ms.
///
/// This is deliberately the **last** check in the cascade (see
/// `orchestrator`): only nonces from requests that already passed mask,
/// freshness, and seal checks are ever inserted, so a flood of malformed
/// requests cannot exhaust this table's memory.
pub struct ReplayGuard {
    table: Mutex<HashMap<String, i64>>,
    retention_ms: i64,
}

impl ReplayGuard {
    pub fn new(retention_ms: i64) -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            retention_ms,
        }
    }

    /// Atomically checks whether `nonce` has been seen within the
    /// retention horizon and, if not, inserts it at `now_ms`.
    pub fn check_and_insert(&self, nonce: &str, now_ms: i64) -> ReplayOutcome {
        let mut table = self.table.lock();

        if table.len() > GC_SWEEP_THRESHOLD {
            let retention_ms = self.retention_ms;
            table.retain(|_, first_seen| now_ms - *first_seen <= retention_ms);
        }

        if let Some(first_seen) = table.get(nonce) {
            if now_ms - *first_seen <= self.retention_ms {
                return ReplayOutcome::Replay;
            }
            // Entry is past its retention horizon; treat as fresh and
            // refresh the timestamp below.
        }

        table.insert(nonce.to_string(), now_ms);
        ReplayOutcome::Fresh
    }

    /// Number of nonces currently tracked. Exposed for tests and metrics.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
