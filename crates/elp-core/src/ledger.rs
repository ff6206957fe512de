// ── Failure Ledger ──────────────────────────────────────────────────────
// Per-client-fingerprint sliding-window counter of seal-verification
// failures. Promotes repeat failures from MIRROR to SHADOW once a
// fingerprint crosses `max_failures` within `failure_window_ms`.
//
// This is append-then-read, not read-then-conditional-write: the whole
// record mutation happens under one lock acquisition so two concurrent
// failures from the same fingerprint are both counted, never lost.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::atoms::types::Reality;

#[derive(Debug, Clone, Copy)]
struct FailureRecord {
    count: u32,
    window_start_ms: i64,
}

pub struct FailureLedger {
    table: Mutex<HashMap<String, FailureRecord>>,
    max_failures: u32,
    failure_window_ms: i64,
}

impl FailureLedger {
    pub fn new(max_failures: u32, failure_window_ms: i64) -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            max_failures,
            failure_window_ms,
        }
    }

    /// Records one more seal-verification failure from `fingerprint` and
    /// returns the reality the caller should route to: `Mirror` while the
    /// fingerprint is merely "warned", `Shadow` once it is "banned".
    ///
    /// Never returns `Prime` — this method is only called on a failure.
    pub fn record_failure(&self, fingerprint: &str, now_ms: i64) -> Reality {
        let mut table = self.table.lock();

        let record = table
            .entry(fingerprint.to_string())
            .and_modify(|record| {
                if now_ms - record.window_start_ms > self.failure_window_ms {
                    record.count = 1;
                    record.window_start_ms = now_ms;
                } else {
                    record.count += 1;
                }
            })
            .or_insert(FailureRecord {
                count: 1,
                window_start_ms: now_ms,
            });

        if record.count > self.max_failures {
            Reality::Shadow
        } else {
            Reality::Mirror
        }
    }

    /// Current failure count for a fingerprint (0 if clean or unseen).
    /// Exposed for tests and metrics only.
    pub fn current_count(&self, fingerprint: &str) -> u32 {
        self.table
            .lock()
            .get(fingerprint)
            .map(|r| r.count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failures_yield_mirror_up_to_threshold() {
        let ledger = FailureLedger::new(5, 3_600_000);
        for i in 1..=5 {
            assert_eq!(
                ledger.record_failure("fp", 0),
                Reality::Mirror,
                "failure #{i} should still be MIRROR"
            );
        }
    }

    #[test]
    fn failure_past_threshold_yields_shadow() {
        let ledger = FailureLedger::new(5, 3_600_000);
        for _ in 1..=5 {
            ledger.record_failure("fp", 0);
        }
        assert_eq!(ledger.record_failure("fp", 0), Reality::Shadow);
    }

    #[test]
    fn window_reset_after_failure_window_elapses() {
        let ledger = FailureLedger::new(1, 1_000);
        assert_eq!(ledger.record_failure("fp", 0), Reality::Mirror);
        assert_eq!(ledger.record_failure("fp", 0), Reality::Shadow);
        // Well past the 1000ms window: record resets to (1, now).
        assert_eq!(ledger.record_failure("fp", 5_000), Reality::Mirror);
        assert_eq!(ledger.current_count("fp"), 1);
    }

    #[test]
    fn fingerprints_are_independent() {
        let ledger = FailureLedger::new(1, 3_600_000);
        assert_eq!(ledger.record_failure("attacker", 0), Reality::Mirror);
        assert_eq!(ledger.record_failure("victim-shares-nat", 0), Reality::Mirror);
        assert_eq!(ledger.current_count("attacker"), 1);
        assert_eq!(ledger.current_count("victim-shares-nat"), 1);
    }

    #[test]
    fn concurrent_failures_from_same_fingerprint_are_all_counted() {
        use std::sync::Arc;
        use std::thread;

        let ledger = Arc::new(FailureLedger::new(1_000, 3_600_000));
        let mut handles = Vec::new();
        for _ in 0..64 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                ledger.record_failure("fp", 0);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ledger.current_count("fp"), 64);
    }
}
