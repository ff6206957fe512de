// ── Decision Orchestrator ───────────────────────────────────────────────
// Runs the cascade in the exact order mandated by the protocol: Mask ->
// Freshness -> Seal -> Replay. The order is part of the security
// contract — it controls which failures promote to SHADOW vs MIRROR.
// Owns the two mutable stores (nonce table, failure ledger) for the
// lifetime of the engine instance.

use log::debug;

use crate::atoms::types::{DenialReason, EngineConfig, Reality, RequestEnvelope};
use crate::ledger::FailureLedger;
use crate::replay::{ReplayGuard, ReplayOutcome};
use crate::{freshness, mask, sanitize, seal, shadow};

/// Result of running the cascade against one request, before any body is
/// rendered or any timing delay is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub reality: Reality,
    /// `None` for `Reality::Prime`; otherwise the check that denied
    /// PRIME status. Internal-only — never serialized into a response.
    pub reason: Option<DenialReason>,
}

/// Owns the per-process mutable state (nonce table, failure ledger) and
/// the immutable configuration. Constructed once per process and shared
/// (e.g. behind an `Arc`) across concurrent request handlers.
pub struct Engine {
    config: EngineConfig,
    replay_guard: ReplayGuard,
    failure_ledger: FailureLedger,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let retention_ms = config.max_age_ms
            * crate::atoms::constants::NONCE_RETENTION_MULTIPLE;
        let replay_guard = ReplayGuard::new(retention_ms);
        let failure_ledger = FailureLedger::new(config.max_failures, config.failure_window_ms);
        Self {
            config,
            replay_guard,
            failure_ledger,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the cascade: Mask -> Freshness -> Seal -> Replay, against
    /// wall-clock time `now_ms`. Pure with respect to the envelope
    /// (no sleeping, no response rendering) but mutates the nonce table
    /// and failure ledger as a side effect, exactly as the protocol
    /// requires (a replay check or a failure count only means something
    /// once recorded).
    pub fn decide(&self, envelope: &RequestEnvelope, now_ms: i64) -> Decision {
        // 1. Mask Validator: a topological error, never fed to the
        // failure ledger (spec §7: cheap for a naive attacker to trigger,
        // escalating on it would itself be a DoS vector).
        if !mask::is_valid(envelope.mask) {
            debug!(target: "elp_core::orchestrator", "cascade: malformed mask from {}", envelope.fingerprint);
            return Decision {
                reality: Reality::Shadow,
                reason: Some(DenialReason::MalformedMask),
            };
        }

        // 2. Freshness Checker: a stale or future-dated clock is common
        // and benign, so it routes to MIRROR, not SHADOW.
        if !freshness::is_fresh(envelope.timestamp_ms, now_ms, self.config.max_age_ms) {
            debug!(target: "elp_core::orchestrator", "cascade: stale/future timestamp from {}", envelope.fingerprint);
            return Decision {
                reality: Reality::Mirror,
                reason: Some(DenialReason::StaleOrFutureTimestamp),
            };
        }

        // 3. Seal Computer + constant-time compare: only this check
        // feeds the Failure Ledger.
        let seal_ok = seal::verify(
            &self.config.secret,
            &envelope.seal,
            envelope.mask,
            &envelope.context,
            envelope.timestamp_ms,
            &envelope.path,
            &envelope.nonce,
        );
        if !seal_ok {
            let reality = self.failure_ledger.record_failure(&envelope.fingerprint, now_ms);
            debug!(target: "elp_core::orchestrator", "cascade: seal mismatch from {} -> {}", envelope.fingerprint, reality);
            return Decision {
                reality,
                reason: Some(DenialReason::SealMismatch),
            };
        }

        // 4. Replay Guard: the last step, so only nonces from requests
        // that already passed every prior check are ever inserted.
        if self.replay_guard.check_and_insert(&envelope.nonce, now_ms) == ReplayOutcome::Replay {
            debug!(target: "elp_core::orchestrator", "cascade: nonce replay from {}", envelope.fingerprint);
            return Decision {
                reality: Reality::Shadow,
                reason: Some(DenialReason::NonceReplay),
            };
        }

        Decision {
            reality: Reality::Prime,
            reason: None,
        }
    }

    /// Renders the response body for a non-PRIME decision. `real_payload`
    /// is the real handler's output if the caller has it available (e.g.
    /// a read-only endpoint that was already computed); `None` is
    /// acceptable for MIRROR too, in which case an empty string is
    /// sanitized, yielding an all-placeholder body rather than failing.
    ///
    /// # Panics
    /// Panics if `reality` is `Reality::Prime` — PRIME responses are the
    /// real handler's output verbatim and are never rendered here.
    pub fn render_body(
        &self,
        reality: Reality,
        envelope: &RequestEnvelope,
        real_payload: Option<&str>,
        now_ms: i64,
    ) -> String {
        match reality {
            Reality::Prime => unreachable!("PRIME responses are forwarded, not rendered"),
            Reality::Mirror => sanitize::sanitize(real_payload.unwrap_or_default()),
            Reality::Shadow => {
                let payload = shadow::generate(
                    &envelope.path,
                    &envelope.context,
                    &envelope.nonce,
                    &self.config.secret,
                    now_ms,
                );
                serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string())
            }
        }
    }

    /// Convenience entry point for synchronous embedders (and tests):
    /// runs the cascade, and for non-PRIME outcomes renders the body and
    /// blocks for the equalization delay before returning. Async hosts
    /// (see `elp-axum`) should call `decide`/`render_body` directly and
    /// await `elp_core::timing::equalize_async` instead.
    pub fn process_sync(
        &self,
        envelope: &RequestEnvelope,
        real_payload: Option<&str>,
    ) -> Outcome {
        let now_ms = freshness::now_ms().unwrap_or(envelope.timestamp_ms);
        let decision = self.decide(envelope, now_ms);
        match decision.reality {
            Reality::Prime => Outcome::Prime,
            non_prime => {
                let body = self.render_body(non_prime, envelope, real_payload, now_ms);
                crate::timing::equalize_blocking(
                    self.config.equalize_low_ms,
                    self.config.equalize_high_ms,
                );
                Outcome::NonPrime {
                    reality: non_prime,
                    body,
                }
            }
        }
    }
}

/// Final outcome of a fully-processed request. Every response — whatever
/// `reality` produced it — is emitted as HTTP 200 by the caller; this
/// type exists purely to let the caller choose which body to send, never
/// to decide a status code.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Forward to the real handler and return its response verbatim.
    Prime,
    NonPrime { reality: Reality, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"SUA_CHAVE_MESTRA_AQUI";
    const PATH: &str = "/api/v1/resource";
    const CONTEXT: &str = "GET";

    fn engine() -> Engine {
        Engine::new(
            EngineConfig::builder()
                .secret(SECRET.to_vec())
                .build()
                .unwrap(),
        )
    }

    fn sealed_envelope(mask: i64, timestamp_ms: i64, nonce: &str, fingerprint: &str) -> RequestEnvelope {
        let seal = seal::compute(SECRET, mask, CONTEXT, timestamp_ms, PATH, nonce);
        RequestEnvelope {
            mask,
            seal,
            timestamp_ms,
            nonce: nonce.to_string(),
            context: CONTEXT.to_string(),
            path: PATH.to_string(),
            fingerprint: fingerprint.to_string(),
        }
    }

    #[test]
    fn scenario_1_fully_authentic_request_is_prime() {
        let engine = engine();
        let now = 10_000_000;
        let envelope = sealed_envelope(5, now, "n-1", "fp-1");
        let decision = engine.decide(&envelope, now);
        assert_eq!(decision.reality, Reality::Prime);
        assert_eq!(decision.reason, None);
    }

    #[test]
    fn scenario_2_adjacent_bit_mask_is_shadow_without_ledger_bump() {
        let engine = engine();
        let now = 10_000_000;
        let mut envelope = sealed_envelope(5, now, "n-2", "fp-2");
        envelope.mask = 6; // 0b110, adjacent bits
        let decision = engine.decide(&envelope, now);
        assert_eq!(decision.reality, Reality::Shadow);
        assert_eq!(decision.reason, Some(DenialReason::MalformedMask));
        assert_eq!(engine.failure_ledger.current_count("fp-2"), 0);

        let body = engine.render_body(decision.reality, &envelope, None, now);
        assert_eq!(shadow::find_forbidden_marker(&body), None);
    }

    #[test]
    fn scenario_3_forged_seal_promotes_mirror_then_shadow() {
        let engine = engine();
        let now = 10_000_000;
        let mut envelope = sealed_envelope(5, now, "n-3", "fp-3");
        envelope.seal = "A".repeat(envelope.seal.len());

        for i in 1..=5 {
            let mut attempt = envelope.clone();
            attempt.nonce = format!("n-3-{i}");
            let decision = engine.decide(&attempt, now);
            assert_eq!(decision.reality, Reality::Mirror, "attempt {i}");
        }

        let mut sixth = envelope.clone();
        sixth.nonce = "n-3-6".to_string();
        let decision = engine.decide(&sixth, now);
        assert_eq!(decision.reality, Reality::Shadow);
    }

    #[test]
    fn scenario_4_stale_timestamp_is_mirror() {
        let engine = engine();
        let now = 10_000_000;
        let ts = now - 600_000; // 10 minutes old, beyond default 5-minute window
        let envelope = sealed_envelope(5, ts, "n-4", "fp-4");
        let decision = engine.decide(&envelope, now);
        assert_eq!(decision.reality, Reality::Mirror);
        assert_eq!(decision.reason, Some(DenialReason::StaleOrFutureTimestamp));
    }

    #[test]
    fn scenario_5_replayed_nonce_is_shadow() {
        let engine = engine();
        let now = 10_000_000;
        let envelope = sealed_envelope(5, now, "n-5", "fp-5");
        assert_eq!(engine.decide(&envelope, now).reality, Reality::Prime);
        assert_eq!(engine.decide(&envelope, now).reality, Reality::Shadow);
    }

    #[test]
    fn scenario_6_first_send_prime_second_send_shadow() {
        let engine = engine();
        let now = 10_000_000;
        let envelope = sealed_envelope(5, now, "n-6", "fp-6");
        let first = engine.decide(&envelope, now);
        let second = engine.decide(&envelope, now);
        assert_eq!(first.reality, Reality::Prime);
        assert_eq!(second.reality, Reality::Shadow);
    }

    #[test]
    fn at_most_one_of_two_identical_nonce_requests_sees_prime() {
        let engine = engine();
        let now = 10_000_000;
        let envelope = sealed_envelope(5, now, "shared-nonce", "fp-7");
        let outcomes: Vec<_> = (0..5).map(|_| engine.decide(&envelope, now).reality).collect();
        assert_eq!(outcomes.iter().filter(|r| **r == Reality::Prime).count(), 1);
    }

    #[test]
    fn missing_headers_default_to_malformed_and_route_to_shadow() {
        let engine = engine();
        let envelope = RequestEnvelope::new(None, None, None, None, "GET", PATH, "fp-8");
        let decision = engine.decide(&envelope, 10_000_000);
        assert_eq!(decision.reality, Reality::Shadow);
        assert_eq!(decision.reason, Some(DenialReason::MalformedMask));
    }

    #[test]
    fn mirror_body_is_sanitized_real_payload() {
        let engine = engine();
        let now = 10_000_000;
        let ts = now - 600_000;
        let envelope = sealed_envelope(5, ts, "n-mirror", "fp-9");
        let decision = engine.decide(&envelope, now);
        assert_eq!(decision.reality, Reality::Mirror);
        let body = engine.render_body(decision.reality, &envelope, Some("Saldo: R$ 5.000,00"), now);
        assert_eq!(body, "Saldo: R$ *.***,**");
    }

    #[test]
    fn process_sync_prime_path_returns_prime_outcome() {
        let engine = engine();
        let now = freshness::now_ms().unwrap();
        let envelope = sealed_envelope(5, now, "n-sync-1", "fp-10");
        assert_eq!(engine.process_sync(&envelope, None), Outcome::Prime);
    }

    #[test]
    fn process_sync_non_prime_path_renders_a_body() {
        let engine = engine();
        let now = freshness::now_ms().unwrap();
        let mut envelope = sealed_envelope(5, now, "n-sync-2", "fp-11");
        envelope.mask = 6;
        match engine.process_sync(&envelope, None) {
            Outcome::NonPrime { reality, body } => {
                assert_eq!(reality, Reality::Shadow);
                assert!(!body.is_empty());
            }
            Outcome::Prime => panic!("expected a non-PRIME outcome"),
        }
    }
}
