//! End-to-end cascade scenarios exercised through the public `Engine` API
//! only (no internal module access), mirroring the six reference attack
//! scenarios plus the two invariants called out for this engine.

use elp_core::{DenialReason, Engine, EngineConfig, Outcome, Reality, RequestEnvelope};

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

fn envelope(mask: i64, timestamp_ms: i64, nonce: &str, fingerprint: &str) -> RequestEnvelope {
    let seal = elp_core::seal::compute(SECRET, mask, CONTEXT, timestamp_ms, PATH, nonce);
    RequestEnvelope::new(
        Some(mask),
        Some(seal),
        Some(timestamp_ms),
        Some(nonce.to_string()),
        CONTEXT,
        PATH,
        fingerprint,
    )
}

#[test]
fn authentic_request_is_prime() {
    let engine = engine();
    let now = 50_000_000;
    let req = envelope(5, now, "it-1", "fp-it-1");
    assert_eq!(engine.decide(&req, now).reality, Reality::Prime);
}

#[test]
fn malformed_header_defaults_deny_without_a_visible_error() {
    let engine = engine();
    let req = RequestEnvelope::new(None, None, None, None, CONTEXT, PATH, "fp-it-2");
    let decision = engine.decide(&req, 50_000_000);
    // Routed to SHADOW, not an error: the orchestrator never produces
    // anything a caller could distinguish from a normal 200.
    assert_eq!(decision.reality, Reality::Shadow);
    assert_eq!(decision.reason, Some(DenialReason::MalformedMask));
}

#[test]
fn tampered_seal_escalates_after_repeated_offenses() {
    let engine = engine();
    let now = 50_000_000;
    let mut bad = envelope(5, now, "it-3-0", "fp-it-3");
    bad.seal = "A".repeat(bad.seal.len());

    let mut realities = Vec::new();
    for i in 0..6 {
        let mut attempt = bad.clone();
        attempt.nonce = format!("it-3-{i}");
        realities.push(engine.decide(&attempt, now).reality);
    }
    assert!(realities[0..5].iter().all(|r| *r == Reality::Mirror));
    assert_eq!(realities[5], Reality::Shadow);
}

#[test]
fn stale_timestamp_is_mirror_not_shadow() {
    let engine = engine();
    let now = 50_000_000;
    let req = envelope(5, now - 1_000_000, "it-4", "fp-it-4");
    let decision = engine.decide(&req, now);
    assert_eq!(decision.reality, Reality::Mirror);
    assert_eq!(decision.reason, Some(DenialReason::StaleOrFutureTimestamp));
}

#[test]
fn replayed_nonce_is_shadow() {
    let engine = engine();
    let now = 50_000_000;
    let req = envelope(5, now, "it-5", "fp-it-5");
    assert_eq!(engine.decide(&req, now).reality, Reality::Prime);
    assert_eq!(engine.decide(&req, now).reality, Reality::Shadow);
}

#[test]
fn resending_same_request_twice_is_prime_then_shadow() {
    let engine = engine();
    let now = 50_000_000;
    let req = envelope(9, now, "it-6", "fp-it-6");
    let first = engine.decide(&req, now);
    let second = engine.decide(&req, now);
    assert_eq!(first.reality, Reality::Prime);
    assert_eq!(second.reality, Reality::Shadow);
}

#[test]
fn invariant_at_most_one_prime_per_shared_nonce() {
    let engine = engine();
    let now = 50_000_000;
    let req = envelope(5, now, "shared", "fp-it-7");
    let primes = (0..10)
        .map(|_| engine.decide(&req, now).reality)
        .filter(|r| *r == Reality::Prime)
        .count();
    assert_eq!(primes, 1);
}

#[test]
fn invariant_shadow_body_never_leaks_a_forbidden_marker() {
    let engine = engine();
    let now = 50_000_000;
    let req = envelope(6, now, "it-8", "fp-it-8"); // 0b110: adjacent bits, invalid mask
    let decision = engine.decide(&req, now);
    assert_eq!(decision.reality, Reality::Shadow);
    let body = engine.render_body(decision.reality, &req, None, now);
    for marker in ["shadow", "fake", "synthetic", "dummy", "vault"] {
        assert!(!body.to_lowercase().contains(marker), "body leaked marker {marker}: {body}");
    }
}

#[test]
fn process_sync_round_trip_prime_and_non_prime() {
    let engine = engine();
    let now = elp_core::freshness::now_ms().unwrap();

    let good = envelope(5, now, "it-9-good", "fp-it-9");
    assert_eq!(engine.process_sync(&good, None), Outcome::Prime);

    let mut stale = envelope(5, now, "it-9-stale", "fp-it-9");
    stale.timestamp_ms = now - 1_000_000;
    match engine.process_sync(&stale, Some("senha: hunter2")) {
        Outcome::NonPrime { reality, body } => {
            assert_eq!(reality, Reality::Mirror);
            assert!(body.contains("senha=********"));
        }
        Outcome::Prime => panic!("expected MIRROR"),
    }
}
