// ── Shadow Generator ────────────────────────────────────────────────────
// Seeded, deterministic synthetic-payload producer. Given identical
// (path, context, nonce, secret), always produces byte-identical output,
// so repeat probes from an attacker look stable and coherent. The output
// carries no literal marker identifying it as synthetic, and matches the
// shape of a legitimate PRIME response for a generic financial-resource
// endpoint.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Shape of the synthetic payload. Field names and nesting mirror the
/// real handler's response shape for `/api/v1/resource`-style endpoints
/// (spec §4.G.3); callers targeting a different endpoint schema should
/// define their own shape while reusing `seed_from` for determinism.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShadowPayload {
    pub status: String,
    pub transaction_id: String,
    pub timestamp: i64,
    pub data: ShadowData,
    pub meta: ShadowMeta,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShadowData {
    pub account_type: String,
    pub balance: f64,
    pub currency: String,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShadowMeta {
    pub processing_time_ms: u32,
    pub region: String,
}

const ACCOUNT_TYPES: &[&str] = &["checking", "savings", "investment"];

/// Derives the deterministic PRNG seed: `SHA256("{path}|{context}|{nonce}|{secret}")`,
/// reduced to a `u64` by taking the first 8 bytes of the digest.
pub fn seed_from(path: &str, context: &str, nonce: &str, secret: &[u8]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update(b"|");
    hasher.update(context.as_bytes());
    hasher.update(b"|");
    hasher.update(nonce.as_bytes());
    hasher.update(b"|");
    hasher.update(secret);
    let digest = hasher.finalize();
    u64::from_be_bytes(digest[0..8].try_into().expect("sha256 digest is 32 bytes"))
}

/// Produces a synthetic payload deterministic in `(path, context, nonce,
/// secret)`. `now_ms` supplies the (non-deterministic) wall-clock
/// timestamp field only — it does not affect the seeded fields, since a
/// SHADOW response's timestamp is expected to look like "now" just as a
/// PRIME response's would.
pub fn generate(path: &str, context: &str, nonce: &str, secret: &[u8], now_ms: i64) -> ShadowPayload {
    let seed = seed_from(path, context, nonce, secret);
    let mut rng = ChaCha20Rng::seed_from_u64(seed);

    // A UUIDv4-shaped identifier derived from the seed, not the OS RNG,
    // so it reproduces identically on every call with the same inputs.
    // `Builder::from_random_bytes` stamps the version/variant nibbles the
    // same way `Uuid::new_v4()` does, so the result is byte-for-byte a
    // valid v4 UUID rather than raw ChaCha20 output that only happens to
    // look like one roughly 1 in 16 times.
    let mut uuid_bytes = [0u8; 16];
    rng.fill(&mut uuid_bytes);
    let transaction_id = uuid::Builder::from_random_bytes(uuid_bytes)
        .into_uuid()
        .to_string();

    let account_type = ACCOUNT_TYPES[rng.gen_range(0..ACCOUNT_TYPES.len())].to_string();
    let balance = (rng.gen_range(1000_00..=500_000_00) as f64) / 100.0;
    let processing_time_ms = rng.gen_range(10..=150);

    ShadowPayload {
        status: "success".to_string(),
        transaction_id,
        timestamp: now_ms,
        data: ShadowData {
            account_type,
            balance,
            currency: "BRL".to_string(),
            flags: vec!["verified".to_string(), "secure".to_string()],
        },
        meta: ShadowMeta {
            processing_time_ms,
            region: "us-east-1".to_string(),
        },
    }
}

/// Substrings that must never appear (case-insensitively) anywhere in a
/// serialized shadow payload, per spec §4.G.2 / §8 invariant 5.
pub const FORBIDDEN_MARKERS: &[&str] = &["shadow", "fake", "synthetic", "dummy", "vault"];

/// Returns the first forbidden marker found in `text`, if any. Intended
/// for tests and for a defense-in-depth assertion before a response
/// leaves the orchestrator.
pub fn find_forbidden_marker(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    FORBIDDEN_MARKERS
        .iter()
        .find(|marker| lower.contains(*marker))
        .copied()
}
