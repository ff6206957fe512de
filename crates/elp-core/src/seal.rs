// ── Seal Computer ───────────────────────────────────────────────────────
// Deterministic HMAC-SHA256 over a canonical request fingerprint,
// base64-encoded (standard alphabet, padded). Comparison against a
// client-supplied seal is constant-time over the decoded MAC bytes.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::atoms::constants::SEAL_FIELD_SEPARATOR;

type HmacSha256 = Hmac<Sha256>;

/// Builds the canonical seal input string:
/// `"{mask}|{context}|{timestamp}|{path}|{nonce}"`, in exactly that
/// field order, with `|` separators and no surrounding whitespace.
pub fn canonical_input(mask: i64, context: &str, timestamp_ms: i64, path: &str, nonce: &str) -> String {
    let sep = SEAL_FIELD_SEPARATOR;
    format!("{mask}{sep}{context}{sep}{timestamp_ms}{sep}{path}{sep}{nonce}")
}

/// Computes the base64(HMAC-SHA256(secret, canonical_input)) seal.
pub fn compute(secret: &[u8], mask: i64, context: &str, timestamp_ms: i64, path: &str, nonce: &str) -> String {
    let input = canonical_input(mask, context, timestamp_ms, path, nonce);
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts a key of any length");
    mac.update(input.as_bytes());
    let digest = mac.finalize().into_bytes();
    base64::engine::general_purpose::STANDARD.encode(digest)
}

/// Constant-time comparison of a claimed seal against the expected one.
/// Returns `false` (never panics) on a malformed/undecodable claimed
/// seal — a parse failure is just another form of mismatch.
pub fn verify(
    secret: &[u8],
    claimed_seal: &str,
    mask: i64,
    context: &str,
    timestamp_ms: i64,
    path: &str,
    nonce: &str,
) -> bool {
    let expected = compute(secret, mask, context, timestamp_ms, path, nonce);

    let expected_bytes = match base64::engine::general_purpose::STANDARD.decode(&expected) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let claimed_bytes = match base64::engine::general_purpose::STANDARD.decode(claimed_seal) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    // Different lengths would short-circuit `ct_eq`'s underlying slice
    // comparison anyway, but checking explicitly keeps the intent clear
    // and avoids relying on `ct_eq`'s panic-vs-false behavior on mismatched
    // lengths across subtle versions.
    if expected_bytes.len() != claimed_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(&claimed_bytes).into()
}
