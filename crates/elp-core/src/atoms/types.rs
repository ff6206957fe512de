// ── Atoms: Data Model ───────────────────────────────────────────────────
// The request envelope, the internal reality label, per-request denial
// reasons, and the engine's immutable configuration.

use crate::atoms::constants::{
    DEFAULT_FAILURE_WINDOW_MS, DEFAULT_MAX_AGE_MS, DEFAULT_MAX_FAILURES, MAX_NONCE_BYTES,
};
use crate::atoms::error::{EngineError, EngineResult};

/// A single request's worth of protocol fields, derived per call and
/// discarded after the response is emitted. Never persisted.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// Capability bitset. Signed so that a missing/unparseable header can
    /// be represented as `-1` (always Zeckendorf-invalid) without an
    /// `Option` wrapper, matching the reference middleware's default.
    pub mask: i64,
    /// Claimed HMAC seal, base64 standard-with-padding.
    pub seal: String,
    /// Milliseconds since the Unix epoch, as claimed by the client.
    pub timestamp_ms: i64,
    /// Client-chosen nonce, expected unique within the freshness window.
    pub nonce: String,
    /// HTTP method, e.g. "GET".
    pub context: String,
    /// Request path, verbatim, no query string.
    pub path: String,
    /// Opaque per-client identifier (typically the source IP).
    pub fingerprint: String,
}

impl RequestEnvelope {
    /// Builds an envelope from already-parsed fields, applying the same
    /// malformed-value defaults the protocol assigns to absent headers
    /// (spec §6): missing mask -> -1, timestamp -> 0, seal/nonce -> "".
    pub fn new(
        mask: Option<i64>,
        seal: Option<String>,
        timestamp_ms: Option<i64>,
        nonce: Option<String>,
        context: impl Into<String>,
        path: impl Into<String>,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            mask: mask.unwrap_or(-1),
            seal: seal.unwrap_or_default(),
            timestamp_ms: timestamp_ms.unwrap_or(0),
            nonce: clamp_nonce(nonce.unwrap_or_default()),
            context: context.into(),
            path: path.into(),
            fingerprint: fingerprint.into(),
        }
    }
}

/// Clamps an opaque nonce to the protocol's maximum length (spec §6:
/// "opaque string ... <= 128 bytes"), truncating at a UTF-8 char
/// boundary rather than rejecting the request outright. A compliant
/// client's nonce already fits and is untouched; this only keeps a
/// client that already holds a valid secret from growing the replay
/// guard's table without bound by sending an oversized one.
fn clamp_nonce(nonce: String) -> String {
    if nonce.len() <= MAX_NONCE_BYTES {
        return nonce;
    }
    let mut end = MAX_NONCE_BYTES;
    while end > 0 && !nonce.is_char_boundary(end) {
        end -= 1;
    }
    nonce[..end].to_string()
}

/// The internal reality label. Never serialized into a response body or
/// header — see `elp_core::orchestrator` and the `elp-axum` adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reality {
    Prime,
    Mirror,
    Shadow,
}

impl std::fmt::Display for Reality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prime => write!(f, "PRIME"),
            Self::Mirror => write!(f, "MIRROR"),
            Self::Shadow => write!(f, "SHADOW"),
        }
    }
}

/// Why a request was denied PRIME status. Used internally for routing and
/// for debug-level logging only — never surfaced to the caller as an
/// HTTP error and never included in a response (spec §7: "No error is
/// user-visible as an error").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    MalformedMask,
    StaleOrFutureTimestamp,
    SealMismatch,
    NonceReplay,
}

impl DenialReason {
    /// Whether a denial of this kind feeds the per-fingerprint failure
    /// ledger. Per spec §7, only seal mismatches count — mask/timestamp/
    /// nonce errors are cheap for a naive attacker to produce and
    /// escalating on them would itself be a DoS vector.
    pub fn counts_toward_ledger(self) -> bool {
        matches!(self, Self::SealMismatch)
    }
}

/// Immutable configuration, supplied once at construction.
#[derive(Clone)]
pub struct EngineConfig {
    pub secret: Vec<u8>,
    pub max_age_ms: i64,
    pub max_failures: u32,
    pub failure_window_ms: i64,
    pub equalize_low_ms: u64,
    pub equalize_high_ms: u64,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for `EngineConfig`. Every field has a spec-mandated default
/// except `secret`, which has none — callers must supply the HMAC key.
pub struct EngineConfigBuilder {
    secret: Option<Vec<u8>>,
    max_age_ms: i64,
    max_failures: u32,
    failure_window_ms: i64,
    equalize_low_ms: u64,
    equalize_high_ms: u64,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self {
            secret: None,
            max_age_ms: DEFAULT_MAX_AGE_MS,
            max_failures: DEFAULT_MAX_FAILURES,
            failure_window_ms: DEFAULT_FAILURE_WINDOW_MS,
            // Chosen to overlap the demo handler's own 10-50ms jitter
            // (see elp-demo's server binary) per spec §9's open question.
            equalize_low_ms: 15,
            equalize_high_ms: 60,
        }
    }
}

impl EngineConfigBuilder {
    pub fn secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn max_age_ms(mut self, value: i64) -> Self {
        self.max_age_ms = value;
        self
    }

    pub fn max_failures(mut self, value: u32) -> Self {
        self.max_failures = value;
        self
    }

    pub fn failure_window_ms(mut self, value: i64) -> Self {
        self.failure_window_ms = value;
        self
    }

    pub fn equalize_bounds_ms(mut self, low: u64, high: u64) -> Self {
        self.equalize_low_ms = low;
        self.equalize_high_ms = high;
        self
    }

    pub fn build(self) -> EngineResult<EngineConfig> {
        let secret = self
            .secret
            .ok_or_else(|| EngineError::config("secret is required"))?;
        if secret.is_empty() {
            return Err(EngineError::config("secret must not be empty"));
        }
        if self.equalize_low_ms > self.equalize_high_ms {
            return Err(EngineError::config(
                "equalize_low_ms must not exceed equalize_high_ms",
            ));
        }
        Ok(EngineConfig {
            secret,
            max_age_ms: self.max_age_ms,
            max_failures: self.max_failures,
            failure_window_ms: self.failure_window_ms,
            equalize_low_ms: self.equalize_low_ms,
            equalize_high_ms: self.equalize_high_ms,
        })
    }
}
