// ── Atoms: Constants ────────────────────────────────────────────────────
// Named constants for the crate. Collecting them here eliminates magic
// strings/numbers scattered across the cascade modules.

/// Protocol header names. Case-insensitive at the HTTP layer; these are
/// the canonical spellings used when building the seal input and when
/// adapters (e.g. `elp-axum`) look up headers.
pub const HEADER_MASK: &str = "X-ELP-Mask";
pub const HEADER_SEAL: &str = "X-ELP-Seal";
pub const HEADER_TIMESTAMP: &str = "X-ELP-Timestamp";
pub const HEADER_NONCE: &str = "X-ELP-Nonce";

/// Separator used to join fields of the canonical seal input string.
/// Must never appear as a legal character inside `context` or `path` in
/// a way that would make two distinct tuples collide after joining.
pub const SEAL_FIELD_SEPARATOR: char = '|';

/// Default freshness window: 5 minutes.
pub const DEFAULT_MAX_AGE_MS: i64 = 300_000;

/// Default MIRROR -> SHADOW promotion threshold.
pub const DEFAULT_MAX_FAILURES: u32 = 5;

/// Default failure-ledger sliding window: 1 hour.
pub const DEFAULT_FAILURE_WINDOW_MS: i64 = 3_600_000;

/// Nonce retention horizon is expressed as a multiple of `max_age_ms`.
/// Any value >= 1 keeps invariant 3 of spec §8 ("at most one of two
/// requests sharing a nonce sees PRIME") intact; 2x gives headroom for
/// clock jitter between the freshness check and the replay check.
pub const NONCE_RETENTION_MULTIPLE: i64 = 2;

/// Nonces are at most this many bytes (spec §6: "opaque string ... <= 128 bytes").
pub const MAX_NONCE_BYTES: usize = 128;

/// Above this many entries, a table sweep is triggered on the next insert
/// rather than scanning unconditionally on every call.
pub const GC_SWEEP_THRESHOLD: usize = 4096;
