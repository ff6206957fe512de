// ── Atoms: Error Types ──────────────────────────────────────────────────
// Single canonical error enum for the engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (Config, Crypto, Clock…).
//   • No variant carries the HMAC secret, a raw seal, or nonce contents.
//   • This is distinct from `DenialReason` (atoms::types): a cascade
//     denial is an expected branch, not a Rust error. `EngineError` is
//     reserved for misconfiguration and environmental failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was constructed with an invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A cryptographic primitive failed in a way that should be
    /// impossible given validated inputs (e.g. a key of the wrong length).
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// The system clock could not be read (e.g. time before the epoch).
    #[error("clock error: {0}")]
    Clock(String),

    /// Catch-all for errors without a dedicated variant.
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto(message.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
