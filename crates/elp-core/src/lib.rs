//! Reality-decision engine for the ELP-Omega deceptive-defense request
//! authenticator.
//!
//! An [`Engine`] runs every request through a fixed cascade — mask,
//! freshness, seal, replay — and returns which of three realities the
//! caller should answer with: the real data (PRIME), a sanitized copy of
//! it (MIRROR), or a deterministic synthetic substitute (SHADOW). The
//! cascade's outcome is never surfaced as an HTTP error: every branch is
//! a normal-looking 200 response, by design.
//!
//! This crate is transport-agnostic. See `elp-axum` for a tower/axum
//! middleware built on top of it.

pub mod atoms;
pub mod freshness;
pub mod ledger;
pub mod mask;
pub mod orchestrator;
pub mod replay;
pub mod sanitize;
pub mod seal;
pub mod shadow;
pub mod timing;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::{DenialReason, EngineConfig, EngineConfigBuilder, Reality, RequestEnvelope};
pub use orchestrator::{Decision, Engine, Outcome};
