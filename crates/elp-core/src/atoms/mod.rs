// ── Atoms Layer ─────────────────────────────────────────────────────────
// Pure types, constants, and error definitions — zero side effects, no I/O.
// Dependency rule: atoms may only depend on std and external pure crates.
// Nothing here may import from the cascade modules or the orchestrator.

pub mod constants;
pub mod error;
pub mod types;
