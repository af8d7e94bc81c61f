//! Cross-module tests for prediction, reconciliation and smoothing.
//!
//! - **Determinism tests**: the physics step and replay reproduce identical
//!   bits from identical inputs
//! - **Integration tests**: server, owning client and observer exchanging
//!   moves and snapshots over a simulated network
//! - **Helper functions**: the simulated network and session setup
//!
//! # Test Structure
//!
//! - `determinism.rs`: bitwise reproducibility of step, replay and sessions
//! - `integration.rs`: end-to-end scenarios
//! - `helpers.rs`: `LatentChannel`, `Session` and input generators

mod helpers;

// Re-export for convenience
pub use helpers::*;
