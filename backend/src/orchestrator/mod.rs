//! Orchestrator - multi-hour driver
//!
//! Threads a `GameState` through event cards, `solve_hour` and `apply_hour`.
//!
//! See `engine.rs` for full implementation.

pub mod engine;

pub use engine::{replay, HourResult, Orchestrator, OrchestratorConfig, ReplayOutcome};
