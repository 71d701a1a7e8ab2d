//! Cost Types
//!
//! This module provides:
//! - Objective coefficients and solver settings (`OptimizationConfig`)
//! - Per-hour accounting and running totals (`HourCosts`, `Totals`)

pub mod accounting;
pub mod rates;

// Re-exports
pub use accounting::{HourCosts, Totals};
pub use rates::{OptimizationConfig, QueueRates, RateOverrides, SolverSettings};
