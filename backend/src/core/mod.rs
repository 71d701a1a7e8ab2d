//! Shared derivations used by both the optimizer and the transition
//!
//! - **validation**: configuration checks run before any solve
//! - **plan**: per-hour constants derived from (state, input)
//! - **flows**: substitution of a decision into a plan

pub mod flows;
pub mod plan;
pub mod validation;

pub use flows::{DepartmentFlow, HourFlows};
pub use plan::{DepartmentPlan, HourPlan, Route};
