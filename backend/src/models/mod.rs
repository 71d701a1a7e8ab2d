//! Domain models for the hospital flow engine

pub mod decision;
pub mod department;
pub mod input;
pub mod state;

// Re-exports
pub use decision::{Decision, DepartmentDecision};
pub use department::{Department, DepartmentId};
pub use input::{DepartmentInput, HourlyInput};
pub use state::{GameState, GAME_HOURS};
