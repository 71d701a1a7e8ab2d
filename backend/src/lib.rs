//! Hospital Flow Core - Rust Engine
//!
//! Hourly optimization and transition engine for a four-department hospital
//! game (Emergency, Step Down, Critical Care, Surgery).
//!
//! # Architecture
//!
//! - **models**: Domain types (Department, GameState, HourlyInput, Decision)
//! - **core**: Validation, hour plans and decision evaluation
//! - **costs**: Objective coefficients, per-hour accounting, totals
//! - **optimizer**: One MILP per hour, solved exactly (`solve_hour`)
//! - **transition**: Next state from a solved hour (`apply_hour`)
//! - **events**: Scheduled event cards folded into hourly inputs
//! - **orchestrator**: Multi-hour driver and replay
//!
//! # Critical Invariants
//!
//! 1. Every returned decision satisfies room capacity, staffing coverage and
//!    the ambulance split, checked by substitution
//! 2. The engine holds no state; the same inputs always give the same outputs
//! 3. An hour either yields a complete decision or does not advance
//!
//! # Example
//!
//! ```rust
//! use hospital_flow_core::{
//!     apply_hour, solve_hour, DepartmentId, GameState, HourlyInput, OptimizationConfig,
//! };
//!
//! let state = GameState::initial();
//! let input = HourlyInput::new()
//!     .with_walk_ins(3)
//!     .with_ambulances(1)
//!     .with_discharges(DepartmentId::StepDown, 2);
//!
//! let solution = solve_hour(&state, &input, &OptimizationConfig::default()).unwrap();
//! let ed = solution.decision.department(DepartmentId::Emergency).unwrap();
//! assert_eq!(ed.ambulance_admitted + ed.ambulance_diverted, 1);
//!
//! let next = apply_hour(&state, &input, solution.decision).unwrap();
//! assert_eq!(next.hour, 2);
//! ```

// Module declarations
pub mod core;
pub mod costs;
pub mod error;
pub mod events;
pub mod models;
pub mod optimizer;
pub mod orchestrator;
pub mod transition;

// Re-exports for convenience
pub use costs::{HourCosts, OptimizationConfig, QueueRates, RateOverrides, SolverSettings, Totals};
pub use error::{ConfigurationError, ConstraintKind, EngineError, EngineResult, SolveStatus};
pub use events::{EventCard, EventDeck, EventSchedule, ScheduledEvent};
pub use models::{
    decision::{Decision, DepartmentDecision},
    department::{Department, DepartmentId},
    input::{DepartmentInput, HourlyInput},
    state::{GameState, GAME_HOURS},
};
pub use optimizer::{solve_hour, HourSolution};
pub use orchestrator::{replay, HourResult, Orchestrator, OrchestratorConfig, ReplayOutcome};
pub use transition::apply_hour;
