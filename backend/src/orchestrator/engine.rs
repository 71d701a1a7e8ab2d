//! Orchestrator Engine
//!
//! Caller-side driver for multi-hour runs. The engine functions are pure;
//! the orchestrator is the one place that holds a `GameState` and threads
//! it from hour to hour.
//!
//! # Architecture
//!
//! ```text
//! For each hour h:
//! 1. Fold the event cards due at h into the hour's input
//! 2. Solve the hour (solve_hour)
//! 3. Apply the decision (apply_hour)
//! 4. Fingerprint the new state
//! ```
//!
//! # Example
//!
//! ```rust
//! use hospital_flow_core::{HourlyInput, Orchestrator, OrchestratorConfig};
//!
//! let mut orchestrator = Orchestrator::new(OrchestratorConfig::default()).unwrap();
//!
//! for _ in 0..3 {
//!     let result = orchestrator.run_hour(&HourlyInput::new().with_walk_ins(1)).unwrap();
//!     println!("Hour {}: {} admitted", result.hour, result.admitted);
//! }
//! assert_eq!(orchestrator.current_hour(), 4);
//! ```

use crate::core::validation::validate_state;
use crate::costs::accounting::{HourCosts, Totals};
use crate::costs::rates::OptimizationConfig;
use crate::error::{ConfigurationError, EngineError};
use crate::events::EventDeck;
use crate::models::decision::Decision;
use crate::models::input::HourlyInput;
use crate::models::state::{GameState, GAME_HOURS};
use crate::optimizer::solve_hour;
use crate::transition::apply_hour;
use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete orchestrator configuration
///
/// # Fields
///
/// * `optimization` - Cost coefficients and solver settings
/// * `events` - Scheduled event cards
/// * `initial_state` - Starting state (defaults to State 0)
/// * `max_hours` - Last hour that may be played (defaults to 24)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub optimization: OptimizationConfig,

    pub events: EventDeck,

    pub initial_state: GameState,

    pub max_hours: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            optimization: OptimizationConfig::default(),
            events: EventDeck::default(),
            initial_state: GameState::initial(),
            max_hours: GAME_HOURS,
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Holds the game state and plays it forward one hour at a time
#[derive(Debug, Clone)]
pub struct Orchestrator {
    /// State at the start of the next hour
    state: GameState,

    /// Base cost coefficients
    optimization: OptimizationConfig,

    /// Event cards
    events: EventDeck,

    /// Last playable hour
    max_hours: u32,
}

/// Result of a single hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourResult {
    /// Hour that was played
    pub hour: u32,

    /// Decision applied
    pub decision: Decision,

    /// Accounting of the decision
    pub costs: HourCosts,

    /// Patients who left the hospital
    pub discharged: u32,

    /// Patients roomed from arrivals or accepted as transfers
    pub admitted: u32,

    /// Solver attempts used
    pub attempts: u32,

    /// SHA-256 of the state after the hour
    pub state_fingerprint: String,
}

impl Orchestrator {
    /// Create new orchestrator from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to play `initial_state.hour`
    /// * `Err(EngineError::Configuration)` - Invalid coefficients, cards or state
    pub fn new(config: OrchestratorConfig) -> Result<Self, EngineError> {
        Self::validate_config(&config)?;

        Ok(Self {
            state: config.initial_state,
            optimization: config.optimization,
            events: config.events,
            max_hours: config.max_hours,
        })
    }

    fn validate_config(config: &OrchestratorConfig) -> Result<(), ConfigurationError> {
        if config.max_hours == 0 {
            return Err(ConfigurationError::global("max_hours", "must be at least 1"));
        }
        config.optimization.validate()?;
        config.events.validate()?;
        validate_state(&config.initial_state)?;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Hour about to be played
    pub fn current_hour(&self) -> u32 {
        self.state.hour
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn totals(&self) -> &Totals {
        &self.state.totals
    }

    /// Whether `max_hours` have been played
    pub fn is_finished(&self) -> bool {
        self.state.hour > self.max_hours
    }

    // ========================================================================
    // Hour Loop
    // ========================================================================

    /// Play one hour
    ///
    /// On any error the held state is left exactly as it was.
    pub fn run_hour(&mut self, input: &HourlyInput) -> Result<HourResult, EngineError> {
        let hour = self.state.hour;
        if self.is_finished() {
            return Err(ConfigurationError::global(
                "hour",
                format!("hour {} is past the last hour {}", hour, self.max_hours),
            )
            .into());
        }

        let input = self.events.apply(hour, input)?;
        let solution = solve_hour(&self.state, &input, &self.optimization)?;
        let costs = solution.decision.accounting.clone();
        let next = apply_hour(&self.state, &input, solution.decision.clone())?;
        let state_fingerprint = next.fingerprint()?;

        self.state = next;

        Ok(HourResult {
            hour,
            decision: solution.decision,
            discharged: costs.discharged,
            admitted: costs.admitted_patients,
            costs,
            attempts: solution.attempts,
            state_fingerprint,
        })
    }

    /// Play every remaining hour with the given inputs, in order
    ///
    /// Stops at the first error; results for the hours already played are
    /// discarded with it but the held state reflects them.
    pub fn run_all(&mut self, inputs: &[HourlyInput]) -> Result<Vec<HourResult>, EngineError> {
        inputs.iter().map(|input| self.run_hour(input)).collect()
    }
}

/// Outcome of a full replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayOutcome {
    pub results: Vec<HourResult>,
    pub final_state: GameState,
}

/// Replay a sequence of hours from `initial`
///
/// `initial` replaces `config.initial_state`. Same inputs, same results:
/// decisions and fingerprints are identical on every run.
pub fn replay(
    initial: &GameState,
    inputs: &[HourlyInput],
    config: &OrchestratorConfig,
) -> Result<ReplayOutcome, EngineError> {
    let mut config = config.clone();
    config.initial_state = initial.clone();

    let mut orchestrator = Orchestrator::new(config)?;
    let results = orchestrator.run_all(inputs)?;

    Ok(ReplayOutcome {
        results,
        final_state: orchestrator.state,
    })
}

// ============================================================================
// Tests
// ============================================================================
