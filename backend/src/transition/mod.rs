//! State transition
//!
//! Folds a solved decision and the hour's input into the next state.
//!
//! # Critical Invariants
//!
//! 1. A decision that violates any hard constraint is rejected whole; the
//!    caller's state is never partially updated
//! 2. Blocked transfers stay in the source's rooms and are requested again
//!    next hour
//! 3. Totals grow by the accounting of the applied flows, priced with the
//!    decision's own rates; a stale or hand-written `accounting` never
//!    reaches the totals

use crate::core::flows::HourFlows;
use crate::core::plan::HourPlan;
use crate::costs::accounting::HourCosts;
use crate::error::{ConfigurationError, EngineError};
use crate::models::decision::Decision;
use crate::models::input::HourlyInput;
use crate::models::state::GameState;

/// Apply one solved hour
///
/// Returns the state for the next hour; `state` itself is not modified.
/// The hour is priced from the flows it produces, so the totals always
/// match the state written.
///
/// # Example
///
/// ```rust
/// use hospital_flow_core::{apply_hour, solve_hour, GameState, HourlyInput, OptimizationConfig};
///
/// let state = GameState::initial();
/// let input = HourlyInput::new().with_walk_ins(2);
/// let solution = solve_hour(&state, &input, &OptimizationConfig::default()).unwrap();
///
/// let next = apply_hour(&state, &input, solution.decision).unwrap();
/// assert_eq!(next.hour, 2);
/// assert_eq!(next.total_patients(), state.total_patients() + 2);
/// ```
pub fn apply_hour(
    state: &GameState,
    input: &HourlyInput,
    decision: Decision,
) -> Result<GameState, EngineError> {
    if decision.hour != state.hour {
        return Err(ConfigurationError::global(
            "decision",
            format!("solved for hour {} but state is at hour {}", decision.hour, state.hour),
        )
        .into());
    }

    decision.rates.validate()?;
    let plan = HourPlan::new(state, input)?;
    let flows = HourFlows::evaluate(&plan, &decision)?;
    let accounting = HourCosts::from_flows(&flows, &decision.rates);
    if accounting != decision.accounting && decision.accounting != HourCosts::default() {
        tracing::warn!(
            hour = state.hour,
            supplied = decision.accounting.financial_cost,
            recomputed = accounting.financial_cost,
            "decision accounting replaced by its evaluated cost"
        );
    }

    let mut next = state.clone();
    for (id, flow) in &flows.departments {
        let dept = next.department_mut(*id).ok_or_else(|| {
            ConfigurationError::department(*id, "departments", "missing from state")
        })?;
        dept.patients = flow.next_patients;
        dept.staff = flow.next_staff;
        dept.extra_staff_called = flow.extra_staff_called;
        dept.waiting_arrivals = flow.waiting_arrivals;
        dept.blocked_transfers = flow.blocked_out.clone();
    }

    next.hour += 1;
    next.totals.add(&accounting);

    tracing::info!(
        hour = state.hour,
        patients = next.total_patients(),
        queue = next.total_queue(),
        total_financial = next.totals.total_financial_cost,
        total_quality = next.totals.total_quality_penalty,
        total_admitted = next.totals.total_admitted,
        "applied hour"
    );

    Ok(next)
}
