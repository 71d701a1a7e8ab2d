//! Hourly solve
//!
//! `solve_hour` validates the inputs, builds the hour's program, runs it on a
//! worker thread under the configured wall-clock budget, snaps the result to
//! integers and re-checks it by substitution before returning it.
//!
//! # Failure handling
//!
//! - Infeasible: reported at once, with the department and constraint that
//!   explain it when one does
//! - Anything else (solver error, timeout, non-integral or non-verifying
//!   point): retried once with the stricter tolerance, then reported
//!
//! The model is deterministic and microlp has no tolerance settings, so the
//! retry rebuilds and re-solves the same program. It recovers failures of
//! the run itself (a worker that could not start or overran a budget it
//! shares with other threads) and otherwise re-validates the point under
//! the stricter integrality tolerance. A point rejected on the first
//! attempt is not accepted on the second.
//!
//! # Time limit
//!
//! The budget bounds the wait, not the worker. An overrunning worker is
//! detached and keeps running until branch-and-bound returns; its result is
//! then dropped. Callers that retry timed-out hours in a loop can therefore
//! accumulate busy threads.

use crate::core::flows::HourFlows;
use crate::core::plan::HourPlan;
use crate::costs::accounting::HourCosts;
use crate::costs::rates::OptimizationConfig;
use crate::error::{ConstraintKind, EngineError, SolveStatus};
use crate::models::decision::{Decision, DepartmentDecision};
use crate::models::input::HourlyInput;
use crate::models::state::GameState;
use crate::optimizer::model::{HourModel, RawPoint};
use good_lp::ResolutionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// Result of a successful hourly solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourSolution {
    /// The optimal decision, with its accounting
    pub decision: Decision,

    /// Always `Optimal`; failures are reported as `EngineError`
    pub status: SolveStatus,

    /// Solver attempts used (1, or 2 after a retry)
    pub attempts: u32,
}

/// Why a single attempt failed
#[derive(Debug)]
enum AttemptFailure {
    Infeasible,
    Numerical(String),
}

/// Solve one hour
///
/// Stateless: the same (state, input, config) always yields the same
/// solution, and independent calls may run concurrently.
pub fn solve_hour(
    state: &GameState,
    input: &HourlyInput,
    config: &OptimizationConfig,
) -> Result<HourSolution, EngineError> {
    config.validate()?;
    let rates = config.with_overrides(&input.overrides)?;
    let plan = HourPlan::new(state, input)?;

    solve_plan(&plan, &rates, run_bounded)
}

/// Attempt loop over a validated plan, with `run` producing raw points
fn solve_plan<R>(plan: &HourPlan, rates: &OptimizationConfig, mut run: R) -> Result<HourSolution, EngineError>
where
    R: FnMut(&HourPlan, &OptimizationConfig) -> Result<RawPoint, AttemptFailure>,
{
    let mut failure = String::new();
    let mut attempts = 0;
    for tolerance in rates.solver.attempt_tolerances() {
        attempts += 1;
        let outcome = run(plan, rates).and_then(|point| attempt(plan, rates, &point, tolerance));
        match outcome {
            Ok(decision) => {
                tracing::info!(
                    hour = plan.hour,
                    objective = decision.accounting.objective,
                    financial = decision.accounting.financial_cost,
                    quality = decision.accounting.quality_penalty,
                    admitted = decision.accounting.admitted_patients,
                    diverted = decision.accounting.ambulances_diverted,
                    attempts,
                    "solved hour"
                );
                return Ok(HourSolution {
                    decision,
                    status: SolveStatus::Optimal,
                    attempts,
                });
            }
            Err(AttemptFailure::Infeasible) => return Err(diagnose_infeasibility(plan)),
            Err(AttemptFailure::Numerical(message)) => {
                tracing::warn!(hour = plan.hour, attempt = attempts, %message, "solver attempt failed");
                failure = message;
            }
        }
    }

    Err(EngineError::Solver {
        hour: plan.hour,
        attempts,
        message: failure,
    })
}

fn attempt(
    plan: &HourPlan,
    rates: &OptimizationConfig,
    point: &RawPoint,
    tolerance: f64,
) -> Result<Decision, AttemptFailure> {
    let mut decision = snap_decision(plan, point, tolerance)?;

    let flows = HourFlows::evaluate(plan, &decision)
        .map_err(|e| AttemptFailure::Numerical(format!("solution failed substitution: {}", e)))?;
    decision.accounting = HourCosts::from_flows(&flows, rates);
    decision.rates = rates.clone();
    Ok(decision)
}

/// Build and solve on a worker thread, waiting at most the time limit
fn run_bounded(plan: &HourPlan, rates: &OptimizationConfig) -> Result<RawPoint, AttemptFailure> {
    let worker_plan = plan.clone();
    let worker_rates = rates.clone();
    run_with_limit(plan.hour, rates.solver.time_limit(), move || {
        HourModel::build(&worker_plan, &worker_rates).solve()
    })
}

/// Run `work` on a named thread and wait at most `limit` for its result
///
/// A worker that overruns is detached, not stopped; its late result is
/// dropped.
fn run_with_limit<F>(hour: u32, limit: Duration, work: F) -> Result<RawPoint, AttemptFailure>
where
    F: FnOnce() -> Result<RawPoint, ResolutionError> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();

    thread::Builder::new()
        .name(format!("hour-{}-solver", hour))
        .spawn(move || {
            // the receiver is gone if the budget ran out
            let _ = sender.send(work());
        })
        .map_err(|e| AttemptFailure::Numerical(format!("could not start solver thread: {}", e)))?;

    match receiver.recv_timeout(limit) {
        Ok(Ok(point)) => Ok(point),
        Ok(Err(ResolutionError::Infeasible)) => Err(AttemptFailure::Infeasible),
        Ok(Err(other)) => Err(AttemptFailure::Numerical(other.to_string())),
        Err(RecvTimeoutError::Timeout) => Err(AttemptFailure::Numerical(format!(
            "time limit of {} ms exceeded",
            limit.as_millis()
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(AttemptFailure::Numerical(
            "solver thread exited without a result".to_string(),
        )),
    }
}

fn snap(value: f64, tolerance: f64, what: &str) -> Result<u32, AttemptFailure> {
    let rounded = value.round();
    if !value.is_finite() || (value - rounded).abs() > tolerance || rounded < 0.0 || rounded > f64::from(u32::MAX) {
        return Err(AttemptFailure::Numerical(format!(
            "{} = {} is not an integer within {}",
            what, value, tolerance
        )));
    }
    Ok(rounded as u32)
}

fn snap_decision(plan: &HourPlan, point: &RawPoint, tolerance: f64) -> Result<Decision, AttemptFailure> {
    let mut departments = BTreeMap::new();
    for (&id, raw) in &point.departments {
        departments.insert(
            id,
            DepartmentDecision {
                admitted_new: snap(raw.roomed, tolerance, "roomed")?,
                admitted_transfers: BTreeMap::new(),
                extra_staff_called: snap(raw.extra_staff, tolerance, "extra_staff")?,
                ambulance_admitted: snap(raw.ambulance_admitted, tolerance, "ambulance_admitted")?,
                ambulance_diverted: snap(raw.ambulance_diverted, tolerance, "ambulance_diverted")?,
            },
        );
    }

    for (route, &value) in &point.transfers {
        let admitted = snap(value, tolerance, "transfer")?;
        if admitted == 0 {
            continue;
        }
        let destination = departments.get_mut(&route.destination).ok_or_else(|| {
            AttemptFailure::Numerical(format!("no decision for destination {}", route.destination))
        })?;
        destination.admitted_transfers.insert(route.source, admitted);
    }

    Ok(Decision {
        hour: plan.hour,
        departments,
        accounting: HourCosts::default(),
        rates: OptimizationConfig::default(),
    })
}

/// Name the department and constraint behind an infeasible hour
///
/// The fewest patients a department can end the hour with is everyone
/// staying minus every pending transfer out. If even that exceeds its rooms
/// or its maximum staff, that department is the cause; otherwise the
/// conflict lies in how transfers interact.
fn diagnose_infeasibility(plan: &HourPlan) -> EngineError {
    for dept in plan.departments.values() {
        let floor = dept.staying.saturating_sub(plan.requests_out(dept.id));
        let constraint = if floor > dept.rooms {
            Some(ConstraintKind::RoomCapacity)
        } else if u64::from(floor) > u64::from(dept.next_staff) + u64::from(dept.extra_cap) {
            Some(ConstraintKind::StaffingCoverage)
        } else {
            None
        };
        if let Some(constraint) = constraint {
            tracing::warn!(hour = plan.hour, department = %dept.id, %constraint, floor, "hour infeasible");
            return EngineError::Infeasible {
                hour: plan.hour,
                department: Some(dept.id),
                constraint,
            };
        }
    }

    tracing::warn!(hour = plan.hour, "hour infeasible through coupled transfers");
    EngineError::Infeasible {
        hour: plan.hour,
        department: None,
        constraint: ConstraintKind::CoupledTransferFlows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::department::DepartmentId;

    fn overrunning_work() -> Result<RawPoint, ResolutionError> {
        thread::sleep(Duration::from_millis(500));
        Ok(RawPoint::default())
    }

    #[test]
    fn test_snap_accepts_near_integers() {
        assert_eq!(snap(2.0000000001, 1e-6, "x").unwrap(), 2);
        assert_eq!(snap(-0.0000000001, 1e-6, "x").unwrap(), 0);
    }

    #[test]
    fn test_snap_rejects_fractions_and_garbage() {
        assert!(snap(1.4, 1e-6, "x").is_err());
        assert!(snap(2.000001, 1e-9, "x").is_err());
        assert!(snap(f64::NAN, 1e-6, "x").is_err());
        assert!(snap(-1.0, 1e-6, "x").is_err());
    }

    #[test]
    fn test_solution_reports_optimal() {
        let solution = solve_hour(
            &GameState::initial(),
            &HourlyInput::new(),
            &OptimizationConfig::default(),
        )
        .unwrap();

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.attempts, 1);
        assert_eq!(solution.decision.hour, 1);
        assert_eq!(solution.decision.departments.len(), DepartmentId::ALL.len());
    }

    #[test]
    fn test_overrunning_worker_hits_time_limit() {
        match run_with_limit(4, Duration::from_millis(20), overrunning_work) {
            Err(AttemptFailure::Numerical(message)) => {
                assert_eq!(message, "time limit of 20 ms exceeded")
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_worker_result_within_limit_is_returned() {
        let point = run_with_limit(4, Duration::from_secs(5), || Ok(RawPoint::default())).unwrap();
        assert_eq!(point, RawPoint::default());

        let infeasible = run_with_limit(4, Duration::from_secs(5), || Err(ResolutionError::Infeasible));
        assert!(matches!(infeasible, Err(AttemptFailure::Infeasible)));
    }

    #[test]
    fn test_timed_out_attempt_is_retried_once() {
        let state = GameState::initial();
        let input = HourlyInput::new().with_walk_ins(2);
        let rates = OptimizationConfig::default();
        let plan = HourPlan::new(&state, &input).unwrap();

        let mut calls = 0;
        let solution = solve_plan(&plan, &rates, |plan, rates| {
            calls += 1;
            if calls == 1 {
                run_with_limit(plan.hour, Duration::from_millis(10), overrunning_work)
            } else {
                run_bounded(plan, rates)
            }
        })
        .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(solution.attempts, 2);
        assert_eq!(solution, HourSolution { attempts: 2, ..solve_hour(&state, &input, &rates).unwrap() });
    }

    #[test]
    fn test_repeated_timeouts_report_solver_error() {
        let plan = HourPlan::new(&GameState::initial(), &HourlyInput::new()).unwrap();
        let rates = OptimizationConfig::default();

        let err = solve_plan(&plan, &rates, |plan, _| {
            run_with_limit(plan.hour, Duration::from_millis(10), overrunning_work)
        })
        .unwrap_err();

        assert_eq!(err.status(), Some(SolveStatus::SolverError));
        match err {
            EngineError::Solver {
                hour,
                attempts,
                message,
            } => {
                assert_eq!(hour, 1);
                assert_eq!(attempts, 2);
                assert_eq!(message, "time limit of 10 ms exceeded");
            }
            other => panic!("expected solver error, got {:?}", other),
        }
    }

    #[test]
    fn test_fractional_point_fails_both_attempts() {
        let plan = HourPlan::new(&GameState::initial(), &HourlyInput::new()).unwrap();
        let rates = OptimizationConfig::default();

        let mut calls = 0;
        let err = solve_plan(&plan, &rates, |plan, rates| {
            calls += 1;
            let mut point = run_bounded(plan, rates)?;
            if let Some(sd) = point.departments.get_mut(&DepartmentId::StepDown) {
                sd.roomed += 0.5;
            }
            Ok(point)
        })
        .unwrap_err();

        assert_eq!(calls, 2);
        assert!(matches!(err, EngineError::Solver { attempts: 2, .. }));
    }

    #[test]
    fn test_diagnosis_names_uncoverable_department() {
        let mut state = GameState::initial();
        state.department_mut(DepartmentId::Surgery).unwrap().extra_staff_available = 0;
        let input = HourlyInput::new().with_staffing_delta(DepartmentId::Surgery, -3);
        let plan = HourPlan::new(&state, &input).unwrap();

        match diagnose_infeasibility(&plan) {
            EngineError::Infeasible {
                department,
                constraint,
                ..
            } => {
                assert_eq!(department, Some(DepartmentId::Surgery));
                assert_eq!(constraint, ConstraintKind::StaffingCoverage);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
