//! Engine error types
//!
//! Three failure classes are kept apart:
//! - **Configuration**: malformed input, state or config, rejected before
//!   any solver is constructed
//! - **Infeasible**: the hour's program has no feasible point
//! - **Solver**: numerical or solver-internal failure, after one retry
//!
//! No variant carries a partial decision: an hour either yields a complete,
//! constraint-satisfying decision or does not advance.

use crate::models::department::DepartmentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Outcome of an hourly solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    SolverError,
}

/// Hard constraints of the hourly program, as named in error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Occupancy at end of hour within room count
    RoomCapacity,
    /// Occupancy at end of hour covered by base plus extra staff
    StaffingCoverage,
    /// Every ambulance arrival admitted or diverted
    AmbulanceSplit,
    /// Admitted transfers within the pending requests of a route
    TransferBound,
    /// Extra staff within the hour's cap
    ExtraStaffBound,
    /// Roomed arrivals within the arrival pool
    ArrivalPool,
    /// Infeasibility arising only from the interaction of transfer routes
    CoupledTransferFlows,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::RoomCapacity => "room_capacity",
            ConstraintKind::StaffingCoverage => "staffing_coverage",
            ConstraintKind::AmbulanceSplit => "ambulance_split",
            ConstraintKind::TransferBound => "transfer_bound",
            ConstraintKind::ExtraStaffBound => "extra_staff_bound",
            ConstraintKind::ArrivalPool => "arrival_pool",
            ConstraintKind::CoupledTransferFlows => "coupled_transfer_flows",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn scope(department: &Option<DepartmentId>) -> String {
    match department {
        Some(id) => format!(" [{}]", id),
        None => String::new(),
    }
}

/// Malformed or internally inconsistent input, state or configuration
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field}{}: {reason}", scope(.department))]
pub struct ConfigurationError {
    /// Department the offending field belongs to, if any
    pub department: Option<DepartmentId>,
    /// Name of the offending field
    pub field: &'static str,
    /// What is wrong with it
    pub reason: String,
}

impl ConfigurationError {
    pub fn new(department: Option<DepartmentId>, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            department,
            field,
            reason: reason.into(),
        }
    }

    pub fn department(department: DepartmentId, field: &'static str, reason: impl Into<String>) -> Self {
        Self::new(Some(department), field, reason)
    }

    pub fn global(field: &'static str, reason: impl Into<String>) -> Self {
        Self::new(None, field, reason)
    }
}

/// Errors surfaced by `solve_hour`, `apply_hour` and the orchestrator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("hour {hour} is infeasible: {constraint} cannot be satisfied{}", scope(.department))]
    Infeasible {
        hour: u32,
        department: Option<DepartmentId>,
        constraint: ConstraintKind,
    },

    #[error("solver failed at hour {hour} after {attempts} attempt(s): {message}")]
    Solver {
        hour: u32,
        attempts: u32,
        message: String,
    },

    #[error("decision violates {constraint} [{department}]: {detail}")]
    InvalidDecision {
        department: DepartmentId,
        constraint: ConstraintKind,
        detail: String,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl EngineError {
    /// Solver status this error corresponds to
    ///
    /// Configuration and decision errors are raised outside the solver and
    /// have no status.
    pub fn status(&self) -> Option<SolveStatus> {
        match self {
            EngineError::Infeasible { .. } => Some(SolveStatus::Infeasible),
            EngineError::Solver { .. } => Some(SolveStatus::SolverError),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
