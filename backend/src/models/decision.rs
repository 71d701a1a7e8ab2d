//! Hourly decision
//!
//! The values the optimizer controls for one hour. A decision is only valid
//! for the (state, input) pair it was solved against and is consumed once by
//! the transition.

use crate::costs::accounting::HourCosts;
use crate::costs::rates::OptimizationConfig;
use crate::models::department::DepartmentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Choices for one department
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartmentDecision {
    /// Patients moved from the arrival pool into a room
    pub admitted_new: u32,

    /// Transfers accepted into this department, keyed by source
    pub admitted_transfers: BTreeMap<DepartmentId, u32>,

    /// Extra staff called in for this hour
    pub extra_staff_called: u32,

    /// ED only: ambulance arrivals accepted into the arrival pool
    pub ambulance_admitted: u32,

    /// ED only: ambulance arrivals sent to another facility
    pub ambulance_diverted: u32,
}

impl DepartmentDecision {
    pub fn admitted_transfers_total(&self) -> u32 {
        self.admitted_transfers
            .values()
            .fold(0u32, |total, &count| total.saturating_add(count))
    }

    /// Transfers accepted from `source`
    pub fn admitted_from(&self, source: DepartmentId) -> u32 {
        self.admitted_transfers.get(&source).copied().unwrap_or(0)
    }
}

/// A complete decision for one hour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Hour this decision was solved for
    pub hour: u32,

    /// Per-department choices (every department present)
    pub departments: BTreeMap<DepartmentId, DepartmentDecision>,

    /// Costs and rewards of this decision, computed from its own values
    pub accounting: HourCosts,

    /// Effective rates the decision was priced with (overrides applied)
    #[serde(default)]
    pub rates: OptimizationConfig,
}

impl Decision {
    /// Choices for one department
    pub fn department(&self, id: DepartmentId) -> Option<&DepartmentDecision> {
        self.departments.get(&id)
    }

    pub fn ambulance_diverted(&self) -> u32 {
        self.departments
            .get(&DepartmentId::Emergency)
            .map(|ed| ed.ambulance_diverted)
            .unwrap_or(0)
    }

    pub fn extra_staff_called(&self) -> u32 {
        self.departments.values().map(|d| d.extra_staff_called).sum()
    }

    /// Roomed arrivals plus accepted transfers, all departments
    pub fn admitted_patients(&self) -> u32 {
        self.departments
            .values()
            .map(|d| d.admitted_new + d.admitted_transfers_total())
            .sum()
    }
}
