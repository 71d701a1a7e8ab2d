//! Hourly input
//!
//! The exogenous facts of one hour: arrivals, patients ready to leave and
//! where they are headed, staffing changes, and per-hour coefficient
//! overrides. Supplied by the caller; departments left out of the map have a
//! quiet hour.

use crate::costs::rates::RateOverrides;
use crate::models::department::DepartmentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One department's facts for the hour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartmentInput {
    /// ED only. Cannot be diverted
    pub walk_in_arrivals: u32,

    /// ED only. May be diverted to another facility
    pub ambulance_arrivals: u32,

    /// SD/CC/SU only. Cannot be diverted
    pub external_arrivals: u32,

    /// Patients vacating a room this hour, before admissions
    ///
    /// Those not claimed by another department's `transfer_requests` are
    /// discharged from the hospital.
    pub ready_to_exit: u32,

    /// Ready-to-exit patients of other departments headed here, keyed by source
    pub transfer_requests: BTreeMap<DepartmentId, u32>,

    /// Event-driven change to base staff (resulting staff clamps at zero)
    pub staffing_delta: i32,

    /// Override of the department's extra staff cap for this hour
    pub extra_staff_available: Option<u32>,
}

static QUIET_HOUR: DepartmentInput = DepartmentInput {
    walk_in_arrivals: 0,
    ambulance_arrivals: 0,
    external_arrivals: 0,
    ready_to_exit: 0,
    transfer_requests: BTreeMap::new(),
    staffing_delta: 0,
    extra_staff_available: None,
};

/// Everything the caller supplies for one hour
///
/// # Example
///
/// ```rust
/// use hospital_flow_core::{DepartmentId, HourlyInput};
///
/// let input = HourlyInput::new()
///     .with_walk_ins(5)
///     .with_ambulances(3)
///     .with_exit_to(DepartmentId::Emergency, DepartmentId::StepDown, 2);
///
/// let ed = input.department(DepartmentId::Emergency);
/// assert_eq!(ed.ready_to_exit, 2);
/// assert_eq!(input.transfer_request(DepartmentId::Emergency, DepartmentId::StepDown), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlyInput {
    /// Per-department facts
    pub departments: BTreeMap<DepartmentId, DepartmentInput>,

    /// Coefficient overrides for this hour only
    pub overrides: RateOverrides,
}

impl HourlyInput {
    /// An hour with no arrivals, exits or changes
    pub fn new() -> Self {
        Self::default()
    }

    /// Facts for one department (a quiet hour if absent)
    pub fn department(&self, id: DepartmentId) -> &DepartmentInput {
        self.departments.get(&id).unwrap_or(&QUIET_HOUR)
    }

    pub fn department_mut(&mut self, id: DepartmentId) -> &mut DepartmentInput {
        self.departments.entry(id).or_default()
    }

    /// New requests from `source` to `destination` this hour
    pub fn transfer_request(&self, source: DepartmentId, destination: DepartmentId) -> u32 {
        self.department(destination)
            .transfer_requests
            .get(&source)
            .copied()
            .unwrap_or(0)
    }

    /// New requests leaving `source` this hour, over all destinations
    ///
    /// Widened so that per-route counts near `u32::MAX` cannot overflow.
    pub fn transfer_requests_from(&self, source: DepartmentId) -> u64 {
        DepartmentId::ALL
            .iter()
            .map(|&destination| u64::from(self.transfer_request(source, destination)))
            .sum()
    }

    pub fn with_walk_ins(mut self, count: u32) -> Self {
        self.department_mut(DepartmentId::Emergency).walk_in_arrivals += count;
        self
    }

    pub fn with_ambulances(mut self, count: u32) -> Self {
        self.department_mut(DepartmentId::Emergency).ambulance_arrivals += count;
        self
    }

    pub fn with_external_arrivals(mut self, id: DepartmentId, count: u32) -> Self {
        self.department_mut(id).external_arrivals += count;
        self
    }

    /// Patients leaving the hospital from `id`
    pub fn with_discharges(mut self, id: DepartmentId, count: u32) -> Self {
        self.department_mut(id).ready_to_exit += count;
        self
    }

    /// Patients ready to move from `source` to `destination`
    ///
    /// Counts toward the source's `ready_to_exit` and the destination's
    /// `transfer_requests`.
    pub fn with_exit_to(mut self, source: DepartmentId, destination: DepartmentId, count: u32) -> Self {
        self.department_mut(source).ready_to_exit += count;
        *self
            .department_mut(destination)
            .transfer_requests
            .entry(source)
            .or_insert(0) += count;
        self
    }

    pub fn with_staffing_delta(mut self, id: DepartmentId, delta: i32) -> Self {
        self.department_mut(id).staffing_delta += delta;
        self
    }

    pub fn with_extra_staff_available(mut self, id: DepartmentId, available: u32) -> Self {
        self.department_mut(id).extra_staff_available = Some(available);
        self
    }

    /// Cap extra staff for every department this hour
    pub fn with_extra_staff_cap_everywhere(mut self, available: u32) -> Self {
        for id in DepartmentId::ALL {
            self.department_mut(id).extra_staff_available = Some(available);
        }
        self
    }

    pub fn with_overrides(mut self, overrides: RateOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}
