//! Hour plan
//!
//! Constants derived from one (state, input) pair before any decision is
//! made. The optimizer builds its program from a plan and the transition
//! rebuilds the same plan to apply a decision, so both sides agree on who
//! stays, who leaves and which transfers are pending.
//!
//! ```text
//! staying   = patients − discharged          (discharged = ready − new transfers out)
//! requests  = carried blocked transfers + new transfer requests, per route
//! pool      = waiting arrivals + walk-ins (ED) / external arrivals (others)
//! ```

use crate::core::validation::{validate_input, validate_state};
use crate::error::ConfigurationError;
use crate::models::department::DepartmentId;
use crate::models::input::HourlyInput;
use crate::models::state::GameState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A transfer route between two departments
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Route {
    pub source: DepartmentId,
    pub destination: DepartmentId,
}

impl Route {
    pub fn new(source: DepartmentId, destination: DepartmentId) -> Self {
        Self {
            source,
            destination,
        }
    }
}

/// Per-department constants for one hour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentPlan {
    pub id: DepartmentId,

    pub rooms: u32,

    /// Occupancy at the start of the hour
    pub patients: u32,

    /// Patients leaving the hospital this hour
    pub discharged: u32,

    /// Patients who keep their room unless a transfer out is accepted
    pub staying: u32,

    /// Base staff after this hour's staffing delta
    pub next_staff: u32,

    /// Extra staff that may be called this hour
    pub extra_cap: u32,

    /// Arrivals carried over from earlier hours
    pub waiting_arrivals: u32,

    /// Non-divertible arrivals this hour (walk-ins or external)
    pub new_arrivals: u32,

    /// Divertible arrivals this hour (ED ambulances)
    pub ambulance_arrivals: u32,
}

impl DepartmentPlan {
    /// Arrivals that are in the pool whatever the decision
    pub fn fixed_pool(&self) -> u32 {
        self.waiting_arrivals.saturating_add(self.new_arrivals)
    }

    /// Largest possible pool (every ambulance admitted)
    ///
    /// Validation keeps the full pool within `u32`, so neither sum saturates
    /// for a plan built by `HourPlan::new`.
    pub fn max_pool(&self) -> u32 {
        self.fixed_pool().saturating_add(self.ambulance_arrivals)
    }
}

/// Everything fixed about one hour before deciding
#[derive(Debug, Clone, PartialEq)]
pub struct HourPlan {
    /// Hour being planned
    pub hour: u32,

    pub departments: BTreeMap<DepartmentId, DepartmentPlan>,

    /// Pending transfer requests per route (positive counts only)
    pub routes: BTreeMap<Route, u32>,
}

impl HourPlan {
    /// Validate the pair and derive the hour's constants
    pub fn new(state: &GameState, input: &HourlyInput) -> Result<Self, ConfigurationError> {
        validate_state(state)?;
        validate_input(state, input)?;

        let mut routes = BTreeMap::new();
        for source in DepartmentId::ALL {
            let carried = &state.departments[&source].blocked_transfers;
            for destination in DepartmentId::ALL {
                if source == destination {
                    continue;
                }
                // bounded by the source's patients once the input validates
                let count = carried
                    .get(&destination)
                    .copied()
                    .unwrap_or(0)
                    .saturating_add(input.transfer_request(source, destination));
                if count > 0 {
                    routes.insert(Route::new(source, destination), count);
                }
            }
        }

        let mut departments = BTreeMap::new();
        for id in DepartmentId::ALL {
            let dept = &state.departments[&id];
            let facts = input.department(id);

            let requested_out = u32::try_from(input.transfer_requests_from(id)).map_err(|_| {
                ConfigurationError::department(id, "transfer_requests", "request count out of range")
            })?;
            let discharged = facts.ready_to_exit - requested_out;
            let raw_staff = i64::from(dept.staff) + i64::from(facts.staffing_delta);
            if raw_staff < 0 {
                tracing::warn!(
                    hour = state.hour,
                    department = %id,
                    staff = dept.staff,
                    delta = facts.staffing_delta,
                    "staffing delta clamped at zero staff"
                );
            }
            let next_staff = u32::try_from(raw_staff.max(0)).map_err(|_| {
                ConfigurationError::department(id, "staffing_delta", "resulting staff out of range")
            })?;

            let plan = DepartmentPlan {
                id,
                rooms: dept.rooms,
                patients: dept.patients,
                discharged,
                staying: dept.patients - discharged,
                next_staff,
                extra_cap: facts
                    .extra_staff_available
                    .unwrap_or(dept.extra_staff_available),
                waiting_arrivals: dept.waiting_arrivals,
                new_arrivals: facts.walk_in_arrivals.saturating_add(facts.external_arrivals),
                ambulance_arrivals: facts.ambulance_arrivals,
            };
            tracing::debug!(
                hour = state.hour,
                department = %id,
                staying = plan.staying,
                discharged = plan.discharged,
                pool = plan.fixed_pool(),
                ambulances = plan.ambulance_arrivals,
                next_staff = plan.next_staff,
                extra_cap = plan.extra_cap,
                "planned department hour"
            );
            departments.insert(id, plan);
        }

        Ok(Self {
            hour: state.hour,
            departments,
            routes,
        })
    }

    pub fn department(&self, id: DepartmentId) -> &DepartmentPlan {
        &self.departments[&id]
    }

    /// Routes leaving `source` with their pending counts
    pub fn routes_from(&self, source: DepartmentId) -> impl Iterator<Item = (&Route, &u32)> {
        self.routes.iter().filter(move |(route, _)| route.source == source)
    }

    /// Routes entering `destination` with their pending counts
    pub fn routes_into(&self, destination: DepartmentId) -> impl Iterator<Item = (&Route, &u32)> {
        self.routes
            .iter()
            .filter(move |(route, _)| route.destination == destination)
    }

    /// Pending transfer requests out of `source`
    pub fn requests_out(&self, source: DepartmentId) -> u32 {
        self.routes_from(source).map(|(_, count)| *count).sum()
    }

    /// Pending transfer requests count on a route
    pub fn requested(&self, route: Route) -> u32 {
        self.routes.get(&route).copied().unwrap_or(0)
    }
}
