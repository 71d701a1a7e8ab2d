//! Input and state validation
//!
//! Everything here runs before a solver is constructed. A failure is a
//! configuration error naming the department and field at fault.

use crate::error::ConfigurationError;
use crate::models::department::DepartmentId;
use crate::models::input::HourlyInput;
use crate::models::state::GameState;

/// Check a state snapshot is internally consistent
pub fn validate_state(state: &GameState) -> Result<(), ConfigurationError> {
    if state.hour == 0 {
        return Err(ConfigurationError::global("hour", "hours are numbered from 1"));
    }

    for id in DepartmentId::ALL {
        let dept = state.departments.get(&id).ok_or_else(|| {
            ConfigurationError::department(id, "departments", "missing from state")
        })?;

        if dept.patients > dept.rooms {
            return Err(ConfigurationError::department(
                id,
                "patients",
                format!("{} patients exceed {} rooms", dept.patients, dept.rooms),
            ));
        }
        if dept.blocked_transfers.contains_key(&id) {
            return Err(ConfigurationError::department(
                id,
                "blocked_transfers",
                "a department cannot transfer to itself",
            ));
        }
        let blocked: u64 = dept.blocked_transfers.values().map(|&n| u64::from(n)).sum();
        if blocked > u64::from(dept.patients) {
            return Err(ConfigurationError::department(
                id,
                "blocked_transfers",
                format!("{} blocked transfers exceed {} patients", blocked, dept.patients),
            ));
        }
    }

    Ok(())
}

/// Check an hour's input against the state it will be applied to
///
/// Assumes `validate_state` passed.
pub fn validate_input(state: &GameState, input: &HourlyInput) -> Result<(), ConfigurationError> {
    for id in DepartmentId::ALL {
        let facts = input.department(id);

        if id.is_emergency() {
            if facts.external_arrivals > 0 {
                return Err(ConfigurationError::department(
                    id,
                    "external_arrivals",
                    "the Emergency Department receives walk-ins and ambulances only",
                ));
            }
        } else {
            if facts.walk_in_arrivals > 0 {
                return Err(ConfigurationError::department(
                    id,
                    "walk_in_arrivals",
                    "only the Emergency Department receives walk-ins",
                ));
            }
            if facts.ambulance_arrivals > 0 {
                return Err(ConfigurationError::department(
                    id,
                    "ambulance_arrivals",
                    "only the Emergency Department receives ambulances",
                ));
            }
        }

        if facts.transfer_requests.contains_key(&id) {
            return Err(ConfigurationError::department(
                id,
                "transfer_requests",
                "a department cannot transfer to itself",
            ));
        }
    }

    for id in DepartmentId::ALL {
        let Some(dept) = state.departments.get(&id) else {
            continue;
        };
        let facts = input.department(id);

        // Patients already waiting on a transfer are not ready a second time.
        let exitable = dept.patients - dept.blocked_total();
        if facts.ready_to_exit > exitable {
            return Err(ConfigurationError::department(
                id,
                "ready_to_exit",
                format!(
                    "{} ready to exit but only {} patients can leave ({} occupied, {} awaiting transfer)",
                    facts.ready_to_exit,
                    exitable,
                    dept.patients,
                    dept.blocked_total()
                ),
            ));
        }

        let requested_out = input.transfer_requests_from(id);
        if requested_out > u64::from(facts.ready_to_exit) {
            return Err(ConfigurationError::department(
                id,
                "transfer_requests",
                format!(
                    "{} transfers requested out but only {} ready to exit",
                    requested_out, facts.ready_to_exit
                ),
            ));
        }

        let pool = u64::from(dept.waiting_arrivals)
            + u64::from(facts.walk_in_arrivals)
            + u64::from(facts.external_arrivals)
            + u64::from(facts.ambulance_arrivals);
        if pool > u64::from(u32::MAX) {
            return Err(ConfigurationError::department(
                id,
                "arrivals",
                format!("{} patients in the arrival pool is out of range", pool),
            ));
        }
    }

    Ok(())
}
