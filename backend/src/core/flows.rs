//! Decision evaluation
//!
//! Substitutes a decision into an hour plan and checks every hard
//! constraint. The resulting flows are what the transition writes into the
//! next state and what the accounting prices.

use crate::core::plan::{HourPlan, Route};
use crate::error::{ConfigurationError, ConstraintKind, EngineError};
use crate::models::decision::Decision;
use crate::models::department::DepartmentId;
use std::collections::BTreeMap;

/// What happens to one department over the hour
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentFlow {
    pub discharged: u32,

    /// Arrivals moved into a room
    pub roomed: u32,

    /// Transfers accepted from other departments
    pub transfers_in: u32,

    /// Transfers out accepted by their destinations
    pub transfers_out: u32,

    /// Transfers out still waiting, keyed by destination
    pub blocked_out: BTreeMap<DepartmentId, u32>,

    /// Arrivals still waiting for a room
    pub waiting_arrivals: u32,

    pub next_patients: u32,

    pub next_staff: u32,

    pub extra_staff_called: u32,

    pub ambulance_admitted: u32,

    pub ambulance_diverted: u32,
}

impl DepartmentFlow {
    pub fn effective_staff(&self) -> u32 {
        self.next_staff.saturating_add(self.extra_staff_called)
    }

    pub fn blocked_total(&self) -> u32 {
        self.blocked_out
            .values()
            .fold(0u32, |total, &count| total.saturating_add(count))
    }

    /// Waiting arrivals plus blocked transfers at end of hour
    pub fn queue(&self) -> u32 {
        self.waiting_arrivals.saturating_add(self.blocked_total())
    }

    /// Patients covered only by extra staff
    pub fn overcrowding(&self) -> u32 {
        self.next_patients.saturating_sub(self.next_staff)
    }
}

/// Evaluated flows for every department
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourFlows {
    pub departments: BTreeMap<DepartmentId, DepartmentFlow>,
}

fn violation(department: DepartmentId, constraint: ConstraintKind, detail: String) -> EngineError {
    EngineError::InvalidDecision {
        department,
        constraint,
        detail,
    }
}

impl HourFlows {
    /// Substitute `decision` into `plan`
    ///
    /// Fails on the first violated constraint; a decision that passes keeps
    /// every department within rooms and staff coverage.
    pub fn evaluate(plan: &HourPlan, decision: &Decision) -> Result<Self, EngineError> {
        for id in DepartmentId::ALL {
            if !decision.departments.contains_key(&id) {
                return Err(ConfigurationError::department(id, "decision", "missing department").into());
            }
        }

        let mut transfers_out: BTreeMap<DepartmentId, u32> = BTreeMap::new();
        for (&destination, choice) in &decision.departments {
            for (&source, &admitted) in &choice.admitted_transfers {
                let requested = plan.requested(Route::new(source, destination));
                if admitted > requested {
                    return Err(violation(
                        destination,
                        ConstraintKind::TransferBound,
                        format!(
                            "{} admitted from {} but only {} requested",
                            admitted, source, requested
                        ),
                    ));
                }
                *transfers_out.entry(source).or_insert(0) += admitted;
            }
        }

        let mut departments = BTreeMap::new();
        for id in DepartmentId::ALL {
            let dept = plan.department(id);
            let choice = &decision.departments[&id];

            if choice.extra_staff_called > dept.extra_cap {
                return Err(violation(
                    id,
                    ConstraintKind::ExtraStaffBound,
                    format!(
                        "{} extra staff called, cap is {}",
                        choice.extra_staff_called, dept.extra_cap
                    ),
                ));
            }

            let split = u64::from(choice.ambulance_admitted) + u64::from(choice.ambulance_diverted);
            if split != u64::from(dept.ambulance_arrivals) {
                return Err(violation(
                    id,
                    ConstraintKind::AmbulanceSplit,
                    format!(
                        "{} admitted + {} diverted != {} arrivals",
                        choice.ambulance_admitted, choice.ambulance_diverted, dept.ambulance_arrivals
                    ),
                ));
            }

            let pool = dept.fixed_pool().saturating_add(choice.ambulance_admitted);
            if choice.admitted_new > pool {
                return Err(violation(
                    id,
                    ConstraintKind::ArrivalPool,
                    format!("{} roomed from a pool of {}", choice.admitted_new, pool),
                ));
            }

            let mut blocked_out = BTreeMap::new();
            for (route, &requested) in plan.routes_from(id) {
                let accepted = decision.departments[&route.destination].admitted_from(id);
                if requested > accepted {
                    blocked_out.insert(route.destination, requested - accepted);
                }
            }

            let out = transfers_out.get(&id).copied().unwrap_or(0);
            let transfers_in: i64 = choice.admitted_transfers.values().map(|&n| i64::from(n)).sum();
            let next_patients =
                i64::from(dept.staying) - i64::from(out) + transfers_in + i64::from(choice.admitted_new);

            if next_patients > i64::from(dept.rooms) {
                return Err(violation(
                    id,
                    ConstraintKind::RoomCapacity,
                    format!("{} patients for {} rooms", next_patients, dept.rooms),
                ));
            }
            let effective_staff = i64::from(dept.next_staff) + i64::from(choice.extra_staff_called);
            if next_patients > effective_staff {
                return Err(violation(
                    id,
                    ConstraintKind::StaffingCoverage,
                    format!("{} patients for {} staff", next_patients, effective_staff),
                ));
            }
            // out never exceeds the requests counted in `staying`
            let next_patients = u32::try_from(next_patients).map_err(|_| {
                violation(
                    id,
                    ConstraintKind::TransferBound,
                    format!("occupancy {} below zero", next_patients),
                )
            })?;

            departments.insert(
                id,
                DepartmentFlow {
                    discharged: dept.discharged,
                    roomed: choice.admitted_new,
                    // at most next_patients once the room check passes
                    transfers_in: u32::try_from(transfers_in).unwrap_or(u32::MAX),
                    transfers_out: out,
                    blocked_out,
                    waiting_arrivals: pool - choice.admitted_new,
                    next_patients,
                    next_staff: dept.next_staff,
                    extra_staff_called: choice.extra_staff_called,
                    ambulance_admitted: choice.ambulance_admitted,
                    ambulance_diverted: choice.ambulance_diverted,
                },
            );
        }

        Ok(Self { departments })
    }

    pub fn department(&self, id: DepartmentId) -> &DepartmentFlow {
        &self.departments[&id]
    }
}
