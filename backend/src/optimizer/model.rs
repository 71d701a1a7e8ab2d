//! MILP formulation of one hour
//!
//! Variables (integer unless noted), per department:
//!
//! ```text
//! roomed        ∈ [0, max pool]        arrivals moved into a room
//! extra_staff   ∈ [0, extra cap]
//! overcrowding  ∈ [0, rooms]  (cont.)  ≥ next_patients − next_staff
//! ED only:
//! amb_admitted, amb_diverted ∈ [0, ambulances], amb_admitted + amb_diverted = ambulances
//! ```
//!
//! and one `transfer ∈ [0, requested]` per pending route. With
//!
//! ```text
//! next_patients = staying − Σ transfers out + Σ transfers in + roomed
//! waiting       = pool − roomed
//! held          = requests out − Σ transfers out
//! ```
//!
//! the constraints are `roomed ≤ pool`, `next_patients ≤ rooms` and
//! `next_patients ≤ next_staff + extra_staff`. Walk-ins have no variable:
//! they are always in the pool, so they are roomed or queued, never refused.
//! `waiting` and `held` are priced with the department's own queue rates.

use crate::core::plan::{HourPlan, Route};
use crate::costs::rates::OptimizationConfig;
use crate::models::department::DepartmentId;
use good_lp::{
    constraint, default_solver, variable, Constraint, Expression, ProblemVariables,
    ResolutionError, Solution, SolverModel, Variable,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
struct AmbulanceVars {
    admitted: Variable,
    diverted: Variable,
}

#[derive(Debug, Clone, Copy)]
struct DepartmentVars {
    roomed: Variable,
    extra_staff: Variable,
    ambulance: Option<AmbulanceVars>,
}

/// Solver values for one department, before integrality checks
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RawDepartment {
    pub roomed: f64,
    pub extra_staff: f64,
    pub ambulance_admitted: f64,
    pub ambulance_diverted: f64,
}

/// Solver values for the whole hour, before integrality checks
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RawPoint {
    pub departments: BTreeMap<DepartmentId, RawDepartment>,
    pub transfers: BTreeMap<Route, f64>,
}

/// The assembled program for one hour
pub(crate) struct HourModel {
    variables: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    departments: BTreeMap<DepartmentId, DepartmentVars>,
    transfers: BTreeMap<Route, Variable>,
}

impl HourModel {
    pub fn build(plan: &HourPlan, rates: &OptimizationConfig) -> Self {
        let mut variables = ProblemVariables::new();
        let mut constraints = Vec::new();
        let mut objective = Expression::from(0.0);

        let mut transfers = BTreeMap::new();
        for (&route, &requested) in &plan.routes {
            let transfer = variables.add(variable().integer().min(0.0).max(f64::from(requested)));
            // every accepted transfer is an admission
            objective -= rates.flow_reward * transfer;
            transfers.insert(route, transfer);
        }

        let diversion_weight =
            rates.diversion_penalty + rates.quality_weight * rates.diversion_quality_penalty;
        let overcrowding_weight = rates.quality_weight * rates.overcrowding_penalty;

        let mut departments = BTreeMap::new();
        for (&id, dept) in &plan.departments {
            let roomed = variables.add(variable().integer().min(0.0).max(f64::from(dept.max_pool())));
            let extra_staff =
                variables.add(variable().integer().min(0.0).max(f64::from(dept.extra_cap)));
            let overcrowding = variables.add(variable().min(0.0).max(f64::from(dept.rooms)));

            let mut pool = Expression::from(f64::from(dept.fixed_pool()));
            let ambulance = if dept.ambulance_arrivals > 0 {
                let arrivals = f64::from(dept.ambulance_arrivals);
                let admitted = variables.add(variable().integer().min(0.0).max(arrivals));
                let diverted = variables.add(variable().integer().min(0.0).max(arrivals));
                constraints.push(constraint!(admitted + diverted == arrivals));
                pool += admitted;
                objective += diversion_weight * diverted;
                Some(AmbulanceVars { admitted, diverted })
            } else {
                None
            };
            constraints.push(constraint!(roomed <= pool.clone()));

            let mut next_patients = Expression::from(f64::from(dept.staying));
            let waiting = pool - roomed;
            let mut held = Expression::from(f64::from(plan.requests_out(id)));
            for (route, _) in plan.routes_from(id) {
                let transfer = transfers[route];
                next_patients -= transfer;
                held -= transfer;
            }
            for (route, _) in plan.routes_into(id) {
                next_patients += transfers[route];
            }
            next_patients += roomed;

            let mut coverage = Expression::from(f64::from(dept.next_staff));
            coverage += extra_staff;
            let mut base_plus_overcrowding = Expression::from(f64::from(dept.next_staff));
            base_plus_overcrowding += overcrowding;

            constraints.push(constraint!(next_patients.clone() <= f64::from(dept.rooms)));
            constraints.push(constraint!(next_patients.clone() <= coverage));
            constraints.push(constraint!(next_patients <= base_plus_overcrowding));

            objective += rates.extra_staff_cost * extra_staff;
            objective += overcrowding_weight * overcrowding;
            let queue = rates.queue_rates(id);
            objective += (queue.arrivals_waiting_cost
                + rates.quality_weight * queue.arrivals_waiting_penalty)
                * waiting;
            objective += (queue.requests_waiting_cost
                + rates.quality_weight * queue.requests_waiting_penalty)
                * held;
            objective -= rates.flow_reward * roomed;

            departments.insert(
                id,
                DepartmentVars {
                    roomed,
                    extra_staff,
                    ambulance,
                },
            );
        }

        tracing::debug!(
            hour = plan.hour,
            routes = transfers.len(),
            constraints = constraints.len(),
            "assembled hour model"
        );

        Self {
            variables,
            objective,
            constraints,
            departments,
            transfers,
        }
    }

    /// Run branch-and-bound and read back every decision variable
    pub fn solve(self) -> Result<RawPoint, ResolutionError> {
        let HourModel {
            variables,
            objective,
            constraints,
            departments,
            transfers,
        } = self;

        let mut problem = variables.minimise(objective).using(default_solver);
        for c in constraints {
            problem = problem.with(c);
        }
        let solution = problem.solve()?;

        let departments = departments
            .into_iter()
            .map(|(id, vars)| {
                let (ambulance_admitted, ambulance_diverted) = match vars.ambulance {
                    Some(ambulance) => (
                        solution.value(ambulance.admitted),
                        solution.value(ambulance.diverted),
                    ),
                    None => (0.0, 0.0),
                };
                let raw = RawDepartment {
                    roomed: solution.value(vars.roomed),
                    extra_staff: solution.value(vars.extra_staff),
                    ambulance_admitted,
                    ambulance_diverted,
                };
                (id, raw)
            })
            .collect();
        let transfers = transfers
            .into_iter()
            .map(|(route, transfer)| (route, solution.value(transfer)))
            .collect();

        Ok(RawPoint {
            departments,
            transfers,
        })
    }
}
