//! Hourly accounting and running totals
//!
//! `HourCosts` is computed once per decision from its evaluated flows. The
//! optimizer reports it and the transition adds it to `Totals`, so both read
//! the same numbers.

use crate::core::flows::HourFlows;
use crate::costs::rates::OptimizationConfig;
use serde::{Deserialize, Serialize};

/// Cost breakdown for a single hour
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourCosts {
    /// Extra staff called × extra_staff_cost
    pub extra_staff_cost: f64,

    /// Diverted ambulances × diversion_penalty
    pub diversion_cost: f64,

    /// Queued patients priced at each department's queue rates
    pub queue_cost: f64,

    /// Queued patients priced at each department's queue penalties (quality)
    pub queue_penalty: f64,

    /// Overcrowded patients × overcrowding_penalty (quality)
    pub overcrowding_penalty: f64,

    /// Diverted ambulances × diversion_quality_penalty (quality)
    pub diversion_quality_penalty: f64,

    /// Sum of the financial components
    pub financial_cost: f64,

    /// Sum of the quality components, before `quality_weight`
    pub quality_penalty: f64,

    /// Roomed arrivals plus accepted transfers
    pub admitted_patients: u32,

    /// Ambulances diverted
    pub ambulances_diverted: u32,

    /// Extra staff called, all departments
    pub extra_staff_called: u32,

    /// Patients discharged from the hospital
    pub discharged: u32,

    /// financial + quality_weight·quality − flow_reward·admitted
    pub objective: f64,
}

impl HourCosts {
    /// Price the evaluated flows of one hour
    pub fn from_flows(flows: &HourFlows, rates: &OptimizationConfig) -> Self {
        let mut costs = HourCosts::default();

        for (&id, flow) in &flows.departments {
            let queue = rates.queue_rates(id);
            let arrivals = f64::from(flow.waiting_arrivals);
            let requests = f64::from(flow.blocked_total());
            costs.extra_staff_cost += f64::from(flow.extra_staff_called) * rates.extra_staff_cost;
            costs.queue_cost +=
                arrivals * queue.arrivals_waiting_cost + requests * queue.requests_waiting_cost;
            costs.queue_penalty += arrivals * queue.arrivals_waiting_penalty
                + requests * queue.requests_waiting_penalty;
            costs.overcrowding_penalty +=
                f64::from(flow.overcrowding()) * rates.overcrowding_penalty;

            costs.admitted_patients = costs
                .admitted_patients
                .saturating_add(flow.roomed.saturating_add(flow.transfers_in));
            costs.ambulances_diverted = costs.ambulances_diverted.saturating_add(flow.ambulance_diverted);
            costs.extra_staff_called = costs.extra_staff_called.saturating_add(flow.extra_staff_called);
            costs.discharged = costs.discharged.saturating_add(flow.discharged);
        }

        let diverted = f64::from(costs.ambulances_diverted);
        costs.diversion_cost = diverted * rates.diversion_penalty;
        costs.diversion_quality_penalty = diverted * rates.diversion_quality_penalty;

        costs.financial_cost = costs.extra_staff_cost + costs.diversion_cost + costs.queue_cost;
        costs.quality_penalty =
            costs.queue_penalty + costs.overcrowding_penalty + costs.diversion_quality_penalty;
        costs.objective = costs.financial_cost + rates.quality_weight * costs.quality_penalty
            - rates.flow_reward * f64::from(costs.admitted_patients);

        costs
    }
}

/// Running totals carried across hours
///
/// Every field only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Totals {
    pub total_financial_cost: f64,
    pub total_quality_penalty: f64,
    pub total_admitted: u64,
    pub total_diverted: u64,
    pub total_discharged: u64,
    pub total_extra_staff_called: u64,
}

impl Totals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one hour's accounting
    pub fn add(&mut self, costs: &HourCosts) {
        self.total_financial_cost += costs.financial_cost;
        self.total_quality_penalty += costs.quality_penalty;
        self.total_admitted += u64::from(costs.admitted_patients);
        self.total_diverted += u64::from(costs.ambulances_diverted);
        self.total_discharged += u64::from(costs.discharged);
        self.total_extra_staff_called += u64::from(costs.extra_staff_called);
    }

    /// True when no field of `self` is below the same field of `earlier`
    pub fn dominates(&self, earlier: &Totals) -> bool {
        self.total_financial_cost >= earlier.total_financial_cost
            && self.total_quality_penalty >= earlier.total_quality_penalty
            && self.total_admitted >= earlier.total_admitted
            && self.total_diverted >= earlier.total_diverted
            && self.total_discharged >= earlier.total_discharged
            && self.total_extra_staff_called >= earlier.total_extra_staff_called
    }
}
