//! Shared helpers for integration tests
//!
//! `assert_hard_constraints` recomputes next-hour occupancy from the raw
//! state, input and decision without going through the engine's own
//! evaluation code.

#![allow(dead_code)]

use hospital_flow_core::{Decision, DepartmentId, GameState, HourlyInput};

/// End-of-hour occupancy of one department, recomputed from scratch
pub fn next_patients(state: &GameState, input: &HourlyInput, decision: &Decision, id: DepartmentId) -> i64 {
    let dept = state.department(id).unwrap();
    let facts = input.department(id);
    let choice = decision.department(id).unwrap();

    let new_requests_out: u32 = DepartmentId::ALL
        .iter()
        .map(|&dest| input.transfer_request(id, dest))
        .sum();
    let discharged = facts.ready_to_exit - new_requests_out;
    let transfers_out: u32 = DepartmentId::ALL
        .iter()
        .map(|&dest| decision.department(dest).unwrap().admitted_from(id))
        .sum();
    let transfers_in = choice.admitted_transfers_total();

    i64::from(dept.patients) - i64::from(discharged) - i64::from(transfers_out)
        + i64::from(transfers_in)
        + i64::from(choice.admitted_new)
}

/// Base staff after the hour's delta, clamped at zero
pub fn next_staff(state: &GameState, input: &HourlyInput, id: DepartmentId) -> i64 {
    (i64::from(state.department(id).unwrap().staff) + i64::from(input.department(id).staffing_delta)).max(0)
}

/// Panic if `decision` breaks any hard constraint for (state, input)
pub fn assert_hard_constraints(state: &GameState, input: &HourlyInput, decision: &Decision) {
    for id in DepartmentId::ALL {
        let dept = state.department(id).unwrap();
        let facts = input.department(id);
        let choice = decision.department(id).expect("every department decided");

        let next = next_patients(state, input, decision, id);
        let staff = next_staff(state, input, id);
        let cap = facts.extra_staff_available.unwrap_or(dept.extra_staff_available);

        assert!(next >= 0, "{}: negative occupancy {}", id, next);
        assert!(next <= i64::from(dept.rooms), "{}: {} patients for {} rooms", id, next, dept.rooms);
        assert!(
            next <= staff + i64::from(choice.extra_staff_called),
            "{}: {} patients for {} + {} staff",
            id,
            next,
            staff,
            choice.extra_staff_called
        );
        assert!(choice.extra_staff_called <= cap, "{}: extra staff above cap", id);
        assert_eq!(
            choice.ambulance_admitted + choice.ambulance_diverted,
            facts.ambulance_arrivals,
            "{}: ambulance split",
            id
        );

        let pool = dept.waiting_arrivals + facts.walk_in_arrivals + facts.external_arrivals + choice.ambulance_admitted;
        assert!(choice.admitted_new <= pool, "{}: roomed {} from pool {}", id, choice.admitted_new, pool);

        for (&source, &admitted) in &choice.admitted_transfers {
            let carried = state
                .department(source)
                .unwrap()
                .blocked_transfers
                .get(&id)
                .copied()
                .unwrap_or(0);
            let requested = carried + input.transfer_request(source, id);
            assert!(
                admitted <= requested,
                "{} admitted {} from {} but {} requested",
                id,
                admitted,
                source,
                requested
            );
        }
    }
}
