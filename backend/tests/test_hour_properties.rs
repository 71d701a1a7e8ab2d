//! Property tests over generated hours
//!
//! Every generated hour starts from State 0 with non-negative staffing
//! changes, so a feasible decision always exists (admit nobody, move nobody).

mod common;

use common::assert_hard_constraints;
use hospital_flow_core::{
    apply_hour, solve_hour, DepartmentId, GameState, HourlyInput, OptimizationConfig, SolveStatus,
};
use proptest::prelude::*;

const NON_ED: [DepartmentId; 3] = [
    DepartmentId::StepDown,
    DepartmentId::CriticalCare,
    DepartmentId::Surgery,
];

fn destination(source: DepartmentId, pick: usize) -> DepartmentId {
    let others: Vec<DepartmentId> = DepartmentId::ALL.into_iter().filter(|&id| id != source).collect();
    others[pick % others.len()]
}

prop_compose! {
    fn arb_hour()(
        walk_ins in 0u32..8,
        ambulances in 0u32..5,
        external in proptest::collection::vec(0u32..3, 3),
        discharges in proptest::collection::vec(0u32..3, 4),
        exits in proptest::collection::vec((0u32..3, 0usize..3), 4),
        deltas in proptest::collection::vec(0i32..3, 4),
        caps in proptest::collection::vec(proptest::option::of(0u32..4), 4),
    ) -> HourlyInput {
        let mut input = HourlyInput::new().with_walk_ins(walk_ins).with_ambulances(ambulances);
        for (i, id) in NON_ED.into_iter().enumerate() {
            input = input.with_external_arrivals(id, external[i]);
        }
        for (i, id) in DepartmentId::ALL.into_iter().enumerate() {
            let (count, pick) = exits[i];
            input = input
                .with_discharges(id, discharges[i])
                .with_exit_to(id, destination(id, pick), count)
                .with_staffing_delta(id, deltas[i]);
            if let Some(cap) = caps[i] {
                input = input.with_extra_staff_available(id, cap);
            }
        }
        input
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_decisions_satisfy_hard_constraints(input in arb_hour()) {
        let state = GameState::initial();
        let solution = solve_hour(&state, &input, &OptimizationConfig::default()).unwrap();

        prop_assert_eq!(solution.status, SolveStatus::Optimal);
        assert_hard_constraints(&state, &input, &solution.decision);
    }

    #[test]
    fn prop_ambulances_admitted_or_diverted(input in arb_hour()) {
        let state = GameState::initial();
        let solution = solve_hour(&state, &input, &OptimizationConfig::default()).unwrap();

        let ed = solution.decision.department(DepartmentId::Emergency).unwrap();
        let arrivals = input.department(DepartmentId::Emergency).ambulance_arrivals;
        prop_assert_eq!(ed.ambulance_admitted + ed.ambulance_diverted, arrivals);
    }

    #[test]
    fn prop_walk_ins_roomed_or_queued(input in arb_hour()) {
        let state = GameState::initial();
        let solution = solve_hour(&state, &input, &OptimizationConfig::default()).unwrap();
        let decision = solution.decision.clone();
        let next = apply_hour(&state, &input, solution.decision).unwrap();

        let ed = decision.department(DepartmentId::Emergency).unwrap();
        let pool = input.department(DepartmentId::Emergency).walk_in_arrivals + ed.ambulance_admitted;
        let waiting = next.department(DepartmentId::Emergency).unwrap().waiting_arrivals;
        prop_assert_eq!(ed.admitted_new + waiting, pool);
    }

    #[test]
    fn prop_totals_grow_and_occupancy_fits(input in arb_hour()) {
        let state = GameState::initial();
        let solution = solve_hour(&state, &input, &OptimizationConfig::default()).unwrap();
        let next = apply_hour(&state, &input, solution.decision).unwrap();

        prop_assert!(next.totals.dominates(&state.totals));
        prop_assert_eq!(next.hour, state.hour + 1);
        for id in DepartmentId::ALL {
            let dept = next.department(id).unwrap();
            prop_assert!(dept.patients <= dept.rooms);
            prop_assert!(dept.patients <= dept.staff + dept.extra_staff_called);
            prop_assert!(dept.blocked_total() <= dept.patients);
        }
    }
}
