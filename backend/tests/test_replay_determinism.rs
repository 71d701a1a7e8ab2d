//! Integration tests for replay identity
//!
//! A full game is played once while its inputs are recorded; replaying the
//! recording must reproduce every decision and every state fingerprint.

use hospital_flow_core::{
    replay, DepartmentId, EngineError, EventCard, EventDeck, EventSchedule, GameState, HourlyInput,
    Orchestrator, OrchestratorConfig, ScheduledEvent, GAME_HOURS,
};

/// Deterministic busy hour derived from the current state
fn busy_hour(state: &GameState) -> HourlyInput {
    let h = state.hour;
    let mut input = HourlyInput::new()
        .with_walk_ins(2 + h % 4)
        .with_ambulances(h % 3)
        .with_external_arrivals(DepartmentId::Surgery, h % 2)
        .with_external_arrivals(DepartmentId::CriticalCare, (h + 1) % 3 / 2);

    let exitable = |id: DepartmentId| {
        let dept = state.department(id).unwrap();
        dept.patients - dept.blocked_total()
    };

    let ed_out = exitable(DepartmentId::Emergency).min(2 + h % 2);
    if ed_out > 0 {
        input = input.with_discharges(DepartmentId::Emergency, ed_out - 1);
        input = input.with_exit_to(DepartmentId::Emergency, DepartmentId::StepDown, 1);
    }
    if exitable(DepartmentId::StepDown) >= 2 {
        input = input.with_discharges(DepartmentId::StepDown, 2);
    }
    if h % 3 == 0 && exitable(DepartmentId::Surgery) >= 1 {
        input = input.with_exit_to(DepartmentId::Surgery, DepartmentId::CriticalCare, 1);
    }
    if h % 4 == 1 && exitable(DepartmentId::CriticalCare) >= 1 {
        input = input.with_exit_to(DepartmentId::CriticalCare, DepartmentId::StepDown, 1);
    }
    input
}

fn scenario_config() -> OrchestratorConfig {
    OrchestratorConfig {
        events: EventDeck::new(vec![
            ScheduledEvent {
                event: EventCard::StaffingChange {
                    department: DepartmentId::StepDown,
                    delta: -1,
                },
                schedule: EventSchedule::Repeating {
                    start_hour: 6,
                    interval: 6,
                },
            },
            ScheduledEvent {
                event: EventCard::QualityWeight { weight: 2.0 },
                schedule: EventSchedule::OneTime { hour: 12 },
            },
        ]),
        ..Default::default()
    }
}

/// Play a whole game, recording the inputs used
fn record_game(config: &OrchestratorConfig) -> (Vec<HourlyInput>, Vec<String>, GameState) {
    let mut orchestrator = Orchestrator::new(config.clone()).unwrap();
    let mut inputs = Vec::new();
    let mut fingerprints = Vec::new();

    while !orchestrator.is_finished() {
        let input = busy_hour(orchestrator.state());
        let result = orchestrator.run_hour(&input).unwrap();
        inputs.push(input);
        fingerprints.push(result.state_fingerprint);
    }
    (inputs, fingerprints, orchestrator.state().clone())
}

#[test]
fn test_replay_reproduces_recorded_game() {
    let config = scenario_config();
    let (inputs, fingerprints, final_state) = record_game(&config);
    assert_eq!(inputs.len(), GAME_HOURS as usize);

    let outcome = replay(&GameState::initial(), &inputs, &config).unwrap();
    let replayed: Vec<String> = outcome
        .results
        .iter()
        .map(|r| r.state_fingerprint.clone())
        .collect();

    assert_eq!(replayed, fingerprints);
    assert_eq!(outcome.final_state, final_state);
    assert!(outcome.final_state.is_finished());
}

#[test]
fn test_two_replays_are_identical() {
    let config = scenario_config();
    let (inputs, _, _) = record_game(&config);

    let first = replay(&GameState::initial(), &inputs, &config).unwrap();
    let second = replay(&GameState::initial(), &inputs, &config).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.final_state.fingerprint().unwrap(),
        second.final_state.fingerprint().unwrap()
    );
}

#[test]
fn test_totals_never_decrease_over_a_game() {
    let config = scenario_config();
    let mut orchestrator = Orchestrator::new(config).unwrap();

    let mut previous = orchestrator.totals().clone();
    while !orchestrator.is_finished() {
        let input = busy_hour(orchestrator.state());
        orchestrator.run_hour(&input).unwrap();
        assert!(orchestrator.totals().dominates(&previous));
        previous = orchestrator.totals().clone();
    }
    assert!(previous.total_admitted > 0);
}

#[test]
fn test_replay_past_last_hour_fails() {
    let config = OrchestratorConfig {
        max_hours: 2,
        ..Default::default()
    };
    let inputs = vec![HourlyInput::new(); 3];

    let err = replay(&GameState::initial(), &inputs, &config).unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));
}

#[test]
fn test_fingerprint_changes_every_busy_hour() {
    let config = scenario_config();
    let (_, fingerprints, _) = record_game(&config);
    // the clock alone makes every state distinct
    for pair in fingerprints.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
}
