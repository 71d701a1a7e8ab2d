//! Hospital Flow scenario runner
//!
//! Plays a scenario file hour by hour and prints one JSON `HourResult` per
//! line, followed by the final totals. Logs go to stderr.
//!
//! Usage:
//!   hospital-flow <scenario.json>
//!   RUST_LOG=debug hospital-flow <scenario.json>
//!
//! Scenario format:
//!
//! ```json
//! {
//!   "config": { "diversion_penalty": 50.0 },
//!   "events": [{ "event": { "type": "flow_reward", "reward": 200.0 }, "schedule": { "hour": 3 } }],
//!   "initial_state": null,
//!   "hours": [{ "departments": { "ED": { "walk_in_arrivals": 5 } } }]
//! }
//! ```

use hospital_flow_core::{
    EngineError, EventDeck, GameState, HourlyInput, OptimizationConfig, Orchestrator,
    OrchestratorConfig, Totals, GAME_HOURS,
};
use serde::Deserialize;
use std::io::{self, Write};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    config: OptimizationConfig,

    #[serde(default)]
    events: EventDeck,

    #[serde(default)]
    initial_state: Option<GameState>,

    #[serde(default)]
    max_hours: Option<u32>,

    hours: Vec<HourlyInput>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("usage: hospital-flow <scenario.json>")]
    Usage,

    #[error("cannot read {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("invalid scenario {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("hour {hour}: {source}")]
    Hour { hour: u32, source: EngineError },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),

    #[error("cannot encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn load_scenario(path: &str) -> Result<Scenario, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: path.to_string(),
        source,
    })
}

fn run(path: &str) -> Result<Totals, CliError> {
    let scenario = load_scenario(path)?;
    let config = OrchestratorConfig {
        optimization: scenario.config,
        events: scenario.events,
        initial_state: scenario.initial_state.unwrap_or_else(GameState::initial),
        max_hours: scenario.max_hours.unwrap_or(GAME_HOURS),
    };

    let mut orchestrator = Orchestrator::new(config)?;
    tracing::info!(
        path,
        hours = scenario.hours.len(),
        start_hour = orchestrator.current_hour(),
        "running scenario"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for input in &scenario.hours {
        let hour = orchestrator.current_hour();
        let result = orchestrator
            .run_hour(input)
            .map_err(|source| CliError::Hour { hour, source })?;
        serde_json::to_writer(&mut out, &result)?;
        writeln!(out)?;
    }

    let totals = orchestrator.totals().clone();
    serde_json::to_writer(&mut out, &totals)?;
    writeln!(out)?;
    Ok(totals)
}

fn main() -> ExitCode {
    init_logging();

    let outcome = match std::env::args().nth(1) {
        Some(path) => run(&path),
        None => Err(CliError::Usage),
    };

    match outcome {
        Ok(totals) => {
            tracing::info!(
                financial = totals.total_financial_cost,
                quality = totals.total_quality_penalty,
                admitted = totals.total_admitted,
                "scenario complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "scenario failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
