//! Optimization rates and solver settings
//!
//! Coefficients weighting the hourly objective. Financial values are in
//! dollars, quality values in penalty points; both are per patient (or per
//! staff member) per hour.

use crate::error::ConfigurationError;
use crate::models::department::DepartmentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Objective coefficients and solver settings for one hour
///
/// Defaults come from the game's cost tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Financial cost per extra staff member called in
    pub extra_staff_cost: f64,

    /// Financial cost per diverted ambulance
    pub diversion_penalty: f64,

    /// Multiplier applied to the total quality penalty
    pub quality_weight: f64,

    /// Reward per patient admitted (roomed arrival or accepted transfer)
    pub flow_reward: f64,

    /// Queue pricing per department; a missing entry uses that
    /// department's default rates
    pub queue_rates: BTreeMap<DepartmentId, QueueRates>,

    /// Quality penalty per patient covered only by extra staff
    pub overcrowding_penalty: f64,

    /// Quality penalty per diverted ambulance
    pub diversion_quality_penalty: f64,

    /// Solver budget and tolerances
    pub solver: SolverSettings,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            extra_staff_cost: 40.0,
            diversion_penalty: 5000.0,
            quality_weight: 1.0,
            flow_reward: 300.0,
            queue_rates: DepartmentId::ALL
                .iter()
                .map(|&id| (id, QueueRates::for_department(id)))
                .collect(),
            overcrowding_penalty: 5.0,
            diversion_quality_penalty: 200.0,
            solver: SolverSettings::default(),
        }
    }
}

/// End-of-hour queue pricing for one department
///
/// Arrivals waiting and blocked transfer requests are priced separately.
/// In the Emergency department both are "waiting" patients; elsewhere an
/// arrival left waiting is a lost elective case and costs far more, while
/// a held transfer only hurts quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueueRates {
    /// Financial cost per arrival still waiting for a room
    pub arrivals_waiting_cost: f64,

    /// Quality penalty per arrival still waiting for a room
    pub arrivals_waiting_penalty: f64,

    /// Financial cost per transfer request held in this department
    pub requests_waiting_cost: f64,

    /// Quality penalty per transfer request held in this department
    pub requests_waiting_penalty: f64,
}

impl QueueRates {
    /// The game's cost table for `id`
    pub fn for_department(id: DepartmentId) -> Self {
        if id.is_emergency() {
            Self {
                arrivals_waiting_cost: 150.0,
                arrivals_waiting_penalty: 20.0,
                requests_waiting_cost: 150.0,
                requests_waiting_penalty: 20.0,
            }
        } else {
            Self {
                arrivals_waiting_cost: 3750.0,
                arrivals_waiting_penalty: 20.0,
                requests_waiting_cost: 0.0,
                requests_waiting_penalty: 20.0,
            }
        }
    }

    fn coefficients(&self) -> [(&'static str, f64); 4] {
        [
            ("queue_rates.arrivals_waiting_cost", self.arrivals_waiting_cost),
            ("queue_rates.arrivals_waiting_penalty", self.arrivals_waiting_penalty),
            ("queue_rates.requests_waiting_cost", self.requests_waiting_cost),
            ("queue_rates.requests_waiting_penalty", self.requests_waiting_penalty),
        ]
    }
}

/// Wall-clock budget and integrality tolerances for the MILP solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Wall-clock budget per solve attempt (milliseconds)
    ///
    /// The budget bounds how long `solve_hour` waits, not the solve itself:
    /// the MILP backend has no time limit of its own, so a worker thread
    /// that overruns keeps its core busy until branch-and-bound finishes,
    /// and its late result is discarded.
    pub time_limit_ms: u64,

    /// Maximum distance from an integer accepted on the first attempt
    pub integrality_tolerance: f64,

    /// Stricter tolerance used for the single retry
    pub retry_integrality_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit_ms: 5_000,
            integrality_tolerance: 1e-6,
            retry_integrality_tolerance: 1e-9,
        }
    }
}

impl SolverSettings {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    /// Tolerances for the first attempt and the retry, in order
    pub fn attempt_tolerances(&self) -> [f64; 2] {
        [self.integrality_tolerance, self.retry_integrality_tolerance]
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.time_limit_ms == 0 {
            return Err(ConfigurationError::global(
                "solver.time_limit_ms",
                "must be positive",
            ));
        }
        for (field, value) in [
            ("solver.integrality_tolerance", self.integrality_tolerance),
            (
                "solver.retry_integrality_tolerance",
                self.retry_integrality_tolerance,
            ),
        ] {
            if !(value > 0.0 && value < 0.5) {
                return Err(ConfigurationError::global(
                    field,
                    format!("{} is outside (0, 0.5)", value),
                ));
            }
        }
        if self.retry_integrality_tolerance > self.integrality_tolerance {
            return Err(ConfigurationError::global(
                "solver.retry_integrality_tolerance",
                "must not be looser than integrality_tolerance",
            ));
        }
        Ok(())
    }
}

/// Per-hour coefficient overrides (event-card effects)
///
/// Unset fields fall back to the base `OptimizationConfig`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateOverrides {
    pub extra_staff_cost: Option<f64>,
    pub diversion_penalty: Option<f64>,
    pub quality_weight: Option<f64>,
    pub flow_reward: Option<f64>,
}

impl RateOverrides {
    pub fn is_empty(&self) -> bool {
        self == &RateOverrides::default()
    }
}

impl OptimizationConfig {
    /// Check every coefficient is finite and non-negative
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, value) in self.coefficients() {
            check_coefficient(None, field, value)?;
        }
        for (&id, queue) in &self.queue_rates {
            for (field, value) in queue.coefficients() {
                check_coefficient(Some(id), field, value)?;
            }
        }
        self.solver.validate()
    }

    /// Queue pricing for `id`
    pub fn queue_rates(&self, id: DepartmentId) -> QueueRates {
        self.queue_rates
            .get(&id)
            .copied()
            .unwrap_or_else(|| QueueRates::for_department(id))
    }

    /// Effective config for one hour
    ///
    /// The result is validated, so a bad override is reported as a
    /// configuration error on the overridden field.
    pub fn with_overrides(&self, overrides: &RateOverrides) -> Result<Self, ConfigurationError> {
        let mut effective = self.clone();
        if let Some(cost) = overrides.extra_staff_cost {
            effective.extra_staff_cost = cost;
        }
        if let Some(penalty) = overrides.diversion_penalty {
            effective.diversion_penalty = penalty;
        }
        if let Some(weight) = overrides.quality_weight {
            effective.quality_weight = weight;
        }
        if let Some(reward) = overrides.flow_reward {
            effective.flow_reward = reward;
        }
        effective.validate()?;
        Ok(effective)
    }

    fn coefficients(&self) -> [(&'static str, f64); 6] {
        [
            ("extra_staff_cost", self.extra_staff_cost),
            ("diversion_penalty", self.diversion_penalty),
            ("quality_weight", self.quality_weight),
            ("flow_reward", self.flow_reward),
            ("overcrowding_penalty", self.overcrowding_penalty),
            ("diversion_quality_penalty", self.diversion_quality_penalty),
        ]
    }
}

fn check_coefficient(
    department: Option<DepartmentId>,
    field: &'static str,
    value: f64,
) -> Result<(), ConfigurationError> {
    let reason = if !value.is_finite() {
        format!("{} is not finite", value)
    } else if value < 0.0 {
        format!("{} is negative", value)
    } else {
        return Ok(());
    };
    Err(ConfigurationError::new(department, field, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(OptimizationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = OptimizationConfig {
            overcrowding_penalty: -1.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "overcrowding_penalty");
        assert_eq!(err.department, None);
    }

    #[test]
    fn test_default_queue_rates_follow_cost_table() {
        let config = OptimizationConfig::default();

        let ed = config.queue_rates(DepartmentId::Emergency);
        assert_eq!(ed.arrivals_waiting_cost, 150.0);
        assert_eq!(ed.requests_waiting_cost, 150.0);
        assert_eq!(ed.arrivals_waiting_penalty, 20.0);

        for id in [DepartmentId::StepDown, DepartmentId::CriticalCare, DepartmentId::Surgery] {
            let rates = config.queue_rates(id);
            assert_eq!(rates.arrivals_waiting_cost, 3750.0, "{}", id);
            assert_eq!(rates.arrivals_waiting_penalty, 20.0);
            assert_eq!(rates.requests_waiting_cost, 0.0);
            assert_eq!(rates.requests_waiting_penalty, 20.0);
        }
    }

    #[test]
    fn test_missing_queue_entry_uses_department_default() {
        let mut config = OptimizationConfig::default();
        config.queue_rates.remove(&DepartmentId::Surgery);

        assert_eq!(
            config.queue_rates(DepartmentId::Surgery),
            QueueRates::for_department(DepartmentId::Surgery)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_queue_rate_names_department() {
        let mut config = OptimizationConfig::default();
        config
            .queue_rates
            .get_mut(&DepartmentId::CriticalCare)
            .unwrap()
            .requests_waiting_penalty = -20.0;

        let err = config.validate().unwrap_err();
        assert_eq!(err.department, Some(DepartmentId::CriticalCare));
        assert_eq!(err.field, "queue_rates.requests_waiting_penalty");
    }

    #[test]
    fn test_nan_rejected() {
        let config = OptimizationConfig {
            flow_reward: f64::NAN,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "flow_reward");
    }

    #[test]
    fn test_overrides_replace_only_set_fields() {
        let base = OptimizationConfig::default();
        let overrides = RateOverrides {
            diversion_penalty: Some(50.0),
            ..Default::default()
        };

        let effective = base.with_overrides(&overrides).unwrap();
        assert_eq!(effective.diversion_penalty, 50.0);
        assert_eq!(effective.extra_staff_cost, base.extra_staff_cost);
        assert_eq!(effective.flow_reward, base.flow_reward);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let overrides = RateOverrides {
            quality_weight: Some(-0.5),
            ..Default::default()
        };
        let err = OptimizationConfig::default()
            .with_overrides(&overrides)
            .unwrap_err();
        assert_eq!(err.field, "quality_weight");
    }

    #[test]
    fn test_solver_settings_bounds() {
        let mut settings = SolverSettings::default();
        assert!(settings.validate().is_ok());

        settings.time_limit_ms = 0;
        assert_eq!(settings.validate().unwrap_err().field, "solver.time_limit_ms");

        let settings = SolverSettings {
            retry_integrality_tolerance: 1e-3,
            ..Default::default()
        };
        assert_eq!(
            settings.validate().unwrap_err().field,
            "solver.retry_integrality_tolerance"
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: OptimizationConfig =
            serde_json::from_str(r#"{"flow_reward": 120.0, "solver": {"time_limit_ms": 250}}"#)
                .unwrap();
        assert_eq!(config.flow_reward, 120.0);
        assert_eq!(config.extra_staff_cost, 40.0);
        assert_eq!(config.solver.time_limit(), Duration::from_millis(250));
        assert_eq!(config.solver.integrality_tolerance, 1e-6);
    }
}
