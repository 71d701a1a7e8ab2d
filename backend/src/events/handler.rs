//! Event deck scheduling and application
//!
//! This module handles:
//! - Validating scheduled cards
//! - Selecting the cards due in an hour
//! - Folding them into that hour's input

use crate::error::ConfigurationError;
use crate::events::types::{EventCard, EventSchedule, ScheduledEvent};
use crate::models::input::HourlyInput;
use serde::{Deserialize, Serialize};

/// The scenario's scheduled event cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventDeck {
    events: Vec<ScheduledEvent>,
}

impl EventDeck {
    /// Create a deck from scheduled cards
    pub fn new(events: Vec<ScheduledEvent>) -> Self {
        Self { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Reject zero intervals, hour 0, and non-finite or negative rates
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for scheduled in &self.events {
            match scheduled.schedule {
                EventSchedule::OneTime { hour: 0 } | EventSchedule::Repeating { start_hour: 0, .. } => {
                    return Err(ConfigurationError::global("events", "hours start at 1"));
                }
                EventSchedule::Repeating { interval: 0, .. } => {
                    return Err(ConfigurationError::global("events", "repeating interval must be at least 1"));
                }
                _ => {}
            }

            let rate = match scheduled.event {
                EventCard::ExtraStaffCost { cost } => Some(("extra_staff_cost", cost)),
                EventCard::DiversionPenalty { penalty } => Some(("diversion_penalty", penalty)),
                EventCard::QualityWeight { weight } => Some(("quality_weight", weight)),
                EventCard::FlowReward { reward } => Some(("flow_reward", reward)),
                EventCard::StaffingChange { .. } | EventCard::ExtraStaffCap { .. } => None,
            };
            if let Some((field, value)) = rate {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigurationError::global(
                        field,
                        format!("event card value {} must be finite and non-negative", value),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Cards due at a specific hour, in deck order
    pub fn cards_for_hour(&self, hour: u32) -> Vec<&EventCard> {
        self.events
            .iter()
            .filter(|scheduled| scheduled.schedule.should_apply(hour))
            .map(|scheduled| &scheduled.event)
            .collect()
    }

    /// Fold every card due at `hour` into a copy of `input`
    ///
    /// Staffing deltas add up; caps and rates override, the last card winning.
    pub fn apply(&self, hour: u32, input: &HourlyInput) -> Result<HourlyInput, ConfigurationError> {
        let mut input = input.clone();
        for card in self.cards_for_hour(hour) {
            card.apply(&mut input)?;
            tracing::debug!(hour, ?card, "applied event card");
        }
        Ok(input)
    }
}

impl EventCard {
    /// Modify one hour's input
    pub fn apply(&self, input: &mut HourlyInput) -> Result<(), ConfigurationError> {
        match *self {
            EventCard::StaffingChange { department, delta } => {
                let facts = input.department_mut(department);
                facts.staffing_delta = facts.staffing_delta.checked_add(delta).ok_or_else(|| {
                    ConfigurationError::department(department, "staffing_delta", "overflow")
                })?;
            }
            EventCard::ExtraStaffCap {
                department,
                available,
            } => input.department_mut(department).extra_staff_available = Some(available),
            EventCard::ExtraStaffCost { cost } => input.overrides.extra_staff_cost = Some(cost),
            EventCard::DiversionPenalty { penalty } => {
                input.overrides.diversion_penalty = Some(penalty)
            }
            EventCard::QualityWeight { weight } => input.overrides.quality_weight = Some(weight),
            EventCard::FlowReward { reward } => input.overrides.flow_reward = Some(reward),
        }
        Ok(())
    }
}
