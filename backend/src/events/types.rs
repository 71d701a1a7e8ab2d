//! Event card types
//!
//! Event cards modify one hour's input before it is solved: staffing swings,
//! extra staff caps, and cost coefficients. They mirror the game's
//! facilitator deck.
//!
//! # Design Principles
//!
//! 1. **Determinism**: Cards are scheduled by hour and applied in deck order
//! 2. **Input only**: Cards never touch the game state, only the hour's input
//! 3. **Self-contained**: Cards carry all the data they need

use crate::models::department::DepartmentId;
use serde::{Deserialize, Serialize};

/// A card that modifies one hour's input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventCard {
    /// Change a department's base staff for the hour
    ///
    /// Added to any staffing delta already in the input.
    ///
    /// # Example
    /// Flu outbreak: Step Down loses two nurses
    StaffingChange { department: DepartmentId, delta: i32 },

    /// Set how many extra staff a department may call this hour
    ///
    /// # Example
    /// Agency shortage: Critical Care can call at most one extra
    ExtraStaffCap { department: DepartmentId, available: u32 },

    /// Override the cost of one extra staff member
    ExtraStaffCost { cost: f64 },

    /// Override the financial penalty per diverted ambulance
    DiversionPenalty { penalty: f64 },

    /// Override the weight of the quality penalty in the objective
    QualityWeight { weight: f64 },

    /// Override the reward per admitted patient
    FlowReward { reward: f64 },
}

/// When a card is played
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventSchedule {
    /// Play once at a specific hour
    OneTime { hour: u32 },

    /// Play every `interval` hours starting at `start_hour`
    Repeating { start_hour: u32, interval: u32 },
}

impl EventSchedule {
    /// Check if this schedule plays at the given hour
    pub fn should_apply(&self, hour: u32) -> bool {
        match self {
            EventSchedule::OneTime { hour: event_hour } => hour == *event_hour,
            EventSchedule::Repeating {
                start_hour,
                interval,
            } => *interval > 0 && hour >= *start_hour && (hour - start_hour) % interval == 0,
        }
    }
}

/// A card paired with its schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub event: EventCard,
    pub schedule: EventSchedule,
}
