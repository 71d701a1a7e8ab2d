//! Event cards
//!
//! Scheduled per-hour modifiers folded into the input before each solve.

pub mod handler;
pub mod types;

pub use handler::EventDeck;
pub use types::{EventCard, EventSchedule, ScheduledEvent};
