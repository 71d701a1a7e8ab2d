//! Game state
//!
//! The complete hospital state between two hours: one snapshot per
//! department, the hour about to be played, and the running totals.
//!
//! The engine never holds a `GameState`; the caller owns it and passes it
//! into every call.
//!
//! # Critical Invariants
//!
//! 1. Every department is present
//! 2. `hour` increases by exactly one per applied hour
//! 3. Totals never decrease

use crate::costs::accounting::Totals;
use crate::error::EngineError;
use crate::models::department::{Department, DepartmentId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Hours in one game
pub const GAME_HOURS: u32 = 24;

/// Hospital state at the start of an hour
///
/// # Example
///
/// ```rust
/// use hospital_flow_core::{DepartmentId, GameState};
///
/// let state = GameState::initial();
/// assert_eq!(state.hour, 1);
/// assert_eq!(state.department(DepartmentId::Emergency).unwrap().patients, 16);
/// assert_eq!(state.total_patients(), 54);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Hour about to be played (starts at 1)
    pub hour: u32,

    /// Department snapshots
    pub departments: BTreeMap<DepartmentId, Department>,

    /// Running totals
    #[serde(default)]
    pub totals: Totals,
}

impl GameState {
    /// Start a game at hour 1 with the given departments
    pub fn new(departments: BTreeMap<DepartmentId, Department>) -> Self {
        Self {
            hour: 1,
            departments,
            totals: Totals::new(),
        }
    }

    /// State 0 of the game
    pub fn initial() -> Self {
        let departments = [
            (DepartmentId::Emergency, Department::new(25, 16, 18)),
            (DepartmentId::StepDown, Department::new(30, 22, 24)),
            (DepartmentId::CriticalCare, Department::new(18, 12, 13)),
            (DepartmentId::Surgery, Department::new(9, 4, 6)),
        ]
        .into_iter()
        .collect();

        Self::new(departments)
    }

    pub fn department(&self, id: DepartmentId) -> Option<&Department> {
        self.departments.get(&id)
    }

    pub fn department_mut(&mut self, id: DepartmentId) -> Option<&mut Department> {
        self.departments.get_mut(&id)
    }

    /// Occupied rooms across the hospital
    pub fn total_patients(&self) -> u32 {
        self.departments
            .values()
            .fold(0u32, |total, d| total.saturating_add(d.patients))
    }

    /// Queued patients across the hospital
    pub fn total_queue(&self) -> u32 {
        self.departments
            .values()
            .fold(0u32, |total, d| total.saturating_add(d.queue()))
    }

    /// Whether every hour of the game has been played
    pub fn is_finished(&self) -> bool {
        self.hour > GAME_HOURS
    }

    /// SHA-256 of the canonical JSON form
    ///
    /// Department maps are ordered, so equal states always hash equal.
    pub fn fingerprint(&self) -> Result<String, EngineError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| EngineError::Serialization(format!("state serialization failed: {}", e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&json);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_matches_state_zero() {
        let state = GameState::initial();
        let expected = [
            (DepartmentId::Emergency, 25, 16, 18),
            (DepartmentId::StepDown, 30, 22, 24),
            (DepartmentId::CriticalCare, 18, 12, 13),
            (DepartmentId::Surgery, 9, 4, 6),
        ];

        for (id, rooms, patients, staff) in expected {
            let dept = state.department(id).unwrap();
            assert_eq!(dept.rooms, rooms, "{} rooms", id);
            assert_eq!(dept.patients, patients, "{} patients", id);
            assert_eq!(dept.staff, staff, "{} staff", id);
            assert_eq!(dept.queue(), 0);
        }
        assert_eq!(state.totals, Totals::default());
        assert!(!state.is_finished());
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let a = GameState::initial();
        let b = GameState::initial();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);

        let mut c = GameState::initial();
        c.department_mut(DepartmentId::Surgery).unwrap().waiting_arrivals = 1;
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }

    #[test]
    fn test_state_json_round_trip() {
        let state = GameState::initial();
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_finished_after_last_hour() {
        let mut state = GameState::initial();
        state.hour = GAME_HOURS;
        assert!(!state.is_finished());
        state.hour += 1;
        assert!(state.is_finished());
    }
}
