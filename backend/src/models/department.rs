//! Department model
//!
//! A department is a block of rooms with a base staff roster. Each snapshot
//! records occupancy and the two kinds of waiting patients:
//! - **Waiting arrivals**: accepted into the department's flow but not yet
//!   roomed (they do not occupy a room)
//! - **Blocked transfers**: roomed patients ready to move to another
//!   department whose destination has not accepted them yet
//!
//! # Critical Invariants
//!
//! 1. `patients <= rooms`
//! 2. `patients <= staff + extra_staff_called`
//! 3. Blocked transfers are a subset of `patients`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the four hospital departments
///
/// Ordering is canonical (ED, SD, CC, SU) so every `BTreeMap` keyed by
/// department iterates in the same order on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DepartmentId {
    /// Emergency Department
    #[serde(rename = "ED")]
    Emergency,
    /// Step Down
    #[serde(rename = "SD")]
    StepDown,
    /// Critical Care
    #[serde(rename = "CC")]
    CriticalCare,
    /// Surgery
    #[serde(rename = "SU")]
    Surgery,
}

impl DepartmentId {
    /// All departments in canonical order
    pub const ALL: [DepartmentId; 4] = [
        DepartmentId::Emergency,
        DepartmentId::StepDown,
        DepartmentId::CriticalCare,
        DepartmentId::Surgery,
    ];

    /// Two-letter code used in serialized data and logs
    pub fn code(&self) -> &'static str {
        match self {
            DepartmentId::Emergency => "ED",
            DepartmentId::StepDown => "SD",
            DepartmentId::CriticalCare => "CC",
            DepartmentId::Surgery => "SU",
        }
    }

    /// Human-readable department name
    pub fn name(&self) -> &'static str {
        match self {
            DepartmentId::Emergency => "Emergency Department",
            DepartmentId::StepDown => "Step Down",
            DepartmentId::CriticalCare => "Critical Care",
            DepartmentId::Surgery => "Surgery",
        }
    }

    /// Only the Emergency Department receives walk-ins and ambulances
    pub fn is_emergency(&self) -> bool {
        matches!(self, DepartmentId::Emergency)
    }
}

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Snapshot of one department at the start of an hour
///
/// # Example
///
/// ```rust
/// use hospital_flow_core::Department;
///
/// let ed = Department::new(25, 16, 18);
/// assert_eq!(ed.free_rooms(), 9);
/// assert_eq!(ed.extra_staff_available, 7);
/// assert_eq!(ed.queue(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Room capacity
    pub rooms: u32,

    /// Occupied rooms, including patients waiting on a transfer
    pub patients: u32,

    /// Base staff on the roster
    pub staff: u32,

    /// Maximum extra staff that may be called in for one hour
    pub extra_staff_available: u32,

    /// Extra staff on shift during the hour that produced this snapshot
    #[serde(default)]
    pub extra_staff_called: u32,

    /// Arrivals accepted into the department but not yet roomed
    #[serde(default)]
    pub waiting_arrivals: u32,

    /// Roomed patients waiting on a destination department, keyed by destination
    #[serde(default)]
    pub blocked_transfers: BTreeMap<DepartmentId, u32>,
}

impl Department {
    /// Create a department with no queue
    ///
    /// The extra-staff cap defaults to the staffing headroom `rooms - staff`:
    /// staff beyond the room count cannot raise coverage.
    pub fn new(rooms: u32, patients: u32, staff: u32) -> Self {
        Self {
            rooms,
            patients,
            staff,
            extra_staff_available: rooms.saturating_sub(staff),
            extra_staff_called: 0,
            waiting_arrivals: 0,
            blocked_transfers: BTreeMap::new(),
        }
    }

    /// Set the per-hour extra staff cap
    pub fn with_extra_staff_available(mut self, available: u32) -> Self {
        self.extra_staff_available = available;
        self
    }

    /// Rooms not currently occupied
    pub fn free_rooms(&self) -> u32 {
        self.rooms.saturating_sub(self.patients)
    }

    /// Patients waiting on a transfer out of this department
    pub fn blocked_total(&self) -> u32 {
        self.blocked_transfers
            .values()
            .fold(0u32, |total, &count| total.saturating_add(count))
    }

    /// Everyone waiting: unroomed arrivals plus blocked transfers
    pub fn queue(&self) -> u32 {
        self.waiting_arrivals.saturating_add(self.blocked_total())
    }

    /// Staff covering rooms during the hour that produced this snapshot
    pub fn effective_staff(&self) -> u32 {
        self.staff.saturating_add(self.extra_staff_called)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let mut ids = vec![
            DepartmentId::Surgery,
            DepartmentId::Emergency,
            DepartmentId::CriticalCare,
            DepartmentId::StepDown,
        ];
        ids.sort();
        assert_eq!(ids, DepartmentId::ALL.to_vec());
    }

    #[test]
    fn test_codes_round_trip_through_json_keys() {
        let mut map = BTreeMap::new();
        map.insert(DepartmentId::CriticalCare, 3u32);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"CC":3}"#);

        let back: BTreeMap<DepartmentId, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_queue_counts_blocked_transfers() {
        let mut sd = Department::new(30, 22, 24);
        sd.waiting_arrivals = 2;
        sd.blocked_transfers.insert(DepartmentId::CriticalCare, 3);

        assert_eq!(sd.blocked_total(), 3);
        assert_eq!(sd.queue(), 5);
    }

    #[test]
    fn test_default_extra_staff_is_headroom() {
        assert_eq!(Department::new(9, 4, 6).extra_staff_available, 3);
        assert_eq!(Department::new(5, 4, 6).extra_staff_available, 0);
    }
}
