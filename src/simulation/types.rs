//! Core types for the elevator simulation
//!
//! Identifiers, directions and traffic modes shared by every other module.

use serde::Serialize;

/// A floor number. Floors are numbered from 1 (the lobby) upwards.
pub type Floor = u32;

/// The lowest floor in every building
pub const GROUND_FLOOR: Floor = 1;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SimId(pub usize);

/// A wrapper type for elevator IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ElevatorId(pub SimId);

/// A wrapper type for request IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestId(pub SimId);

impl ElevatorId {
    pub fn index(&self) -> usize {
        self.0 .0
    }
}

impl std::fmt::Display for ElevatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.0 .0)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.0 .0)
    }
}

/// Travel direction of an elevator or a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Idle,
}

impl Direction {
    /// Direction needed to get from `from` to `to`
    pub fn between(from: Floor, to: Floor) -> Self {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Direction::Up,
            std::cmp::Ordering::Less => Direction::Down,
            std::cmp::Ordering::Equal => Direction::Idle,
        }
    }
}

/// Which peak the building is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RushHourKind {
    /// Everyone arrives at the lobby and heads up
    Morning,
    /// Everyone heads down to the lobby
    Evening,
}

impl RushHourKind {
    /// The direction most requests travel in during this peak
    pub fn dominant_direction(&self) -> Direction {
        match self {
            RushHourKind::Morning => Direction::Up,
            RushHourKind::Evening => Direction::Down,
        }
    }
}
