//! Per-tick state snapshots for viewers
//!
//! The engine produces one [`SimSnapshot`] per tick. Consumers register a
//! [`SnapshotSink`]; publishing never waits on a consumer.

use std::sync::{Arc, Mutex};

use log::debug;
use serde::Serialize;

use super::elevator::SimElevator;
use super::types::{Direction, ElevatorId, Floor, RushHourKind};

/// Observational counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickEvents {
    pub tick: u64,
    /// Requests that entered the pool (generated or injected)
    pub generated: usize,
    pub completed: usize,
    /// Requests assigned to a car this tick
    pub assigned: usize,
    /// Requests still without a car at the end of the tick
    pub unassigned: usize,
}

/// One car as a viewer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElevatorSnapshot {
    pub id: ElevatorId,
    pub floor: Floor,
    pub direction: Direction,
    pub passengers: u32,
    pub capacity: u32,
    pub doors_open: bool,
    pub target_floor: Option<Floor>,
    pub is_moving: bool,
    pub assigned_requests: usize,
    pub floors_traveled: u64,
    pub stops_made: u64,
}

impl From<&SimElevator> for ElevatorSnapshot {
    fn from(elevator: &SimElevator) -> Self {
        Self {
            id: elevator.id,
            floor: elevator.current_floor,
            direction: elevator.direction,
            passengers: elevator.passenger_count,
            capacity: elevator.max_capacity,
            doors_open: elevator.doors_open,
            target_floor: elevator.target_floor,
            is_moving: elevator.is_moving,
            assigned_requests: elevator.assigned_requests.len(),
            floors_traveled: elevator.floors_traveled,
            stops_made: elevator.stops_made,
        }
    }
}

/// Full state produced once per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimSnapshot {
    pub tick: u64,
    pub time: u64,
    pub elevators: Vec<ElevatorSnapshot>,
    pub pending_requests: usize,
    pub total_requests: u64,
    pub completed_requests: u64,
    pub mean_wait: f64,
    pub max_wait: u64,
    pub max_travel: u64,
    pub mean_travel: f64,
    pub utilization_percent: f64,
    pub rush_hour: bool,
    pub rush_hour_kind: Option<RushHourKind>,
    pub simulated_hour: u32,
}

impl SimSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Receives every snapshot the controller publishes.
///
/// Implementations must return quickly; the tick cadence does not wait.
pub trait SnapshotSink {
    fn on_snapshot(&mut self, snapshot: &SimSnapshot, events: &TickEvents);
}

/// Logs tick events at debug level
#[derive(Debug, Default)]
pub struct LogSink;

impl SnapshotSink for LogSink {
    fn on_snapshot(&mut self, snapshot: &SimSnapshot, events: &TickEvents) {
        if events.generated > 0 {
            debug!("Tick {}: {} requests generated", events.tick, events.generated);
        }
        if events.completed > 0 {
            debug!(
                "Tick {}: {} requests completed ({} pending)",
                events.tick, events.completed, snapshot.pending_requests
            );
        }
    }
}

/// Overwrite-latest buffer: a viewer reads the newest snapshot whenever it
/// likes and older ones are simply replaced.
#[derive(Debug, Clone, Default)]
pub struct LatestSnapshot {
    slot: Arc<Mutex<Option<SimSnapshot>>>,
}

impl LatestSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent snapshot, if any has been published
    pub fn latest(&self) -> Option<SimSnapshot> {
        match self.slot.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Take the most recent snapshot, leaving the buffer empty
    pub fn take(&self) -> Option<SimSnapshot> {
        match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl SnapshotSink for LatestSnapshot {
    fn on_snapshot(&mut self, snapshot: &SimSnapshot, _events: &TickEvents) {
        match self.slot.lock() {
            Ok(mut slot) => *slot = Some(snapshot.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot.clone()),
        }
    }
}
