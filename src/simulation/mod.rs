//! Elevator dispatch simulation
//!
//! This module contains the dispatch engine: requests, elevators, the
//! scoring scheduler and the tick loop. It runs headless and can be tested
//! without any viewer attached.

mod config;
mod controller;
mod elevator;
mod request;
mod scheduler;
mod snapshot;
mod stats;
mod traffic;
mod types;
mod world;

pub use config::{
    validate_arrival_rate, SchedulerConfig, SimConfig, DEFAULT_ARRIVAL_RATE, DEFAULT_CAPACITY,
    DEFAULT_ELEVATORS, DEFAULT_FLOORS, MAX_ARRIVAL_RATE,
};
pub use controller::{SimController, BASE_TICK_INTERVAL};
pub use elevator::{ElevatorUpdateResult, SimElevator};
pub use request::{RequestPool, RequestState, SimRequest};
pub use scheduler::{planned_stops, sweep_cost, DispatchContext, ElevatorScore, Scheduler};
pub use snapshot::{ElevatorSnapshot, LatestSnapshot, LogSink, SimSnapshot, SnapshotSink, TickEvents};
pub use stats::SimStats;
pub use traffic::{arrival_count, TrafficState, EVENING_RUSH_HOURS, MORNING_RUSH_HOURS};
pub use types::{Direction, ElevatorId, Floor, RequestId, RushHourKind, SimId, GROUND_FLOOR};
pub use world::SimWorld;
