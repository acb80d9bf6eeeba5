//! Simulation and scheduler configuration
//!
//! Every tunable number the engine and scheduler use lives here so tests can
//! isolate a single scoring factor by zeroing the other weights.

use anyhow::{bail, Result};
use serde::Serialize;

use super::types::{Direction, Floor, GROUND_FLOOR};

/// Default number of floors in the building
pub const DEFAULT_FLOORS: Floor = 10;
/// Default fleet size
pub const DEFAULT_ELEVATORS: usize = 3;
/// Default mean number of new requests per tick
pub const DEFAULT_ARRIVAL_RATE: f64 = 0.3;
/// Default passengers per car
pub const DEFAULT_CAPACITY: u32 = 8;
/// Highest accepted mean number of new requests per tick
pub const MAX_ARRIVAL_RATE: f64 = 1000.0;

/// Weights and thresholds used by the [`Scheduler`](super::Scheduler)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerConfig {
    pub distance_weight: f64,
    pub load_weight: f64,
    pub route_weight: f64,
    pub direction_weight: f64,
    pub priority_weight: f64,

    /// Direction credit for an idle elevator
    pub idle_direction_score: f64,
    /// Direction credit for an elevator travelling the wrong way. Never zero.
    pub mismatch_direction_score: f64,
    /// Route score when exactly one of the request's floors is already a stop
    pub one_stop_in_path_score: f64,
    /// Extra floors of travel at which the route score halves
    pub route_decay_floors: f64,
    /// How strongly passenger load attenuates the distance score (0..=1)
    pub distance_load_attenuation: f64,

    /// Wait time after which priority starts to escalate (T1)
    pub escalation_threshold: f64,
    pub escalation_exponent: f64,
    pub escalation_scale: f64,
    /// Wait time after which the starvation bonus applies (T2)
    pub starvation_threshold: f64,
    pub starvation_bonus: f64,
    /// Wait time after which the critical bonus applies (T3)
    pub critical_threshold: f64,
    pub critical_bonus: f64,
    /// Priority value that maps to a priority factor of 1.0
    pub priority_normalizer: f64,

    /// Direction that receives a small priority bonus
    pub high_traffic_direction: Option<Direction>,
    pub high_traffic_direction_bonus: f64,
    /// Floors whose requests receive a small priority bonus
    pub high_traffic_floors: Vec<Floor>,
    pub high_traffic_floor_bonus: f64,
    /// Bonus for lobby-originated requests during a rush hour
    pub rush_hour_lobby_bonus: f64,

    /// Spread of assigned-request counts that triggers rebalancing
    pub rebalance_threshold: usize,
    /// Share of the overloaded elevator's waiting requests to move
    pub rebalance_fraction: f64,

    /// Minimum distance before an idle car is repositioned
    pub reposition_distance_threshold: Floor,
    pub origin_demand_weight: f64,
    pub destination_demand_weight: f64,
    /// Extra origin demand at the lobby during morning rush
    pub rush_hour_lobby_demand: f64,

    /// Pending pool size above which requests are assigned in priority order
    pub priority_sort_threshold: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            distance_weight: 0.35,
            load_weight: 0.20,
            route_weight: 0.25,
            direction_weight: 0.15,
            priority_weight: 0.05,
            idle_direction_score: 0.7,
            mismatch_direction_score: 0.3,
            one_stop_in_path_score: 0.9,
            route_decay_floors: 4.0,
            distance_load_attenuation: 0.5,
            escalation_threshold: 30.0,
            escalation_exponent: 1.5,
            escalation_scale: 0.05,
            starvation_threshold: 60.0,
            starvation_bonus: 5.0,
            critical_threshold: 120.0,
            critical_bonus: 20.0,
            priority_normalizer: 10.0,
            high_traffic_direction: None,
            high_traffic_direction_bonus: 0.2,
            high_traffic_floors: Vec::new(),
            high_traffic_floor_bonus: 0.3,
            rush_hour_lobby_bonus: 0.5,
            rebalance_threshold: 3,
            rebalance_fraction: 0.5,
            reposition_distance_threshold: 2,
            origin_demand_weight: 2.0,
            destination_demand_weight: 1.0,
            rush_hour_lobby_demand: 3.0,
            priority_sort_threshold: 3,
        }
    }
}

impl SchedulerConfig {
    /// A config where only the given factor weights are non-zero
    pub fn with_weights(distance: f64, load: f64, route: f64, direction: f64, priority: f64) -> Self {
        Self {
            distance_weight: distance,
            load_weight: load,
            route_weight: route,
            direction_weight: direction,
            priority_weight: priority,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let weights = [
            self.distance_weight,
            self.load_weight,
            self.route_weight,
            self.direction_weight,
            self.priority_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("Scheduler weights must be finite and non-negative");
        }
        if self.mismatch_direction_score <= 0.0 {
            bail!("Mismatched direction score must stay above zero so wrong-way cars remain assignable");
        }
        if !(self.escalation_threshold < self.starvation_threshold
            && self.starvation_threshold < self.critical_threshold)
        {
            bail!(
                "Priority thresholds must increase: {} < {} < {}",
                self.escalation_threshold,
                self.starvation_threshold,
                self.critical_threshold
            );
        }
        if self.escalation_exponent <= 1.0 {
            bail!("Escalation exponent must be superlinear (> 1.0)");
        }
        if self.priority_normalizer <= 0.0 || self.route_decay_floors <= 0.0 {
            bail!("Priority normalizer and route decay must be positive");
        }
        if !(0.0..=1.0).contains(&self.rebalance_fraction) {
            bail!("Rebalance fraction must be within 0..=1");
        }
        Ok(())
    }
}

/// Configuration consumed at construction and on reset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimConfig {
    pub total_floors: Floor,
    pub elevator_count: usize,
    /// Mean number of new requests per tick
    pub arrival_rate: f64,
    /// Passengers per car
    pub max_capacity: u32,
    /// Floors a car moves per tick
    pub move_step: Floor,
    /// Clock units the simulation advances per tick
    pub tick_step: u64,
    pub lobby_floor: Floor,
    /// Chance a request is forced through the lobby during rush hour
    pub rush_hour_bias: f64,
    /// Follow the simulated hour into and out of rush hour
    pub auto_rush_hour: bool,
    pub ticks_per_hour: u64,
    pub start_hour: u32,
    /// Optional seed for reproducible runs
    pub seed: Option<u64>,
    pub scheduler: SchedulerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FLOORS, DEFAULT_ELEVATORS, DEFAULT_ARRIVAL_RATE)
    }
}

impl SimConfig {
    pub fn new(total_floors: Floor, elevator_count: usize, arrival_rate: f64) -> Self {
        Self {
            total_floors,
            elevator_count,
            arrival_rate,
            max_capacity: DEFAULT_CAPACITY,
            move_step: 1,
            tick_step: 1,
            lobby_floor: GROUND_FLOOR,
            rush_hour_bias: 0.7,
            auto_rush_hour: false,
            ticks_per_hour: 60,
            start_hour: 6,
            seed: None,
            scheduler: SchedulerConfig::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_capacity(mut self, max_capacity: u32) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<()> {
        if self.total_floors < 2 {
            bail!("Building needs at least 2 floors, got {}", self.total_floors);
        }
        if self.elevator_count == 0 {
            bail!("Building needs at least one elevator");
        }
        if self.max_capacity == 0 {
            bail!("Elevator capacity must be at least 1");
        }
        if self.move_step == 0 {
            bail!("Elevators must move at least one floor per tick");
        }
        if self.tick_step == 0 || self.ticks_per_hour == 0 {
            bail!("Clock step and ticks per hour must be positive");
        }
        if self.start_hour >= 24 {
            bail!("Start hour must be within 0..24, got {}", self.start_hour);
        }
        if !(GROUND_FLOOR..=self.total_floors).contains(&self.lobby_floor) {
            bail!(
                "Lobby floor {} is outside 1..={}",
                self.lobby_floor,
                self.total_floors
            );
        }
        validate_arrival_rate(self.arrival_rate)?;
        if !(0.0..=1.0).contains(&self.rush_hour_bias) {
            bail!("Rush hour bias must be a probability, got {}", self.rush_hour_bias);
        }
        self.scheduler.validate()
    }
}

/// Arrival rate must be a finite number of requests per tick in
/// `0..=MAX_ARRIVAL_RATE`, so one tick's generation stays bounded
pub fn validate_arrival_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate < 0.0 {
        bail!("Arrival rate must be finite and non-negative, got {}", rate);
    }
    if rate > MAX_ARRIVAL_RATE {
        bail!(
            "Arrival rate {} exceeds the maximum of {} requests per tick",
            rate,
            MAX_ARRIVAL_RATE
        );
    }
    Ok(())
}
