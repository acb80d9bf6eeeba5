//! Command surface for driving a simulation
//!
//! The controller owns the world and is the only thing that ticks it, so one
//! tick always completes before the next command is applied. Injected
//! requests are queued by the world and admitted on the next tick.

use std::time::Duration;

use anyhow::{bail, Result};
use log::info;

use super::config::SimConfig;
use super::snapshot::{SimSnapshot, SnapshotSink};
use super::types::{ElevatorId, Floor, RequestId, RushHourKind};
use super::world::SimWorld;

/// Wall-clock interval between ticks at speed 1.0
pub const BASE_TICK_INTERVAL: Duration = Duration::from_millis(500);

pub struct SimController {
    world: SimWorld,
    running: bool,
    speed: f64,
    sinks: Vec<Box<dyn SnapshotSink>>,
}

impl SimController {
    pub fn new(config: SimConfig) -> Result<Self> {
        Ok(Self {
            world: SimWorld::new(config)?,
            running: false,
            speed: 1.0,
            sinks: Vec::new(),
        })
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    /// Register a consumer for per-tick snapshots
    pub fn add_sink(&mut self, sink: Box<dyn SnapshotSink>) {
        self.sinks.push(sink);
    }

    pub fn start(&mut self) {
        if !self.running {
            info!("Simulation started at tick {}", self.world.ticks);
        }
        self.running = true;
    }

    /// Stop ticking. The world is left exactly as the last tick finished it.
    pub fn stop(&mut self) {
        if self.running {
            info!("Simulation stopped at tick {}", self.world.ticks);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Rebuild the fleet and empty the pool. The run state is kept.
    pub fn reset(&mut self, config: SimConfig) -> Result<()> {
        self.world.reset(config)
    }

    pub fn set_speed(&mut self, multiplier: f64) -> Result<()> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            bail!("Speed multiplier must be positive, got {}", multiplier);
        }
        self.speed = multiplier;
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Wall-clock time between ticks at the current speed
    pub fn tick_interval(&self) -> Duration {
        BASE_TICK_INTERVAL.div_f64(self.speed)
    }

    pub fn set_arrival_rate(&mut self, rate: f64) -> Result<()> {
        self.world.set_arrival_rate(rate)
    }

    pub fn inject_request(&mut self, origin_floor: Floor, destination_floor: Floor) -> Result<RequestId> {
        self.world.inject_request(origin_floor, destination_floor)
    }

    pub fn inject_request_to(
        &mut self,
        origin_floor: Floor,
        destination_floor: Floor,
        elevator: ElevatorId,
    ) -> Result<RequestId> {
        self.world
            .inject_request_to(origin_floor, destination_floor, elevator)
    }

    pub fn enter_rush_hour(&mut self, kind: RushHourKind) {
        self.world.enter_rush_hour(kind);
    }

    pub fn exit_rush_hour(&mut self) {
        self.world.exit_rush_hour();
    }

    /// Run one tick if started and publish its snapshot
    pub fn step(&mut self) -> Option<SimSnapshot> {
        if !self.running {
            return None;
        }
        let events = self.world.tick();
        let snapshot = self.world.snapshot();
        for sink in &mut self.sinks {
            sink.on_snapshot(&snapshot, &events);
        }
        Some(snapshot)
    }
}
