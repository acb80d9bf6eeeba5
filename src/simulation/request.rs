//! Transport requests and their lifecycle
//!
//! A request only ever moves forward through
//! `Unassigned -> Assigned -> PickedUp -> Delivered`.

use anyhow::{bail, Result};

use super::config::SchedulerConfig;
use super::types::{Direction, ElevatorId, Floor, RequestId};

/// Lifecycle state derived from a request's flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequestState {
    Unassigned,
    Assigned,
    PickedUp,
    Delivered,
}

/// One floor-to-floor transport job
#[derive(Debug, Clone)]
pub struct SimRequest {
    pub id: RequestId,
    pub origin_floor: Floor,
    pub destination_floor: Floor,
    /// Clock value when the request entered the pool
    pub arrival_time: u64,
    pub picked_up: bool,
    pub delivered: bool,
    pub pickup_time: Option<u64>,
    pub delivery_time: Option<u64>,
    pub assigned_elevator: Option<ElevatorId>,
    /// Injected by an operator rather than the generator
    pub is_manual: bool,
    /// Forced onto one elevator by the operator; rebalancing leaves it there
    pub pinned: bool,
}

impl SimRequest {
    pub fn new(
        id: RequestId,
        origin_floor: Floor,
        destination_floor: Floor,
        arrival_time: u64,
        is_manual: bool,
    ) -> Result<Self> {
        if origin_floor == destination_floor {
            bail!(
                "Request {} has the same origin and destination floor {}",
                id,
                origin_floor
            );
        }
        Ok(Self {
            id,
            origin_floor,
            destination_floor,
            arrival_time,
            picked_up: false,
            delivered: false,
            pickup_time: None,
            delivery_time: None,
            assigned_elevator: None,
            is_manual,
            pinned: false,
        })
    }

    pub fn state(&self) -> RequestState {
        if self.delivered {
            RequestState::Delivered
        } else if self.picked_up {
            RequestState::PickedUp
        } else if self.assigned_elevator.is_some() {
            RequestState::Assigned
        } else {
            RequestState::Unassigned
        }
    }

    /// Direction the passenger wants to travel
    pub fn direction(&self) -> Direction {
        Direction::between(self.origin_floor, self.destination_floor)
    }

    pub fn wait_time(&self, now: u64) -> u64 {
        now.saturating_sub(self.arrival_time)
    }

    /// The floor the owning elevator should head to next
    pub fn next_stop(&self) -> Floor {
        if self.picked_up {
            self.destination_floor
        } else {
            self.origin_floor
        }
    }

    /// Record the owning elevator.
    /// Returns false once the passenger has boarded; ownership is fixed from then on.
    pub fn assign(&mut self, elevator: ElevatorId) -> bool {
        if self.picked_up || self.delivered {
            return false;
        }
        self.assigned_elevator = Some(elevator);
        true
    }

    /// Assigned -> PickedUp
    pub fn board(&mut self, now: u64) -> bool {
        if self.state() != RequestState::Assigned {
            return false;
        }
        self.picked_up = true;
        self.pickup_time = Some(now);
        true
    }

    /// PickedUp -> Delivered
    pub fn deliver(&mut self, now: u64) -> bool {
        if self.state() != RequestState::PickedUp {
            return false;
        }
        self.delivered = true;
        self.delivery_time = Some(now);
        true
    }

    /// Total time from arrival to delivery
    pub fn total_wait(&self) -> Option<u64> {
        self.delivery_time
            .map(|delivered| delivered.saturating_sub(self.arrival_time))
    }

    /// Time spent inside the car
    pub fn travel_time(&self) -> Option<u64> {
        match (self.pickup_time, self.delivery_time) {
            (Some(picked), Some(delivered)) => Some(delivered.saturating_sub(picked)),
            _ => None,
        }
    }

    /// Wait-time priority: `1 + f(wait)`.
    ///
    /// `f` is zero below the escalation threshold, grows as
    /// `scale * (wait - T1)^exponent` above it, and adds fixed bonuses past the
    /// starvation and critical thresholds. Unbounded in wait time.
    pub fn priority(&self, now: u64, config: &SchedulerConfig) -> f64 {
        let wait = self.wait_time(now) as f64;
        let mut priority = 1.0;

        if wait > config.escalation_threshold {
            priority += config.escalation_scale
                * (wait - config.escalation_threshold).powf(config.escalation_exponent);
        }
        if wait >= config.starvation_threshold {
            priority += config.starvation_bonus;
        }
        if wait >= config.critical_threshold {
            priority += config.critical_bonus;
        }

        priority
    }
}

/// Active requests keyed by id. Ordered so every pass over the pool is deterministic.
pub type RequestPool = std::collections::BTreeMap<RequestId, SimRequest>;
