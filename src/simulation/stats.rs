//! Running statistics for the dispatch simulation
//!
//! Delivered requests are folded in here and then discarded.

use serde::Serialize;

use super::request::SimRequest;

/// Aggregate counters across the whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimStats {
    /// Requests that have entered the pending pool
    pub total_requests: u64,
    pub completed_requests: u64,
    total_wait: u64,
    pub max_wait: u64,
    total_travel: u64,
    pub max_travel: u64,
    /// Fraction of elevators moving at the end of the last tick
    pub utilization: f64,
}

impl SimStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request entering the pool
    pub fn record_arrival(&mut self) {
        self.total_requests += 1;
    }

    /// Fold a delivered request into the aggregates
    pub fn record_delivery(&mut self, request: &SimRequest) {
        let wait = request.total_wait().unwrap_or(0);
        let travel = request.travel_time().unwrap_or(0);

        self.completed_requests += 1;
        self.total_wait += wait;
        self.max_wait = self.max_wait.max(wait);
        self.total_travel += travel;
        self.max_travel = self.max_travel.max(travel);
    }

    pub fn update_utilization(&mut self, moving: usize, fleet_size: usize) {
        self.utilization = if fleet_size == 0 {
            0.0
        } else {
            moving as f64 / fleet_size as f64
        };
    }

    pub fn mean_wait(&self) -> f64 {
        if self.completed_requests == 0 {
            0.0
        } else {
            self.total_wait as f64 / self.completed_requests as f64
        }
    }

    pub fn mean_travel(&self) -> f64 {
        if self.completed_requests == 0 {
            0.0
        } else {
            self.total_travel as f64 / self.completed_requests as f64
        }
    }

    /// Share of requests delivered so far, as a percentage
    pub fn completion_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.completed_requests as f64 / self.total_requests as f64 * 100.0
        }
    }

    /// Get a summary string for display
    pub fn summary(&self) -> String {
        format!(
            "Requests: {} | Completed: {} | Mean wait: {:.1} | Max wait: {} | Mean travel: {:.1} | Max travel: {} | Utilization: {:.0}%",
            self.total_requests,
            self.completed_requests,
            self.mean_wait(),
            self.max_wait,
            self.mean_travel(),
            self.max_travel,
            self.utilization * 100.0
        )
    }
}
