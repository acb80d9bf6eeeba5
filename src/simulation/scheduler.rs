//! Elevator dispatch scheduler
//!
//! Scores every elevator with spare capacity against a request using five
//! weighted factors (distance, load, route efficiency, direction match and
//! priority) and keeps the fleet busy with load rebalancing and predictive
//! positioning. The scheduler keeps no state between ticks; everything it
//! needs is passed in.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use log::debug;
use ordered_float::OrderedFloat;
use sorted_vec::SortedSet;

use super::config::{SchedulerConfig, SimConfig};
use super::elevator::SimElevator;
use super::request::{RequestPool, SimRequest};
use super::traffic::TrafficState;
use super::types::{Direction, ElevatorId, Floor, RequestId, RushHourKind};

/// Per-tick facts the scoring functions depend on
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    pub now: u64,
    pub traffic: &'a TrafficState,
    pub lobby_floor: Floor,
    pub total_floors: Floor,
}

impl<'a> DispatchContext<'a> {
    pub fn new(now: u64, traffic: &'a TrafficState, config: &SimConfig) -> Self {
        Self {
            now,
            traffic,
            lobby_floor: config.lobby_floor,
            total_floors: config.total_floors,
        }
    }
}

/// Breakdown of one elevator's score for one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevatorScore {
    pub elevator: ElevatorId,
    pub distance: f64,
    pub load: f64,
    pub route: f64,
    pub direction: f64,
    pub priority: f64,
    pub total: f64,
}

/// The dispatch policy
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    pub config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Wait-time priority plus traffic bonuses
    pub fn request_priority(&self, request: &SimRequest, ctx: &DispatchContext) -> f64 {
        let mut priority = request.priority(ctx.now, &self.config);

        if let Some(direction) = ctx
            .traffic
            .high_traffic_direction(self.config.high_traffic_direction)
        {
            if request.direction() == direction {
                priority += self.config.high_traffic_direction_bonus;
            }
        }

        if ctx.traffic.is_rush_hour() && request.origin_floor == ctx.lobby_floor {
            priority += self.config.rush_hour_lobby_bonus;
        }

        let floors = &self.config.high_traffic_floors;
        if floors.contains(&request.origin_floor) || floors.contains(&request.destination_floor) {
            priority += self.config.high_traffic_floor_bonus;
        }

        priority
    }

    /// Closer and emptier cars score higher
    pub fn distance_score(&self, elevator: &SimElevator, request: &SimRequest) -> f64 {
        let distance = elevator.current_floor.abs_diff(request.origin_floor) as f64;
        let attenuation = 1.0 - self.config.distance_load_attenuation * elevator.load_fraction();
        (1.0 / (1.0 + distance)) * attenuation
    }

    /// Fewer owned requests and passengers score higher
    pub fn load_score(&self, elevator: &SimElevator) -> f64 {
        1.0 / (1.0 + elevator.assigned_requests.len() as f64 + elevator.load_fraction())
    }

    /// How well the request fits the car's existing stops
    pub fn route_score(
        &self,
        elevator: &SimElevator,
        request: &SimRequest,
        requests: &RequestPool,
    ) -> f64 {
        let stops = planned_stops(elevator, requests);
        let origin_in_path = stops.contains(&request.origin_floor);
        let destination_in_path = stops.contains(&request.destination_floor);

        if origin_in_path && destination_in_path {
            return 1.0;
        }
        if origin_in_path || destination_in_path {
            return self.config.one_stop_in_path_score;
        }

        let before = sweep_cost(elevator.current_floor, &stops);
        let mut extended: Vec<Floor> = stops.iter().copied().collect();
        extended.push(request.origin_floor);
        extended.push(request.destination_floor);
        let after = sweep_cost(elevator.current_floor, &SortedSet::from_unsorted(extended));

        let extra = after.saturating_sub(before) as f64;
        1.0 / (1.0 + extra / self.config.route_decay_floors)
    }

    /// Same direction scores full, idle partial, opposite reduced but never zero
    pub fn direction_score(&self, elevator: &SimElevator, request: &SimRequest) -> f64 {
        match elevator.direction {
            Direction::Idle => self.config.idle_direction_score,
            direction if direction == request.direction() => 1.0,
            _ => self.config.mismatch_direction_score,
        }
    }

    pub fn priority_score(&self, request: &SimRequest, ctx: &DispatchContext) -> f64 {
        self.request_priority(request, ctx) / self.config.priority_normalizer
    }

    /// Weighted five-factor score of `elevator` for `request`
    pub fn score_elevator(
        &self,
        elevator: &SimElevator,
        request: &SimRequest,
        requests: &RequestPool,
        ctx: &DispatchContext,
    ) -> ElevatorScore {
        let distance = self.distance_score(elevator, request);
        let load = self.load_score(elevator);
        let route = self.route_score(elevator, request, requests);
        let direction = self.direction_score(elevator, request);
        let priority = self.priority_score(request, ctx);

        let total = self.config.distance_weight * distance
            + self.config.load_weight * load
            + self.config.route_weight * route
            + self.config.direction_weight * direction
            + self.config.priority_weight * priority;

        ElevatorScore {
            elevator: elevator.id,
            distance,
            load,
            route,
            direction,
            priority,
            total,
        }
    }

    /// Highest scoring elevator with spare capacity; lowest id wins ties.
    /// `None` means the request waits for the next tick.
    pub fn find_best_elevator(
        &self,
        request: &SimRequest,
        elevators: &[SimElevator],
        requests: &RequestPool,
        ctx: &DispatchContext,
    ) -> Option<ElevatorId> {
        elevators
            .iter()
            .filter(|elevator| elevator.has_spare_capacity())
            .map(|elevator| self.score_elevator(elevator, request, requests, ctx))
            .max_by_key(|score| (OrderedFloat(score.total), Reverse(score.elevator)))
            .map(|score| score.elevator)
    }

    /// Hand `request_id` to `elevator_id` and re-evaluate that car's target.
    ///
    /// A request previously owned by another car is detached from it first,
    /// so at most one car ever owns a request.
    pub fn assign_request(
        &self,
        request_id: RequestId,
        elevator_id: ElevatorId,
        elevators: &mut [SimElevator],
        requests: &mut RequestPool,
        ctx: &DispatchContext,
    ) -> bool {
        let Some(request) = requests.get_mut(&request_id) else {
            return false;
        };
        if elevators.get(elevator_id.index()).is_none() {
            return false;
        }
        let previous = request.assigned_elevator;
        if !request.assign(elevator_id) {
            return false;
        }

        if let Some(previous) = previous.filter(|previous| *previous != elevator_id) {
            if let Some(old) = elevators.get_mut(previous.index()) {
                old.detach_request(request_id);
            }
        }

        let elevator = &mut elevators[elevator_id.index()];
        let was_unassigned = elevator.assigned_requests.is_empty();
        elevator.attach_request(request_id);

        if was_unassigned {
            // Drop any speculative repositioning move.
            elevator.clear_target();
        }
        if elevator.target_floor.is_none() {
            self.retarget(elevator, requests, ctx);
        }
        debug!(
            "Assigned {} ({} -> {}) to {}",
            request_id,
            requests[&request_id].origin_floor,
            requests[&request_id].destination_floor,
            elevator_id
        );
        true
    }

    /// Point the car at its most urgent owned request.
    ///
    /// Highest priority first, longer wait breaks ties. A full car only
    /// considers riding passengers. Goes idle when nothing is left.
    pub fn retarget(
        &self,
        elevator: &mut SimElevator,
        requests: &RequestPool,
        ctx: &DispatchContext,
    ) -> Option<Floor> {
        let full = elevator.is_full();
        let next = elevator
            .assigned_requests
            .iter()
            .filter_map(|id| requests.get(id))
            .filter(|request| !request.delivered && (!full || request.picked_up))
            .max_by_key(|request| {
                (
                    OrderedFloat(self.request_priority(request, ctx)),
                    Reverse(request.arrival_time),
                    Reverse(request.id),
                )
            })
            .map(|request| request.next_stop());

        match next {
            Some(floor) => elevator.set_target(floor),
            None => elevator.clear_target(),
        }
        next
    }

    /// Move waiting requests from the busiest car to the least busy one when
    /// their assigned counts drift too far apart. Pinned requests never move.
    /// Returns how many moved.
    pub fn rebalance(
        &self,
        elevators: &mut [SimElevator],
        requests: &mut RequestPool,
        ctx: &DispatchContext,
    ) -> usize {
        if elevators.len() < 2 {
            return 0;
        }

        let busiest = elevators
            .iter()
            .max_by_key(|e| (e.assigned_requests.len(), Reverse(e.id)))
            .map(|e| e.id);
        let quietest = elevators
            .iter()
            .min_by_key(|e| (e.assigned_requests.len(), e.id))
            .map(|e| e.id);
        let (Some(busiest), Some(quietest)) = (busiest, quietest) else {
            return 0;
        };

        let high = elevators[busiest.index()].assigned_requests.len();
        let low = elevators[quietest.index()].assigned_requests.len();
        if busiest == quietest || high - low <= self.config.rebalance_threshold {
            return 0;
        }

        let movable: Vec<RequestId> = elevators[busiest.index()]
            .assigned_requests
            .iter()
            .rev()
            .copied()
            .filter(|id| requests.get(id).is_some_and(|r| !r.picked_up && !r.pinned))
            .collect();

        let target = &elevators[quietest.index()];
        let free_seats = (target.max_capacity as usize).saturating_sub(low);
        let share = (movable.len() as f64 * self.config.rebalance_fraction).ceil() as usize;
        let count = share.min((high - low) / 2).min(free_seats);
        if count == 0 {
            return 0;
        }

        for request_id in movable.into_iter().take(count) {
            if let Some(request) = requests.get_mut(&request_id) {
                request.assign(quietest);
            }
            elevators[busiest.index()].detach_request(request_id);
            elevators[quietest.index()].attach_request(request_id);
        }

        debug!(
            "Rebalanced {} requests from {} ({} owned) to {} ({} owned)",
            count, busiest, high, quietest, low
        );

        let source = &mut elevators[busiest.index()];
        source.clear_target();
        self.retarget(source, requests, ctx);

        let destination = &mut elevators[quietest.index()];
        if low == 0 || destination.target_floor.is_none() {
            destination.clear_target();
            self.retarget(destination, requests, ctx);
        }

        count
    }

    /// Floor with the most weighted pending demand, lowest floor on ties
    pub fn demand_hotspot(&self, requests: &RequestPool, ctx: &DispatchContext) -> Option<Floor> {
        let mut demand: BTreeMap<Floor, f64> = BTreeMap::new();

        for request in requests.values().filter(|r| !r.delivered) {
            if !request.picked_up {
                *demand.entry(request.origin_floor).or_default() += self.config.origin_demand_weight;
            }
            *demand.entry(request.destination_floor).or_default() +=
                self.config.destination_demand_weight;
        }

        if ctx.traffic.rush_hour == Some(RushHourKind::Morning) {
            *demand.entry(ctx.lobby_floor).or_default() += self.config.rush_hour_lobby_demand;
        }

        demand
            .into_iter()
            .max_by_key(|(floor, weight)| (OrderedFloat(*weight), Reverse(*floor)))
            .map(|(floor, _)| floor)
    }

    /// Send the nearest idle, empty, unassigned car toward the demand hotspot.
    ///
    /// Skipped when a car already sits at or targets the hotspot, or when the
    /// nearest candidate is within the reposition threshold.
    pub fn predictive_position(
        &self,
        elevators: &mut [SimElevator],
        requests: &RequestPool,
        ctx: &DispatchContext,
    ) -> Option<(ElevatorId, Floor)> {
        let hotspot = self.demand_hotspot(requests, ctx)?;

        let covered = elevators.iter().any(|e| {
            e.target_floor == Some(hotspot) || (e.is_idle() && e.current_floor == hotspot)
        });
        if covered {
            return None;
        }

        let threshold = self.config.reposition_distance_threshold;
        let candidate = elevators
            .iter_mut()
            .filter(|e| e.is_positioning_candidate())
            .filter(|e| e.current_floor.abs_diff(hotspot) > threshold)
            .min_by_key(|e| (e.current_floor.abs_diff(hotspot), e.id))?;

        candidate.set_target(hotspot);
        debug!(
            "Repositioning idle {} from floor {} toward floor {}",
            candidate.id, candidate.current_floor, hotspot
        );
        Some((candidate.id, hotspot))
    }
}

/// Floors the car already plans to visit: its target, waiting origins and
/// every owned destination
pub fn planned_stops(elevator: &SimElevator, requests: &RequestPool) -> SortedSet<Floor> {
    let mut floors: Vec<Floor> = elevator.target_floor.into_iter().collect();
    for request in elevator
        .assigned_requests
        .iter()
        .filter_map(|id| requests.get(id))
    {
        if !request.picked_up {
            floors.push(request.origin_floor);
        }
        floors.push(request.destination_floor);
    }
    SortedSet::from_unsorted(floors)
}

/// Floors travelled to sweep every stop starting from `current`:
/// go to the nearer end first, then across to the far end.
pub fn sweep_cost(current: Floor, stops: &SortedSet<Floor>) -> u32 {
    match (stops.first(), stops.last()) {
        (Some(&lowest), Some(&highest)) => {
            let span = highest - lowest;
            span + current.abs_diff(lowest).min(current.abs_diff(highest))
        }
        _ => 0,
    }
}
