//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the fleet, the pending pool and the clock, and drives one
//! discrete tick at a time: admit and generate requests, rebalance, position
//! idle cars, assign, then move cars and process stops.

use std::cmp::Reverse;
use std::collections::VecDeque;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::config::{validate_arrival_rate, SimConfig};
use super::elevator::{ElevatorUpdateResult, SimElevator};
use super::request::{RequestPool, RequestState, SimRequest};
use super::scheduler::{DispatchContext, Scheduler};
use super::snapshot::{ElevatorSnapshot, SimSnapshot, TickEvents};
use super::stats::SimStats;
use super::traffic::{arrival_count, TrafficState};
use super::types::{ElevatorId, Floor, RequestId, RushHourKind, SimId, GROUND_FLOOR};

/// A manually injected request waiting for the next tick
#[derive(Debug, Clone)]
struct Injection {
    id: RequestId,
    origin_floor: Floor,
    destination_floor: Floor,
    elevator: Option<ElevatorId>,
}

/// The main simulation world
pub struct SimWorld {
    pub config: SimConfig,

    /// All elevators, indexed by id
    pub elevators: Vec<SimElevator>,

    /// Requests not yet delivered
    pub requests: RequestPool,

    pub scheduler: Scheduler,

    pub traffic: TrafficState,

    pub stats: SimStats,

    /// Simulation clock
    pub now: u64,

    /// Ticks executed since the last reset
    pub ticks: u64,

    /// Next ID to assign
    next_id: usize,

    /// Injected requests, admitted at the start of the next tick
    injections: VecDeque<Injection>,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,

    last_events: TickEvents,
}

impl SimWorld {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate().context("Invalid simulation config")?;

        let elevators = (0..config.elevator_count)
            .map(|index| {
                SimElevator::new(
                    ElevatorId(SimId(index)),
                    SimElevator::starting_floor(index, config.elevator_count, config.total_floors),
                    config.max_capacity,
                    config.total_floors,
                    config.move_step,
                )
            })
            .collect();

        Ok(Self {
            elevators,
            requests: RequestPool::new(),
            scheduler: Scheduler::new(config.scheduler.clone()),
            traffic: TrafficState::new(config.auto_rush_hour),
            stats: SimStats::new(),
            now: 0,
            ticks: 0,
            next_id: 0,
            injections: VecDeque::new(),
            rng: config.seed.map(StdRng::seed_from_u64),
            last_events: TickEvents::default(),
            config,
        })
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(config: SimConfig, seed: u64) -> Result<Self> {
        Self::new(config.with_seed(seed))
    }

    /// Tear down the fleet and empty the pool. Must not run during a tick.
    pub fn reset(&mut self, config: SimConfig) -> Result<()> {
        *self = Self::new(config)?;
        info!(
            "Simulation reset: {} floors, {} elevators, {:.2} requests/tick",
            self.config.total_floors, self.config.elevator_count, self.config.arrival_rate
        );
        Ok(())
    }

    fn next_request_id(&mut self) -> RequestId {
        let id = RequestId(SimId(self.next_id));
        self.next_id += 1;
        id
    }

    pub fn set_arrival_rate(&mut self, rate: f64) -> Result<()> {
        validate_arrival_rate(rate)?;
        self.config.arrival_rate = rate;
        Ok(())
    }

    pub fn enter_rush_hour(&mut self, kind: RushHourKind) {
        self.traffic.enter_rush_hour(kind);
        info!("Entering {:?} rush hour", kind);
    }

    pub fn exit_rush_hour(&mut self) {
        self.traffic.exit_rush_hour();
        info!("Leaving rush hour");
    }

    /// Queue an operator request. It joins the pool on the next tick.
    pub fn inject_request(&mut self, origin_floor: Floor, destination_floor: Floor) -> Result<RequestId> {
        self.queue_injection(origin_floor, destination_floor, None)
    }

    /// Queue an operator request pinned to one elevator. An unknown elevator
    /// falls back to normal scoring when the request is admitted.
    pub fn inject_request_to(
        &mut self,
        origin_floor: Floor,
        destination_floor: Floor,
        elevator: ElevatorId,
    ) -> Result<RequestId> {
        self.queue_injection(origin_floor, destination_floor, Some(elevator))
    }

    fn queue_injection(
        &mut self,
        origin_floor: Floor,
        destination_floor: Floor,
        elevator: Option<ElevatorId>,
    ) -> Result<RequestId> {
        let floors = GROUND_FLOOR..=self.config.total_floors;
        if !floors.contains(&origin_floor) || !floors.contains(&destination_floor) {
            bail!(
                "Request {} -> {} is outside floors 1..={}",
                origin_floor,
                destination_floor,
                self.config.total_floors
            );
        }
        if origin_floor == destination_floor {
            bail!("Request origin and destination are both floor {}", origin_floor);
        }

        let id = self.next_request_id();
        self.injections.push_back(Injection {
            id,
            origin_floor,
            destination_floor,
            elevator,
        });
        Ok(id)
    }

    pub fn queued_injections(&self) -> usize {
        self.injections.len()
    }

    fn admit(&mut self, request: SimRequest) {
        self.stats.record_arrival();
        self.requests.insert(request.id, request);
    }

    /// Move queued injections into the pool. Returns pinned assignments.
    fn admit_injections(&mut self) -> (usize, Vec<(RequestId, ElevatorId)>) {
        let mut admitted = 0;
        let mut pinned = Vec::new();

        while let Some(injection) = self.injections.pop_front() {
            match SimRequest::new(
                injection.id,
                injection.origin_floor,
                injection.destination_floor,
                self.now,
                true,
            ) {
                Ok(request) => {
                    self.admit(request);
                    admitted += 1;
                    if let Some(elevator) = injection.elevator {
                        pinned.push((injection.id, elevator));
                    }
                }
                Err(e) => warn!("Dropping invalid injected request: {}", e),
            }
        }

        (admitted, pinned)
    }

    /// Draw this tick's random arrivals
    fn generate_requests(&mut self) -> usize {
        let count = match &mut self.rng {
            Some(rng) => arrival_count(rng, self.config.arrival_rate),
            None => arrival_count(&mut rand::rng(), self.config.arrival_rate),
        };

        let mut generated = 0;
        for _ in 0..count {
            let (origin, destination) = match &mut self.rng {
                Some(rng) => self.traffic.generate_floors(rng, &self.config),
                None => self.traffic.generate_floors(&mut rand::rng(), &self.config),
            };
            let id = self.next_request_id();
            match SimRequest::new(id, origin, destination, self.now, false) {
                Ok(request) => {
                    self.admit(request);
                    generated += 1;
                }
                Err(e) => warn!("Generator produced an invalid request: {}", e),
            }
        }
        generated
    }

    /// Honor pinned assignments; unknown elevators fall back to scoring
    fn assign_pinned(&mut self, pinned: Vec<(RequestId, ElevatorId)>) -> usize {
        let ctx = DispatchContext::new(self.now, &self.traffic, &self.config);
        let mut assigned = 0;

        for (request_id, elevator_id) in pinned {
            if elevator_id.index() >= self.elevators.len() {
                warn!(
                    "{} pinned to unknown elevator {}; using normal assignment",
                    request_id, elevator_id
                );
                continue;
            }
            if self.scheduler.assign_request(
                request_id,
                elevator_id,
                &mut self.elevators,
                &mut self.requests,
                &ctx,
            ) {
                if let Some(request) = self.requests.get_mut(&request_id) {
                    request.pinned = true;
                }
                assigned += 1;
            }
        }
        assigned
    }

    /// Score and assign every unassigned request. Unplaceable requests stay
    /// unassigned and are retried next tick.
    fn assign_pending(&mut self) -> usize {
        let ctx = DispatchContext::new(self.now, &self.traffic, &self.config);

        let mut order: Vec<RequestId> = self
            .requests
            .values()
            .filter(|r| r.state() == RequestState::Unassigned)
            .map(|r| r.id)
            .collect();

        if self.requests.len() > self.scheduler.config.priority_sort_threshold {
            let scheduler = &self.scheduler;
            let requests = &self.requests;
            order.sort_by_cached_key(|id| {
                let request = &requests[id];
                (
                    Reverse(OrderedFloat(scheduler.request_priority(request, &ctx))),
                    request.arrival_time,
                    *id,
                )
            });
        }

        let mut assigned = 0;
        for request_id in order {
            let best = self.requests.get(&request_id).and_then(|request| {
                self.scheduler
                    .find_best_elevator(request, &self.elevators, &self.requests, &ctx)
            });

            match best {
                Some(elevator_id) => {
                    if self.scheduler.assign_request(
                        request_id,
                        elevator_id,
                        &mut self.elevators,
                        &mut self.requests,
                        &ctx,
                    ) {
                        assigned += 1;
                    }
                }
                None => debug!(
                    "No elevator with spare capacity for {}; retrying next tick",
                    request_id
                ),
            }
        }
        assigned
    }

    /// Whether the car should stop at `floor` on its way to the target
    fn is_stop_floor(&self, index: usize, floor: Floor) -> bool {
        let elevator = &self.elevators[index];
        elevator
            .assigned_requests
            .iter()
            .filter_map(|id| self.requests.get(id))
            .any(|request| {
                if request.picked_up {
                    request.destination_floor == floor
                } else {
                    request.origin_floor == floor && !elevator.is_full()
                }
            })
    }

    /// Stop, open doors, unload then load, and pick the next target.
    /// Returns the number of deliveries.
    fn process_stop(&mut self, index: usize) -> usize {
        let now = self.now;
        let floor = self.elevators[index].current_floor;
        self.elevators[index].stop();

        let owned: Vec<&SimRequest> = self.elevators[index]
            .assigned_requests
            .iter()
            .filter_map(|id| self.requests.get(id))
            .collect();
        let deliveries: Vec<RequestId> = owned
            .iter()
            .filter(|r| r.picked_up && r.destination_floor == floor)
            .map(|r| r.id)
            .collect();
        let mut boardings: Vec<&SimRequest> = owned
            .into_iter()
            .filter(|r| !r.picked_up && r.origin_floor == floor)
            .collect();
        boardings.sort_by_key(|r| (r.arrival_time, r.id));
        let boardings: Vec<RequestId> = boardings.into_iter().map(|r| r.id).collect();

        let mut delivered = 0;
        if !deliveries.is_empty() || !boardings.is_empty() {
            self.elevators[index].open_doors();

            for request_id in deliveries {
                let elevator = &mut self.elevators[index];
                if !elevator.remove_passengers(1) {
                    warn!("{} has no passenger to unload for {}", elevator.id, request_id);
                    continue;
                }
                elevator.detach_request(request_id);
                if let Some(mut request) = self.requests.remove(&request_id) {
                    request.deliver(now);
                    self.stats.record_delivery(&request);
                    delivered += 1;
                }
            }

            for request_id in boardings {
                let elevator = &mut self.elevators[index];
                if !elevator.add_passengers(1) {
                    debug!(
                        "{} is full at floor {}; {} waits for the next pass",
                        elevator.id, floor, request_id
                    );
                    continue;
                }
                if let Some(request) = self.requests.get_mut(&request_id) {
                    request.board(now);
                }
            }
        }

        let ctx = DispatchContext::new(self.now, &self.traffic, &self.config);
        let elevator = &mut self.elevators[index];
        elevator.clear_target();
        self.scheduler.retarget(elevator, &self.requests, &ctx);

        delivered
    }

    /// Step every car and process the floors they stop at
    fn update_elevators(&mut self) -> usize {
        let mut completed = 0;

        for index in 0..self.elevators.len() {
            let at_stop = match self.elevators[index].update() {
                ElevatorUpdateResult::ArrivedAtTarget(_) => true,
                ElevatorUpdateResult::Moved(floor) => self.is_stop_floor(index, floor),
                ElevatorUpdateResult::Idle | ElevatorUpdateResult::DoorsClosed => false,
            };

            if at_stop {
                completed += self.process_stop(index);
            }

            let elevator = &self.elevators[index];
            if elevator.target_floor.is_none() && !elevator.assigned_requests.is_empty() {
                let ctx = DispatchContext::new(self.now, &self.traffic, &self.config);
                self.scheduler
                    .retarget(&mut self.elevators[index], &self.requests, &ctx);
            }
        }

        completed
    }

    /// Main simulation tick
    pub fn tick(&mut self) -> TickEvents {
        self.ticks += 1;
        self.now += self.config.tick_step;

        if self.traffic.update(self.now, &self.config) {
            info!(
                "Simulated hour {}: traffic mode now {:?}",
                TrafficState::simulated_hour(self.now, &self.config),
                self.traffic.rush_hour
            );
        }

        let (injected, pinned) = self.admit_injections();
        let generated = self.generate_requests();

        let ctx = DispatchContext::new(self.now, &self.traffic, &self.config);
        let moved = self
            .scheduler
            .rebalance(&mut self.elevators, &mut self.requests, &ctx);
        if moved > 0 {
            debug!("Tick {}: rebalanced {} requests", self.ticks, moved);
        }
        self.scheduler
            .predictive_position(&mut self.elevators, &self.requests, &ctx);

        let mut assigned = self.assign_pinned(pinned);
        assigned += self.assign_pending();

        let completed = self.update_elevators();

        let moving = self.elevators.iter().filter(|e| e.is_moving).count();
        self.stats.update_utilization(moving, self.elevators.len());

        let events = TickEvents {
            tick: self.ticks,
            generated: injected + generated,
            completed,
            assigned,
            unassigned: self
                .requests
                .values()
                .filter(|r| r.state() == RequestState::Unassigned)
                .count(),
        };
        self.last_events = events;
        events
    }

    /// Run `count` ticks back to back
    pub fn run(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    pub fn last_events(&self) -> TickEvents {
        self.last_events
    }

    pub fn pending_count(&self) -> usize {
        self.requests.len()
    }

    pub fn elevator(&self, id: ElevatorId) -> Option<&SimElevator> {
        self.elevators.get(id.index())
    }

    pub fn request(&self, id: RequestId) -> Option<&SimRequest> {
        self.requests.get(&id)
    }

    pub fn simulated_hour(&self) -> u32 {
        TrafficState::simulated_hour(self.now, &self.config)
    }

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            tick: self.ticks,
            time: self.now,
            elevators: self.elevators.iter().map(ElevatorSnapshot::from).collect(),
            pending_requests: self.requests.len(),
            total_requests: self.stats.total_requests,
            completed_requests: self.stats.completed_requests,
            mean_wait: self.stats.mean_wait(),
            max_wait: self.stats.max_wait,
            max_travel: self.stats.max_travel,
            mean_travel: self.stats.mean_travel(),
            utilization_percent: self.stats.utilization * 100.0,
            rush_hour: self.traffic.is_rush_hour(),
            rush_hour_kind: self.traffic.rush_hour,
            simulated_hour: self.simulated_hour(),
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Elevator Simulation Summary ===");
        println!(
            "Tick: {}, Time: {}, Hour: {:02}:00{}",
            self.ticks,
            self.now,
            self.simulated_hour(),
            match self.traffic.rush_hour {
                Some(kind) => format!(" ({:?} rush)", kind),
                None => String::new(),
            }
        );
        println!("{}", self.stats.summary());
        println!(
            "Pending: {} ({} unassigned)",
            self.requests.len(),
            self.requests
                .values()
                .filter(|r| r.state() == RequestState::Unassigned)
                .count()
        );

        println!("--- Elevators ---");
        for elevator in &self.elevators {
            println!(
                "  {}: floor={:>2} dir={:?} passengers={}/{} doors={} target={} assigned={} traveled={}",
                elevator.id,
                elevator.current_floor,
                elevator.direction,
                elevator.passenger_count,
                elevator.max_capacity,
                if elevator.doors_open { "open" } else { "closed" },
                elevator
                    .target_floor
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                elevator.assigned_requests.len(),
                elevator.floors_traveled
            );
        }
    }

    /// Draw the shafts in the terminal, top floor first
    pub fn draw_shafts(&self) {
        println!("\n=== Shafts ===");
        println!("Legend: [n]=car with n passengers, <n>=doors open, .=empty shaft, waiting count on the right");
        for floor in (GROUND_FLOOR..=self.config.total_floors).rev() {
            let cells: String = self
                .elevators
                .iter()
                .map(|e| {
                    if e.current_floor != floor {
                        "  .  ".to_string()
                    } else if e.doors_open {
                        format!(" <{}> ", e.passenger_count)
                    } else {
                        format!(" [{}] ", e.passenger_count)
                    }
                })
                .collect();
            let waiting = self
                .requests
                .values()
                .filter(|r| !r.picked_up && r.origin_floor == floor)
                .count();
            println!("{:>3} |{}| {}", floor, cells, waiting);
        }
        println!();
    }
}
