//! Elevator car movement and door logic

use serde::Serialize;

use super::types::{Direction, ElevatorId, Floor, RequestId, GROUND_FLOOR};

/// Result of an elevator step indicating what the engine should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevatorUpdateResult {
    /// No target; the car stayed where it was
    Idle,
    /// Doors were closed this step, no movement
    DoorsClosed,
    /// Car moved and is now at the given floor, target not yet reached
    Moved(Floor),
    /// Car is at its target floor
    ArrivedAtTarget(Floor),
}

/// A single elevator car
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimElevator {
    pub id: ElevatorId,
    pub current_floor: Floor,
    pub direction: Direction,
    pub passenger_count: u32,
    pub max_capacity: u32,
    pub doors_open: bool,
    pub target_floor: Option<Floor>,
    pub is_moving: bool,
    /// Requests this car owns, waiting or riding, in assignment order
    pub assigned_requests: Vec<RequestId>,
    pub floors_traveled: u64,
    pub stops_made: u64,
    total_floors: Floor,
    move_step: Floor,
}

impl SimElevator {
    pub fn new(
        id: ElevatorId,
        start_floor: Floor,
        max_capacity: u32,
        total_floors: Floor,
        move_step: Floor,
    ) -> Self {
        Self {
            id,
            current_floor: start_floor.clamp(GROUND_FLOOR, total_floors),
            direction: Direction::Idle,
            passenger_count: 0,
            max_capacity,
            doors_open: false,
            target_floor: None,
            is_moving: false,
            assigned_requests: Vec::new(),
            floors_traveled: 0,
            stops_made: 0,
            total_floors,
            move_step: move_step.max(1),
        }
    }

    /// Evenly spaced starting floor for car `index` in a fleet of `count`
    pub fn starting_floor(index: usize, count: usize, total_floors: Floor) -> Floor {
        if count <= 1 {
            return GROUND_FLOOR;
        }
        let span = (total_floors - GROUND_FLOOR) as usize;
        GROUND_FLOOR + (index * span / (count - 1)) as Floor
    }

    /// Point the car at a floor, clamped to the building
    pub fn set_target(&mut self, floor: Floor) {
        let floor = floor.clamp(GROUND_FLOOR, self.total_floors);
        self.target_floor = Some(floor);
        self.direction = Direction::between(self.current_floor, floor);
    }

    /// Drop the target and go idle. Keeps direction and target consistent.
    pub fn clear_target(&mut self) {
        self.target_floor = None;
        self.stop();
    }

    pub fn has_reached_target(&self) -> bool {
        self.target_floor == Some(self.current_floor)
    }

    pub fn stop(&mut self) {
        self.direction = Direction::Idle;
        self.is_moving = false;
    }

    pub fn open_doors(&mut self) {
        self.doors_open = true;
        self.stops_made += 1;
    }

    pub fn close_doors(&mut self) {
        self.doors_open = false;
    }

    /// Advance one step toward the target.
    ///
    /// Never overshoots the target and never leaves `[1, total_floors]`.
    /// Open doors are closed first, which uses up the step.
    pub fn update(&mut self) -> ElevatorUpdateResult {
        if self.doors_open {
            self.close_doors();
            return ElevatorUpdateResult::DoorsClosed;
        }

        let target = match self.target_floor {
            Some(target) => target,
            None => {
                self.stop();
                return ElevatorUpdateResult::Idle;
            }
        };

        if self.current_floor == target {
            return ElevatorUpdateResult::ArrivedAtTarget(target);
        }

        let distance = self.current_floor.abs_diff(target);
        let step = self.move_step.min(distance);
        let next = if target > self.current_floor {
            self.current_floor + step
        } else {
            self.current_floor - step
        };
        self.current_floor = next.clamp(GROUND_FLOOR, self.total_floors);
        self.floors_traveled += u64::from(step);
        self.direction = Direction::between(self.current_floor, target);
        self.is_moving = true;

        if self.has_reached_target() {
            ElevatorUpdateResult::ArrivedAtTarget(target)
        } else {
            ElevatorUpdateResult::Moved(self.current_floor)
        }
    }

    /// Board passengers. Fails without side effects if it would exceed capacity.
    pub fn add_passengers(&mut self, count: u32) -> bool {
        match self.passenger_count.checked_add(count) {
            Some(total) if total <= self.max_capacity => {
                self.passenger_count = total;
                true
            }
            _ => false,
        }
    }

    /// Unload passengers. Fails without side effects if it would go below zero.
    pub fn remove_passengers(&mut self, count: u32) -> bool {
        match self.passenger_count.checked_sub(count) {
            Some(total) => {
                self.passenger_count = total;
                true
            }
            None => false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.passenger_count >= self.max_capacity
    }

    /// Room to take on another request, counting waiting assignments as seats
    pub fn has_spare_capacity(&self) -> bool {
        self.assigned_requests.len() < self.max_capacity as usize
    }

    pub fn load_fraction(&self) -> f64 {
        self.passenger_count as f64 / self.max_capacity as f64
    }

    pub fn is_idle(&self) -> bool {
        self.direction == Direction::Idle && self.target_floor.is_none()
    }

    /// Idle, empty and unassigned: free to move toward anticipated demand
    pub fn is_positioning_candidate(&self) -> bool {
        self.is_idle()
            && !self.doors_open
            && self.passenger_count == 0
            && self.assigned_requests.is_empty()
    }

    pub fn owns(&self, request: RequestId) -> bool {
        self.assigned_requests.contains(&request)
    }

    pub fn attach_request(&mut self, request: RequestId) {
        if !self.owns(request) {
            self.assigned_requests.push(request);
        }
    }

    pub fn detach_request(&mut self, request: RequestId) -> bool {
        let before = self.assigned_requests.len();
        self.assigned_requests.retain(|id| *id != request);
        self.assigned_requests.len() != before
    }
}
