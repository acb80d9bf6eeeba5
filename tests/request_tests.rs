//! Request lifecycle and priority escalation tests

use elevator_sim::simulation::{
    Direction, ElevatorId, RequestId, RequestState, SchedulerConfig, SimId, SimRequest,
};

fn request(origin: u32, destination: u32, arrival: u64) -> SimRequest {
    SimRequest::new(RequestId(SimId(0)), origin, destination, arrival, false)
        .expect("valid request")
}

#[test]
fn test_request_rejects_same_origin_and_destination() {
    assert!(SimRequest::new(RequestId(SimId(1)), 4, 4, 0, true).is_err());
}

#[test]
fn test_request_lifecycle_moves_forward() {
    let mut r = request(3, 7, 10);
    assert_eq!(r.state(), RequestState::Unassigned);
    assert_eq!(r.direction(), Direction::Up);
    assert_eq!(r.next_stop(), 3);

    assert!(r.assign(ElevatorId(SimId(2))));
    assert_eq!(r.state(), RequestState::Assigned);

    assert!(r.board(15));
    assert_eq!(r.state(), RequestState::PickedUp);
    assert_eq!(r.next_stop(), 7);

    assert!(r.deliver(22));
    assert_eq!(r.state(), RequestState::Delivered);
    assert_eq!(r.total_wait(), Some(12));
    assert_eq!(r.travel_time(), Some(7));
}

#[test]
fn test_request_cannot_skip_states() {
    let mut r = request(5, 2, 0);
    assert_eq!(r.direction(), Direction::Down);

    // Boarding without an elevator and delivering without boarding both fail
    assert!(!r.board(1));
    assert!(!r.deliver(1));
    assert_eq!(r.state(), RequestState::Unassigned);

    r.assign(ElevatorId(SimId(0)));
    assert!(!r.deliver(2));
    assert!(r.board(2));
    assert!(!r.board(3));
    assert_eq!(r.pickup_time, Some(2));
}

#[test]
fn test_request_ownership_fixed_after_boarding() {
    let mut r = request(1, 6, 0);
    assert!(r.assign(ElevatorId(SimId(0))));
    // Reassignment is allowed while the passenger is still waiting
    assert!(r.assign(ElevatorId(SimId(1))));
    assert!(r.board(4));
    assert!(!r.assign(ElevatorId(SimId(0))));
    assert_eq!(r.assigned_elevator, Some(ElevatorId(SimId(1))));
}

#[test]
fn test_priority_flat_below_escalation_threshold() {
    let config = SchedulerConfig::default();
    let r = request(1, 2, 0);
    assert_eq!(r.priority(0, &config), 1.0);
    assert_eq!(r.priority(config.escalation_threshold as u64, &config), 1.0);
    assert!(r.priority(config.escalation_threshold as u64 + 1, &config) > 1.0);
}

#[test]
fn test_priority_step_bonuses() {
    let config = SchedulerConfig::default();
    let r = request(1, 2, 0);

    let t2 = config.starvation_threshold as u64;
    let before = r.priority(t2 - 1, &config);
    let after = r.priority(t2, &config);
    assert!(after - before >= config.starvation_bonus);

    let t3 = config.critical_threshold as u64;
    let before = r.priority(t3 - 1, &config);
    let after = r.priority(t3, &config);
    assert!(after - before >= config.critical_bonus);
}

#[test]
fn test_priority_grows_without_bound() {
    let config = SchedulerConfig::default();
    let r = request(1, 2, 0);
    let mut last = r.priority(0, &config);
    for wait in [100, 1_000, 10_000, 100_000] {
        let p = r.priority(wait, &config);
        assert!(p > last);
        last = p;
    }
    assert!(last > 1_000.0);
}
