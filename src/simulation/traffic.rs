//! Traffic patterns and request generation
//!
//! Tracks the simulated hour and rush-hour mode, and draws origin and
//! destination floors for generated requests.

use rand::Rng;

use super::config::SimConfig;
use super::types::{Direction, Floor, RushHourKind, GROUND_FLOOR};

/// Morning peak window in simulated hours
pub const MORNING_RUSH_HOURS: std::ops::Range<u32> = 7..10;
/// Evening peak window in simulated hours
pub const EVENING_RUSH_HOURS: std::ops::Range<u32> = 17..20;

/// Current traffic pattern of the building
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficState {
    /// Active peak, if any
    pub rush_hour: Option<RushHourKind>,
    /// Whether the peak follows the simulated hour
    pub automatic: bool,
}

impl TrafficState {
    pub fn new(automatic: bool) -> Self {
        Self {
            rush_hour: None,
            automatic,
        }
    }

    /// Hour of day (0..24) the clock value maps to
    pub fn simulated_hour(now: u64, config: &SimConfig) -> u32 {
        let elapsed_hours = now / config.ticks_per_hour;
        ((u64::from(config.start_hour) + elapsed_hours) % 24) as u32
    }

    /// Operator override. Disables the automatic schedule.
    pub fn enter_rush_hour(&mut self, kind: RushHourKind) {
        self.rush_hour = Some(kind);
        self.automatic = false;
    }

    /// Operator override. Disables the automatic schedule.
    pub fn exit_rush_hour(&mut self) {
        self.rush_hour = None;
        self.automatic = false;
    }

    /// Follow the simulated hour when the schedule is automatic.
    /// Returns true if the mode changed.
    pub fn update(&mut self, now: u64, config: &SimConfig) -> bool {
        if !self.automatic {
            return false;
        }
        let hour = Self::simulated_hour(now, config);
        let scheduled = if MORNING_RUSH_HOURS.contains(&hour) {
            Some(RushHourKind::Morning)
        } else if EVENING_RUSH_HOURS.contains(&hour) {
            Some(RushHourKind::Evening)
        } else {
            None
        };
        let changed = scheduled != self.rush_hour;
        self.rush_hour = scheduled;
        changed
    }

    pub fn is_rush_hour(&self) -> bool {
        self.rush_hour.is_some()
    }

    /// Direction that gets the high-traffic bonus, explicit config first
    pub fn high_traffic_direction(&self, configured: Option<Direction>) -> Option<Direction> {
        configured.or_else(|| self.rush_hour.map(|kind| kind.dominant_direction()))
    }

    /// Draw an origin/destination pair. Origin and destination always differ.
    pub fn generate_floors<R: Rng + ?Sized>(&self, rng: &mut R, config: &SimConfig) -> (Floor, Floor) {
        let lobby = config.lobby_floor;

        if let Some(kind) = self.rush_hour {
            if rng.random_bool(config.rush_hour_bias) {
                let other = random_floor_except(rng, config.total_floors, lobby);
                return match kind {
                    RushHourKind::Morning => (lobby, other),
                    RushHourKind::Evening => (other, lobby),
                };
            }
        }

        let origin = rng.random_range(GROUND_FLOOR..=config.total_floors);
        let destination = random_floor_except(rng, config.total_floors, origin);
        (origin, destination)
    }
}

/// Uniform floor in `[1, total_floors]` other than `excluded`
fn random_floor_except<R: Rng + ?Sized>(rng: &mut R, total_floors: Floor, excluded: Floor) -> Floor {
    let floor = rng.random_range(GROUND_FLOOR..total_floors);
    if floor >= excluded {
        floor + 1
    } else {
        floor
    }
}

/// Number of arrivals this tick for a mean rate of `rate` per tick.
///
/// The whole part always arrives; the fractional part arrives with that
/// probability.
pub fn arrival_count<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> usize {
    if rate <= 0.0 {
        return 0;
    }
    let whole = rate.floor();
    let fraction = rate - whole;
    let extra = if fraction > 0.0 && rng.random_bool(fraction) {
        1
    } else {
        0
    };
    whole as usize + extra
}
