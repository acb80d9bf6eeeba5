use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;

use elevator_sim::simulation::{
    LogSink, RushHourKind, SimConfig, SimController, DEFAULT_ARRIVAL_RATE, DEFAULT_CAPACITY,
    DEFAULT_ELEVATORS, DEFAULT_FLOORS,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RushHour {
    Morning,
    Evening,
}

impl From<RushHour> for RushHourKind {
    fn from(value: RushHour) -> Self {
        match value {
            RushHour::Morning => RushHourKind::Morning,
            RushHour::Evening => RushHourKind::Evening,
        }
    }
}

#[derive(Parser)]
#[command(name = "elevator_sim")]
#[command(about = "Multi-elevator dispatch simulation")]
struct Cli {
    /// Number of floors in the building
    #[arg(long, default_value_t = DEFAULT_FLOORS)]
    floors: u32,

    /// Number of elevators
    #[arg(long, default_value_t = DEFAULT_ELEVATORS)]
    elevators: usize,

    /// Mean new requests per tick
    #[arg(long, default_value_t = DEFAULT_ARRIVAL_RATE)]
    rate: f64,

    /// Passengers per elevator
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: u32,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "500")]
    ticks: u64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Start in a rush-hour traffic pattern
    #[arg(long, value_enum)]
    rush_hour: Option<RushHour>,

    /// Follow the simulated clock into and out of rush hour
    #[arg(long)]
    auto_rush_hour: bool,

    /// Tick speed multiplier when running in real time
    #[arg(long, default_value = "1.0")]
    speed: f64,

    /// Sleep between ticks instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Print a summary every N ticks (0 disables)
    #[arg(long, default_value = "100")]
    report_every: u64,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = SimConfig::new(cli.floors, cli.elevators, cli.rate).with_capacity(cli.capacity);
    config.auto_rush_hour = cli.auto_rush_hour;
    config.seed = cli.seed;

    let mut controller = SimController::new(config)?;
    controller.set_speed(cli.speed)?;
    controller.add_sink(Box::new(LogSink));
    if let Some(kind) = cli.rush_hour {
        controller.enter_rush_hour(kind.into());
    }

    run_headless(&mut controller, cli.ticks, cli.report_every, cli.realtime);

    if cli.json {
        println!("{}", controller.world().snapshot().to_json()?);
    }
    Ok(())
}

/// Run the simulation in headless mode (no viewer)
fn run_headless(controller: &mut SimController, ticks: u64, report_every: u64, realtime: bool) {
    println!("Running elevator simulation in headless mode...");
    println!(
        "Floors: {}, Elevators: {}, Ticks: {}",
        controller.world().config.total_floors,
        controller.world().config.elevator_count,
        ticks
    );
    println!();

    controller.start();
    for tick in 1..=ticks {
        controller.step();

        if report_every > 0 && tick % report_every == 0 && tick < ticks {
            println!("--- After tick {} ---", tick);
            controller.world().print_summary();
            controller.world().draw_shafts();
        }

        if realtime {
            std::thread::sleep(controller.tick_interval());
        }
    }
    controller.stop();

    println!("=== Final State ===");
    controller.world().print_summary();
    controller.world().draw_shafts();

    let stats = &controller.world().stats;
    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks: {}", controller.world().ticks);
    info!("Total requests: {}", stats.total_requests);
    info!("Completed requests: {}", stats.completed_requests);
    info!("Pending requests: {}", controller.world().pending_count());
    info!("Mean wait: {:.2}", stats.mean_wait());
    info!("Max wait: {}", stats.max_wait);
    info!("Mean travel: {:.2}", stats.mean_travel());
    info!("Max travel: {}", stats.max_travel);
    info!("Completion rate: {:.1}%", stats.completion_rate());
}
