use std::time::Duration;

use clap::Parser;
use log::info;

use airsim_waypoint::{AirSimMultirotor, Configuration, FlightPlan, fly};

/// Fly the delivery route: take off, climb to 20 m, visit the pickup,
/// mid-route and delivery waypoints, hover and land.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Host and port of the AirSim RPC server, e.g. 127.0.0.1:41451
    #[arg(long, default_value = airsim_waypoint::DEFAULT_SIMULATOR_HOST)]
    simulator_host: String,

    /// Vehicle name from the simulator's settings.json (empty for the default vehicle)
    #[arg(long, default_value = "")]
    vehicle_name: String,

    /// Seconds to wait for the connection to open
    #[arg(long, default_value_t = 5)]
    connect_timeout: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    info!("Connecting to AirSim at {}", args.simulator_host);

    let configuration = Configuration {
        simulator_host: args.simulator_host,
        vehicle_name: args.vehicle_name,
        connect_timeout: Duration::from_secs(args.connect_timeout),
        ..Default::default()
    };

    let vehicle = AirSimMultirotor::with_configuration(&configuration)?;
    fly(&vehicle, &FlightPlan::default())?;

    let statistics = vehicle.statistics();
    info!(
        "{} requests, {} errors in {:?}",
        statistics.request_count, statistics.error_count, statistics.runtime
    );

    Ok(())
}
