use clap::{Command, arg};
use log::info;

use airsim_waypoint::{AirSimMultirotor, Configuration, Multirotor};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let matches = Command::new("confirm_connection")
        .about("verify connection to an AirSim simulator")
        .arg(
            arg!(--simulator_host <VALUE>)
                .help("host and port of the AirSim RPC server. e.g. 127.0.0.1:41451")
                .default_value("127.0.0.1:41451"),
        )
        .get_matches();

    let simulator_host = matches
        .get_one::<String>("simulator_host")
        .cloned()
        .unwrap_or_default();
    info!("Connecting to AirSim at {}", simulator_host);

    let configuration = Configuration {
        simulator_host,
        ..Default::default()
    };

    let vehicle = match AirSimMultirotor::with_configuration(&configuration) {
        Ok(vehicle) => vehicle,
        Err(e) => {
            eprintln!("Error connecting to AirSim: {}", e);
            std::process::exit(1);
        }
    };

    vehicle.confirm_connection()?;

    let statistics = vehicle.statistics();
    println!("Runtime: {:?}", statistics.runtime);
    println!("Request count: {:?}", statistics.request_count);
    println!("Error count: {:?}", statistics.error_count);

    Ok(())
}
