//! The delivery flight: a fixed list of blocking commands run in order.

use std::thread;
use std::time::Duration;

use log::info;

use crate::{DrivetrainType, Multirotor, SimError, Vector3r, YawMode};

#[cfg(test)]
mod tests;

/// Pickup, mid-route and delivery points, NED meters.
const WAYPOINTS: [Vector3r; 3] = [
    Vector3r::new(-25.0, 25.0, -10.0),
    Vector3r::new(10.0, 10.0, -15.0),
    Vector3r::new(40.0, -20.0, -10.0),
];

/// Parameters of a flight. They do not change while the flight runs.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightPlan {
    /// Altitude to climb to after takeoff, as NED z (negative is up).
    pub cruise_altitude: f32,
    /// Climb rate in m/s.
    pub climb_velocity: f32,
    /// Points to fly through, in order.
    pub waypoints: Vec<Vector3r>,
    /// Speed along the path in m/s.
    pub path_velocity: f32,
    /// Time the simulator allows for the whole path.
    pub path_timeout: Duration,
    pub drivetrain: DrivetrainType,
    pub yaw_mode: YawMode,
    /// Hover time at the last waypoint before landing.
    pub hover: Duration,
}

impl Default for FlightPlan {
    /// Climb to 20 m, fly the three delivery waypoints at 4 m/s facing north,
    /// hover 3 s at the drop-off.
    fn default() -> Self {
        FlightPlan {
            cruise_altitude: -20.0,
            climb_velocity: 5.0,
            waypoints: WAYPOINTS.to_vec(),
            path_velocity: 4.0,
            path_timeout: Duration::from_secs(2000),
            drivetrain: DrivetrainType::MaxDegreeOfFreedom,
            yaw_mode: YawMode::absolute(0.0),
            hover: Duration::from_secs(3),
        }
    }
}

/// Flies `plan` with `vehicle`.
///
/// Each command blocks until the simulator reports it complete. The first error
/// is returned as-is: later commands are not sent and the vehicle is left armed,
/// airborne and under API control if that is where it was.
///
/// With [crate::AirSimMultirotor] a path that times out is such an error, so the
/// vehicle never lands. A takeoff, climb or landing the simulator gives up on is
/// only logged and the flight continues.
///
/// ```no_run
/// use airsim_waypoint::{AirSimMultirotor, FlightPlan, fly};
///
/// # fn main() -> Result<(), airsim_waypoint::SimError> {
/// let vehicle = AirSimMultirotor::new()?;
/// fly(&vehicle, &FlightPlan::default())?;
/// # Ok(())
/// # }
/// ```
pub fn fly<V: Multirotor + ?Sized>(vehicle: &V, plan: &FlightPlan) -> Result<(), SimError> {
    vehicle.confirm_connection()?;
    vehicle.enable_api_control(true)?;
    vehicle.arm_disarm(true)?;
    vehicle.takeoff()?;

    info!("Climbing to higher altitude...");
    vehicle.move_to_z(plan.cruise_altitude, plan.climb_velocity)?;
    info!("Reached altitude, starting waypoint navigation...");

    info!(
        "Flying {} waypoints at {} m/s",
        plan.waypoints.len(),
        plan.path_velocity
    );
    vehicle.move_on_path(
        &plan.waypoints,
        plan.path_velocity,
        plan.path_timeout,
        plan.drivetrain,
        plan.yaw_mode,
    )?;

    info!("Reached destination. Hovering for {:?}...", plan.hover);
    thread::sleep(plan.hover);

    info!("Landing...");
    vehicle.land()?;
    vehicle.enable_api_control(false)?;
    info!("Flight complete!");

    Ok(())
}
