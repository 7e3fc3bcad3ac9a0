//! Tests for the flight sequence, run against a recording vehicle.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;

use super::*;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    ConfirmConnection,
    EnableApiControl(bool),
    ArmDisarm(bool),
    Takeoff,
    MoveToZ {
        z: f32,
        velocity: f32,
    },
    MoveOnPath {
        path: Vec<Vector3r>,
        velocity: f32,
        timeout: Duration,
        drivetrain: DrivetrainType,
        yaw_mode: YawMode,
    },
    Land,
}

/// Records every command with the time it was issued. Fails the first
/// command that matches `fail_on`.
struct RecordingVehicle {
    calls: RefCell<Vec<(Call, Instant)>>,
    fail_on: Option<fn(&Call) -> bool>,
}

impl RecordingVehicle {
    fn new() -> Self {
        RecordingVehicle {
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    fn failing_on(predicate: fn(&Call) -> bool) -> Self {
        RecordingVehicle {
            calls: RefCell::new(Vec::new()),
            fail_on: Some(predicate),
        }
    }

    fn record(&self, call: Call) -> Result<(), SimError> {
        let fail = self.fail_on.is_some_and(|predicate| predicate(&call));
        self.calls.borrow_mut().push((call, Instant::now()));
        if fail {
            return Err(SimError::CommandFailed("stubbed failure".into()));
        }
        Ok(())
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().iter().map(|(call, _)| call.clone()).collect()
    }

    fn issued_at(&self, index: usize) -> Instant {
        self.calls.borrow()[index].1
    }
}

impl Multirotor for RecordingVehicle {
    fn confirm_connection(&self) -> Result<(), SimError> {
        self.record(Call::ConfirmConnection)
    }

    fn enable_api_control(&self, enabled: bool) -> Result<(), SimError> {
        self.record(Call::EnableApiControl(enabled))
    }

    fn arm_disarm(&self, arm: bool) -> Result<(), SimError> {
        self.record(Call::ArmDisarm(arm))
    }

    fn takeoff(&self) -> Result<(), SimError> {
        self.record(Call::Takeoff)
    }

    fn move_to_z(&self, z: f32, velocity: f32) -> Result<(), SimError> {
        self.record(Call::MoveToZ { z, velocity })
    }

    fn move_on_path(
        &self,
        path: &[Vector3r],
        velocity: f32,
        timeout: Duration,
        drivetrain: DrivetrainType,
        yaw_mode: YawMode,
    ) -> Result<(), SimError> {
        self.record(Call::MoveOnPath {
            path: path.to_vec(),
            velocity,
            timeout,
            drivetrain,
            yaw_mode,
        })
    }

    fn land(&self) -> Result<(), SimError> {
        self.record(Call::Land)
    }
}

fn expected_calls() -> Vec<Call> {
    vec![
        Call::ConfirmConnection,
        Call::EnableApiControl(true),
        Call::ArmDisarm(true),
        Call::Takeoff,
        Call::MoveToZ {
            z: -20.0,
            velocity: 5.0,
        },
        Call::MoveOnPath {
            path: vec![
                Vector3r::new(-25.0, 25.0, -10.0),
                Vector3r::new(10.0, 10.0, -15.0),
                Vector3r::new(40.0, -20.0, -10.0),
            ],
            velocity: 4.0,
            timeout: Duration::from_secs(2000),
            drivetrain: DrivetrainType::MaxDegreeOfFreedom,
            yaw_mode: YawMode::absolute(0.0),
        },
        Call::Land,
        Call::EnableApiControl(false),
    ]
}

/// The default plan with no hover, for tests that only look at ordering.
fn quick_plan() -> FlightPlan {
    FlightPlan {
        hover: Duration::ZERO,
        ..FlightPlan::default()
    }
}

mod flight_plan {
    use super::*;

    #[test]
    fn default_plan_matches_delivery_route() {
        let plan = FlightPlan::default();

        assert_relative_eq!(plan.cruise_altitude, -20.0);
        assert_relative_eq!(plan.climb_velocity, 5.0);
        assert_relative_eq!(plan.path_velocity, 4.0);
        assert_eq!(plan.path_timeout, Duration::from_secs(2000));
        assert_eq!(plan.drivetrain, DrivetrainType::MaxDegreeOfFreedom);
        assert_eq!(plan.yaw_mode, YawMode::absolute(0.0));
        assert!(!plan.yaw_mode.is_rate);
        assert_eq!(plan.hover, Duration::from_secs(3));
    }

    #[test]
    fn default_waypoints_are_in_route_order() {
        assert_eq!(
            FlightPlan::default().waypoints,
            vec![
                Vector3r::new(-25.0, 25.0, -10.0),
                Vector3r::new(10.0, 10.0, -15.0),
                Vector3r::new(40.0, -20.0, -10.0),
            ]
        );
    }

    #[test]
    fn waypoints_stay_above_ground() {
        // NED: every point must have negative z.
        assert!(FlightPlan::default().waypoints.iter().all(|p| p.z_val < 0.0));
    }
}

mod sequencing {
    use super::*;

    #[test]
    fn issues_commands_in_order() {
        let vehicle = RecordingVehicle::new();

        fly(&vehicle, &quick_plan()).unwrap();

        assert_eq!(vehicle.calls(), expected_calls());
    }

    #[test]
    fn path_is_the_three_waypoints_in_order() {
        let vehicle = RecordingVehicle::new();

        fly(&vehicle, &quick_plan()).unwrap();

        let path = vehicle
            .calls()
            .into_iter()
            .find_map(|call| match call {
                Call::MoveOnPath { path, .. } => Some(path),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            path,
            [
                Vector3r::new(-25.0, 25.0, -10.0),
                Vector3r::new(10.0, 10.0, -15.0),
                Vector3r::new(40.0, -20.0, -10.0),
            ]
        );
    }

    #[test]
    fn hovers_at_least_three_seconds_before_landing() {
        let vehicle = RecordingVehicle::new();

        fly(&vehicle, &FlightPlan::default()).unwrap();

        let calls = vehicle.calls();
        assert_eq!(calls[5], expected_calls()[5]);
        assert_eq!(calls[6], Call::Land);

        let hover = vehicle.issued_at(6) - vehicle.issued_at(5);
        assert!(hover >= Duration::from_secs(3), "hovered {:?}", hover);
    }

    #[test]
    fn repeated_runs_are_identical_and_independent() {
        let first = RecordingVehicle::new();
        let second = RecordingVehicle::new();

        fly(&first, &quick_plan()).unwrap();
        fly(&second, &quick_plan()).unwrap();

        assert_eq!(first.calls(), second.calls());
        assert_eq!(first.calls(), expected_calls());
    }

    #[test]
    fn works_through_trait_object() {
        let vehicle = RecordingVehicle::new();
        let dyn_vehicle: &dyn Multirotor = &vehicle;

        fly(dyn_vehicle, &quick_plan()).unwrap();

        assert_eq!(vehicle.calls().len(), 8);
    }
}

mod failures {
    use super::*;

    #[test]
    fn connection_failure_stops_everything() {
        let vehicle = RecordingVehicle::failing_on(|call| *call == Call::ConfirmConnection);

        let result = fly(&vehicle, &quick_plan());

        assert!(result.is_err());
        assert_eq!(vehicle.calls(), vec![Call::ConfirmConnection]);
    }

    #[test]
    fn path_failure_skips_landing_and_release() {
        let vehicle =
            RecordingVehicle::failing_on(|call| matches!(call, Call::MoveOnPath { .. }));

        let result = fly(&vehicle, &quick_plan());

        assert!(matches!(result, Err(SimError::CommandFailed(_))));
        let calls = vehicle.calls();
        assert_eq!(calls, expected_calls()[..6].to_vec());
        assert!(!calls.contains(&Call::Land));
        assert!(!calls.contains(&Call::EnableApiControl(false)));
    }

    #[test]
    fn arm_failure_leaves_api_control_enabled() {
        let vehicle = RecordingVehicle::failing_on(|call| *call == Call::ArmDisarm(true));

        assert!(fly(&vehicle, &quick_plan()).is_err());
        assert_eq!(
            vehicle.calls(),
            vec![
                Call::ConfirmConnection,
                Call::EnableApiControl(true),
                Call::ArmDisarm(true),
            ]
        );
    }

    #[test]
    fn landing_failure_keeps_api_control() {
        let vehicle = RecordingVehicle::failing_on(|call| *call == Call::Land);

        assert!(fly(&vehicle, &quick_plan()).is_err());
        assert_eq!(vehicle.calls().last(), Some(&Call::Land));
    }
}

mod over_tcp {
    use super::*;
    use crate::tests::rpc_stub::{Reply, Server};
    use crate::{AirSimMultirotor, Configuration};
    use rmpv::Value;

    fn connect(server: &Server) -> AirSimMultirotor {
        let configuration = Configuration {
            simulator_host: server.address(),
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        AirSimMultirotor::with_configuration(&configuration).unwrap()
    }

    #[test]
    fn full_flight_reaches_simulator_in_order() {
        let server = Server::start(Vec::new());
        let vehicle = connect(&server);

        fly(&vehicle, &quick_plan()).unwrap();

        assert_eq!(
            server.methods(),
            [
                "ping",
                "getServerVersion",
                "getMinRequiredClientVersion",
                "enableApiControl",
                "armDisarm",
                "takeoff",
                "moveToZ",
                "moveOnPath",
                "land",
                "enableApiControl",
            ]
        );
        assert_eq!(vehicle.statistics().request_count, 10);
    }

    #[test]
    fn path_timeout_over_tcp_never_lands() {
        let server = Server::start(vec![("moveOnPath", Reply::Result(Value::Boolean(false)))]);
        let vehicle = connect(&server);

        let result = fly(&vehicle, &quick_plan());

        assert!(matches!(result, Err(SimError::CommandFailed(_))));
        let methods = server.methods();
        assert_eq!(methods.last().map(String::as_str), Some("moveOnPath"));
        assert!(!methods.iter().any(|m| m == "land"));
    }

    #[test]
    fn unfinished_landing_still_releases_control() {
        let server = Server::start(vec![("land", Reply::Result(Value::Boolean(false)))]);
        let vehicle = connect(&server);

        fly(&vehicle, &quick_plan()).unwrap();

        let methods = server.methods();
        assert_eq!(methods[methods.len() - 2], "land");
        assert_eq!(methods.last().map(String::as_str), Some("enableApiControl"));
    }
}
