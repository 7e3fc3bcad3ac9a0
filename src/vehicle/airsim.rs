use std::{sync::Arc, time::Duration};

use log::{info, warn};

use rmpv::Value;

use crate::encoders::encode_params;
use crate::{
    DrivetrainType, RpcClient, SimError, Statistics, StatisticsEngine, TcpRpcClient, Vector3r,
    YawMode,
};

#[cfg(test)]
use crate::rpc_client::stub::StubRpcClient;

use super::Multirotor;


/// API version implemented by this client.
const CLIENT_VERSION: i64 = 1;
/// Oldest simulator API version this client can drive.
const MIN_REQUIRED_SERVER_VERSION: i64 = 1;

const TAKEOFF_TIMEOUT_SECS: f32 = 20.0;
const LAND_TIMEOUT_SECS: f32 = 60.0;
/// `moveToZ` has no practical deadline.
const MOVE_TO_Z_TIMEOUT_SECS: f32 = 3e38;
/// Let the simulator pick the carrot distance.
const LOOKAHEAD: f32 = -1.0;
const ADAPTIVE_LOOKAHEAD: f32 = 1.0;

/// A multirotor in an AirSim simulator, driven over its MessagePack-RPC API.
///
/// # Overview
///
/// [AirSimMultirotor] holds the one TCP connection to the simulator for the life of the
/// value. Each [Multirotor] method maps to a single AirSim RPC and blocks until the
/// simulator answers, which for flight commands is when the maneuver is finished.
///
/// # Examples
///
/// ```no_run
/// use airsim_waypoint::{AirSimMultirotor, Multirotor, SimError};
///
/// fn main() -> Result<(), SimError> {
///     let vehicle = AirSimMultirotor::new()?;
///
///     vehicle.confirm_connection()?;
///     vehicle.enable_api_control(true)?;
///     vehicle.arm_disarm(true)?;
///     vehicle.takeoff()?;
///     vehicle.land()?;
///     vehicle.enable_api_control(false)?;
///
///     Ok(())
/// }
/// ```
///
/// # Error Handling
///
/// - Connection failures surface as [SimError::Connection] or [SimError::Io].
/// - Errors raised by the simulator surface as [SimError::Rpc].
/// - A path the simulator gives up on, usually because it timed out, surfaces as
///   [SimError::CommandFailed]. Other commands that do not complete are logged as
///   warnings and reported as successful.
pub struct AirSimMultirotor {
    statistics: Arc<StatisticsEngine>,
    rpc_client: Box<dyn RpcClient>,
    vehicle_name: String,
}

impl Multirotor for AirSimMultirotor {
    /// Pings the simulator and checks API version compatibility.
    ///
    /// A failed ping or a version mismatch is logged as a warning; only transport
    /// and RPC errors fail the call.
    fn confirm_connection(&self) -> Result<(), SimError> {
        match self.rpc_client.call("ping", Vec::new())?.as_bool() {
            Some(true) => info!("Connected!"),
            _ => warn!("Ping returned false!"),
        }

        let server_version = self.version("getServerVersion")?;
        let min_client_version = self.version("getMinRequiredClientVersion")?;
        info!(
            "Client Ver:{} (Min Req: {}), Server Ver:{} (Min Req: {})",
            CLIENT_VERSION, min_client_version, server_version, MIN_REQUIRED_SERVER_VERSION
        );

        if server_version < MIN_REQUIRED_SERVER_VERSION {
            warn!(
                "AirSim server is of older version and not supported by this client. Please upgrade!"
            );
        } else if CLIENT_VERSION < min_client_version {
            warn!(
                "AirSim client is of older version and not supported by this server. Please upgrade!"
            );
        }
        Ok(())
    }

    fn enable_api_control(&self, enabled: bool) -> Result<(), SimError> {
        let params = encode_params(&(enabled, &self.vehicle_name))?;
        self.rpc_client.call("enableApiControl", params)?;
        Ok(())
    }

    fn arm_disarm(&self, arm: bool) -> Result<(), SimError> {
        let params = encode_params(&(arm, &self.vehicle_name))?;
        let result = self.rpc_client.call("armDisarm", params)?;
        warn_unless_done("armDisarm", &result);
        Ok(())
    }

    fn takeoff(&self) -> Result<(), SimError> {
        let params = encode_params(&(TAKEOFF_TIMEOUT_SECS, &self.vehicle_name))?;
        let result = self.rpc_client.call("takeoff", params)?;
        warn_unless_done("takeoff", &result);
        Ok(())
    }

    fn move_to_z(&self, z: f32, velocity: f32) -> Result<(), SimError> {
        let params = encode_params(&(
            z,
            velocity,
            MOVE_TO_Z_TIMEOUT_SECS,
            YawMode::default(),
            LOOKAHEAD,
            ADAPTIVE_LOOKAHEAD,
            &self.vehicle_name,
        ))?;
        let result = self.rpc_client.call("moveToZ", params)?;
        warn_unless_done("moveToZ", &result);
        Ok(())
    }

    /// Fails with [SimError::CommandFailed] when the simulator gives up on the
    /// path, typically because `timeout` ran out before the last waypoint.
    fn move_on_path(
        &self,
        path: &[Vector3r],
        velocity: f32,
        timeout: Duration,
        drivetrain: DrivetrainType,
        yaw_mode: YawMode,
    ) -> Result<(), SimError> {
        let params = encode_params(&(
            path,
            velocity,
            timeout.as_secs_f32(),
            drivetrain,
            yaw_mode,
            LOOKAHEAD,
            ADAPTIVE_LOOKAHEAD,
            &self.vehicle_name,
        ))?;
        let result = self.rpc_client.call("moveOnPath", params)?;
        if completion("moveOnPath", &result)? {
            Ok(())
        } else {
            Err(SimError::CommandFailed(
                "moveOnPath did not complete".to_string(),
            ))
        }
    }

    fn land(&self) -> Result<(), SimError> {
        let params = encode_params(&(LAND_TIMEOUT_SECS, &self.vehicle_name))?;
        let result = self.rpc_client.call("land", params)?;
        warn_unless_done("land", &result);
        Ok(())
    }
}

impl AirSimMultirotor {
    /// Connects to the default vehicle of a simulator listening on 127.0.0.1:41451.
    ///
    /// # Errors
    ///
    /// Returns [SimError::Connection] if the simulator is not running.
    pub fn new() -> Result<AirSimMultirotor, SimError> {
        Self::with_configuration(&Configuration::default())
    }

    /// Connects to the simulator and vehicle named in `configuration`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use airsim_waypoint::{AirSimMultirotor, Configuration};
    /// use std::error::Error;
    ///
    /// fn main() -> Result<(), Box<dyn Error>> {
    ///     let configuration = Configuration {
    ///         simulator_host: "192.168.1.20:41451".to_string(),
    ///         vehicle_name: "Drone1".to_string(),
    ///         ..Default::default()
    ///     };
    ///     let vehicle = AirSimMultirotor::with_configuration(&configuration)?;
    ///     Ok(())
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// - If `simulator_host` does not resolve.
    /// - If no connection can be made within `connect_timeout`.
    pub fn with_configuration(
        configuration: &Configuration,
    ) -> Result<AirSimMultirotor, SimError> {
        let statistics = Arc::new(StatisticsEngine::new());
        let rpc_client = TcpRpcClient::new(configuration, statistics.clone())?;

        Ok(AirSimMultirotor {
            statistics,
            rpc_client: Box::new(rpc_client),
            vehicle_name: configuration.vehicle_name.clone(),
        })
    }

    #[cfg(test)]
    pub(crate) fn stub(mut rpc_client: StubRpcClient, vehicle_name: &str) -> AirSimMultirotor {
        let statistics = Arc::new(StatisticsEngine::new());

        rpc_client.statistics = Some(statistics.clone());

        AirSimMultirotor {
            statistics,
            rpc_client: Box::new(rpc_client),
            vehicle_name: vehicle_name.to_string(),
        }
    }

    /// Get request statistics for this session
    pub fn statistics(&self) -> Statistics {
        self.statistics.snapshot()
    }

    fn version(&self, method: &str) -> Result<i64, SimError> {
        let result = self.rpc_client.call(method, Vec::new())?;
        result.as_i64().ok_or_else(|| {
            SimError::Protocol(format!("{} returned {}, expected an integer", method, result))
        })
    }
}

/// Commands answer `true` when they completed and `false` when the simulator
/// gave up on them (timeout or cancellation).
fn completion(method: &str, result: &Value) -> Result<bool, SimError> {
    result.as_bool().ok_or_else(|| {
        SimError::Protocol(format!(
            "{} returned {}, expected a boolean",
            method, result
        ))
    })
}

/// Outside of path following a command that gave up is logged and the flight
/// carries on.
fn warn_unless_done(method: &str, result: &Value) {
    match completion(method, result) {
        Ok(true) => {}
        Ok(false) => warn!("{} did not complete", method),
        Err(e) => warn!("{}", e),
    }
}

/// Connection settings for an AirSim simulator.
///
/// # Default Configuration
///
/// ```rust
/// use airsim_waypoint::Configuration;
/// use std::time::Duration;
///
/// let default_config = Configuration {
///     simulator_host: "127.0.0.1:41451".to_string(),
///     connect_timeout: Duration::from_secs(5),
///     request_timeout: Duration::from_secs(3600),
///     vehicle_name: String::new(),
/// };
/// ```
#[derive(Clone, Debug)]
pub struct Configuration {
    /// Address of the AirSim RPC server, as "host:port".
    pub simulator_host: String,

    /// Maximum time to wait when opening the connection.
    pub connect_timeout: Duration,

    /// Maximum time to wait for any single call to return.
    ///
    /// Flight commands only answer once the maneuver completes, so this must
    /// exceed the longest command. A path with a 2000 second timeout needs more
    /// than 2000 seconds here.
    pub request_timeout: Duration,

    /// Vehicle to control, as named in the simulator's settings.json.
    /// Empty selects the default vehicle.
    pub vehicle_name: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            simulator_host: crate::DEFAULT_SIMULATOR_HOST.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(3600),
            vehicle_name: String::new(),
        }
    }
}
