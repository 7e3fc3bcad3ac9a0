//! AirSim is an open-source simulator for drones and cars built on Unreal Engine. It exposes vehicle
//! control through a MessagePack-RPC server, by default on port 41451.
//!
//! This crate flies an AirSim multirotor through a fixed delivery route. It:
//!
//! * Connects to the simulator and takes API control of the vehicle.
//! * Arms, takes off and climbs to cruise altitude.
//! * Follows a three waypoint path, hovers at the drop-off and lands.
//! * Hands control back to the simulator's manual input.
//!
//! Flight dynamics, path following and timing are owned by the simulator. Every command blocks
//! until AirSim reports completion, and the first failure aborts the run without any
//! compensating action.
//!
//! ```no_run
//! use airsim_waypoint::{AirSimMultirotor, FlightPlan, SimError, fly};
//!
//! fn main() -> Result<(), SimError> {
//!     let vehicle = AirSimMultirotor::new()?;
//!     fly(&vehicle, &FlightPlan::default())
//! }
//! ```

use serde::{Serialize, Serializer};
use thiserror::Error;

mod decoders;
mod encoders;
mod rpc_client;
mod sequencer;
mod statistics;
mod vehicle;


pub use sequencer::{FlightPlan, fly};
pub use statistics::Statistics;
pub use vehicle::Multirotor;
pub use vehicle::airsim::{AirSimMultirotor, Configuration};

#[cfg(feature = "bench-internals")]
pub use encoders::encode_request;

pub(crate) use rpc_client::{RpcClient, tcp::TcpRpcClient};
pub(crate) use statistics::StatisticsEngine;

/// Default address of the AirSim RPC server.
pub const DEFAULT_SIMULATOR_HOST: &str = "127.0.0.1:41451";

/// Errors raised while talking to the simulator.
#[derive(Error, Debug)]
pub enum SimError {
    /// The simulator could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The connection failed after it was established.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request parameters could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// The simulator answered with something that is not a valid RPC response.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The simulator rejected the call and returned an error.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The command ran but the simulator reported it did not complete,
    /// e.g. a path that timed out.
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// A point or vector in the simulator's North-East-Down frame, in meters.
///
/// Altitude gain is negative `z_val`. Serializes as a map keyed by field name,
/// the layout AirSim's RPC adaptors read.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector3r {
    pub x_val: f32,
    pub y_val: f32,
    pub z_val: f32,
}

impl Vector3r {
    pub const fn new(x_val: f32, y_val: f32, z_val: f32) -> Self {
        Vector3r {
            x_val,
            y_val,
            z_val,
        }
    }
}

/// How the vehicle orients itself while moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DrivetrainType {
    /// The vehicle always faces the direction of travel.
    ForwardOnly = 0,
    /// Yaw is controlled independently of the direction of travel.
    MaxDegreeOfFreedom = 1,
}

impl Serialize for DrivetrainType {
    /// AirSim takes the drivetrain as its integer discriminant.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Heading policy for a move command.
///
/// With `is_rate` set, `yaw_or_rate` is a turn rate in degrees per second.
/// Otherwise it is an absolute compass heading in degrees, 0 being north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YawMode {
    pub is_rate: bool,
    pub yaw_or_rate: f32,
}

impl YawMode {
    /// Hold a fixed heading.
    pub const fn absolute(degrees: f32) -> Self {
        YawMode {
            is_rate: false,
            yaw_or_rate: degrees,
        }
    }

    /// Turn at a fixed rate.
    pub const fn rate(degrees_per_second: f32) -> Self {
        YawMode {
            is_rate: true,
            yaw_or_rate: degrees_per_second,
        }
    }
}

impl Default for YawMode {
    /// Zero turn rate, matching the simulator's own default.
    fn default() -> Self {
        YawMode::rate(0.0)
    }
}
