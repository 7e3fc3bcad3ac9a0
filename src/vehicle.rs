use std::time::Duration;

use crate::{DrivetrainType, SimError, Vector3r, YawMode};

pub mod airsim;

/// Control surface of a simulated multirotor.
///
/// Every method is a blocking request: it returns once the simulator reports the
/// command complete, or with the error that stopped it. Nothing is retried.
pub trait Multirotor {
    /// Verifies the simulator is reachable and answering.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the simulator responded. An unreachable simulator is an error
    /// and no further command should be attempted.
    fn confirm_connection(&self) -> Result<(), SimError>;

    /// Gives control authority to this API (`true`) or returns it to the
    /// simulator's manual input (`false`).
    fn enable_api_control(&self, enabled: bool) -> Result<(), SimError>;

    /// Arms (`true`) or disarms (`false`) the motors.
    fn arm_disarm(&self, arm: bool) -> Result<(), SimError>;

    /// Takes off and blocks until airborne.
    fn takeoff(&self) -> Result<(), SimError>;

    /// Climbs or descends to `z` (NED, negative is up) at `velocity` m/s and
    /// blocks until the altitude is reached.
    fn move_to_z(&self, z: f32, velocity: f32) -> Result<(), SimError>;

    /// Follows `path` in order at `velocity` m/s.
    ///
    /// Blocks until the last point is reached. If `timeout` elapses first the
    /// simulator abandons the path and the call returns an error.
    fn move_on_path(
        &self,
        path: &[Vector3r],
        velocity: f32,
        timeout: Duration,
        drivetrain: DrivetrainType,
        yaw_mode: YawMode,
    ) -> Result<(), SimError>;

    /// Lands and blocks until on the ground.
    fn land(&self) -> Result<(), SimError>;
}
