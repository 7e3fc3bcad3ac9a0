//! Request accounting for a simulator session.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// A snapshot of the RPC traffic of an [`AirSimMultirotor`](crate::AirSimMultirotor) session.
///
/// # Fields
///
/// - `runtime`: Time since the connection was opened.
/// - `request_count`: Number of RPC requests sent to the simulator.
/// - `error_count`: Number of calls that failed, whether on the wire or rejected by the simulator.
///
/// ```no_run
/// use airsim_waypoint::{AirSimMultirotor, FlightPlan, SimError, fly};
///
/// fn main() -> Result<(), SimError> {
///     let vehicle = AirSimMultirotor::new()?;
///     fly(&vehicle, &FlightPlan::default())?;
///
///     let stats = vehicle.statistics();
///     println!("{} requests in {:?}", stats.request_count, stats.runtime);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Statistics {
    pub runtime: Duration,
    pub request_count: u32,
    pub error_count: u32,
}

pub(crate) struct StatisticsEngine {
    start_time: Instant,
    error_count: AtomicU32,
    request_count: AtomicU32,
}

impl StatisticsEngine {
    pub fn new() -> Self {
        StatisticsEngine {
            start_time: Instant::now(),
            error_count: AtomicU32::new(0),
            request_count: AtomicU32::new(0),
        }
    }

    pub fn snapshot(&self) -> Statistics {
        Statistics {
            runtime: self.start_time.elapsed(),
            request_count: self.request_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_error_count(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new()
    }
}
