//! Runtime settings for the rally computer.
//!
//! These are separate from the TOML schema in `rally_config`; see
//! `conversions` for the mapping.

use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

use crate::cast::DEFAULT_PACE_TOLERANCE_S;
use crate::odometer::OdometerMode;

/// Settings consumed by `RallyComputer`.
#[derive(Debug, Clone)]
pub struct ComputerCfg {
    /// Delay between polls while waiting for a new fix.
    pub poll_interval: Duration,
    /// Delay between polls while waiting for the first usable fix.
    pub startup_poll_interval: Duration,
    /// Give up on the first fix after this long. `None` waits until cancelled.
    pub startup_timeout: Option<Duration>,
    /// Odometer calibration factor applied at startup (> 0).
    pub calibration: f64,
    pub initial_mode: OdometerMode,
    /// Zone used to display times and to interpret entered clock times.
    pub timezone: FixedOffset,
}

impl Default for ComputerCfg {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            startup_poll_interval: Duration::from_secs(1),
            startup_timeout: None,
            calibration: 1.0,
            initial_mode: OdometerMode::Park,
            timezone: Utc.fix(),
        }
    }
}

/// Display-side settings shared with the host loop.
#[derive(Debug, Clone, Copy)]
pub struct PaceCfg {
    pub tolerance_s: f64,
}

impl Default for PaceCfg {
    fn default() -> Self {
        Self {
            tolerance_s: DEFAULT_PACE_TOLERANCE_S,
        }
    }
}
