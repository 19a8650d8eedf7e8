//! `From` implementations bridging `rally_config` types to `rally_core` types.

use std::time::Duration;

use chrono::{Offset, Utc};

use crate::config::{ComputerCfg, PaceCfg};
use crate::odometer::OdometerMode;

// ── OdometerMode ─────────────────────────────────────────────────────────────

impl From<rally_config::InitialMode> for OdometerMode {
    fn from(m: rally_config::InitialMode) -> Self {
        match m {
            rally_config::InitialMode::Park => OdometerMode::Park,
            rally_config::InitialMode::Drive => OdometerMode::Drive,
        }
    }
}

// ── ComputerCfg ──────────────────────────────────────────────────────────────

impl From<&rally_config::Config> for ComputerCfg {
    fn from(c: &rally_config::Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(c.computer.poll_ms),
            startup_poll_interval: Duration::from_millis(c.computer.startup_poll_ms),
            startup_timeout: None,
            calibration: c.odometer_calibration,
            initial_mode: c.computer.initial_mode.into(),
            // validate() rejects offsets chrono cannot represent
            timezone: c.timezone.fixed_offset().unwrap_or_else(|| Utc.fix()),
        }
    }
}

// ── PaceCfg ──────────────────────────────────────────────────────────────────

impl From<&rally_config::DisplayCfg> for PaceCfg {
    fn from(c: &rally_config::DisplayCfg) -> Self {
        Self {
            tolerance_s: c.pace_tolerance_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_config_sections() {
        let mut c = rally_config::Config::default();
        c.odometer_calibration = 1.05;
        c.timezone.offset_hours = -7.0;
        c.computer.poll_ms = 25;
        c.computer.initial_mode = rally_config::InitialMode::Drive;
        let rt = ComputerCfg::from(&c);
        assert_eq!(rt.poll_interval, Duration::from_millis(25));
        assert_eq!(rt.startup_poll_interval, Duration::from_secs(1));
        assert_eq!(rt.calibration, 1.05);
        assert_eq!(rt.initial_mode, OdometerMode::Drive);
        assert_eq!(rt.timezone.local_minus_utc(), -7 * 3600);
        assert_eq!(PaceCfg::from(&c.display).tolerance_s, 0.5);
    }
}
