//! Calibrated distance accumulator driven by successive fixes.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{RallyError, Result};
use crate::geo::GeoFix;
use crate::util::{METERS_PER_KM, hours};

/// Direction in which fixes contribute to the accumulated distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OdometerMode {
    /// Position is tracked but distance is discarded.
    #[default]
    Park,
    Drive,
    /// Distance is subtracted, for backing up past a missed turn.
    Reverse,
}

impl OdometerMode {
    pub fn name(self) -> &'static str {
        match self {
            OdometerMode::Park => "PARK",
            OdometerMode::Drive => "DRIVE",
            OdometerMode::Reverse => "REVERSE",
        }
    }
}

impl fmt::Display for OdometerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Odometer state an instruction binds to at activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OdometerSnapshot {
    /// Calibrated accumulated distance in meters.
    pub distance_m: f64,
    /// Timestamp of the last fix.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Odometer {
    origin: GeoFix,
    last: GeoFix,
    raw_m: f64,
    calibration: f64,
    mode: OdometerMode,
}

impl Odometer {
    /// Start an odometer at `fix` in PARK with unit calibration.
    pub fn new(fix: GeoFix) -> Self {
        Self {
            origin: fix,
            last: fix,
            raw_m: 0.0,
            calibration: 1.0,
            mode: OdometerMode::Park,
        }
    }

    pub fn with_calibration(fix: GeoFix, calibration: f64) -> Result<Self> {
        let mut odo = Self::new(fix);
        odo.set_calibration(calibration)?;
        Ok(odo)
    }

    /// Apply one fix. The last fix always advances, even in PARK, so
    /// resuming DRIVE does not count the ground covered while parked.
    pub fn add_position(&mut self, fix: GeoFix) {
        let step = fix.subtract(&self.last);
        match self.mode {
            OdometerMode::Park => {}
            OdometerMode::Drive => self.raw_m += step.distance_m,
            OdometerMode::Reverse => self.raw_m -= step.distance_m,
        }
        self.last = fix;
    }

    /// Calibrated distance in meters.
    #[inline]
    pub fn accumulated_distance(&self) -> f64 {
        self.raw_m * self.calibration
    }

    /// Uncalibrated distance in meters.
    #[inline]
    pub fn raw_distance(&self) -> f64 {
        self.raw_m
    }

    /// Scale future readings so the current one equals `expected_km`.
    /// Returns the new calibration factor.
    pub fn calibrate(&mut self, expected_km: f64) -> Result<f64> {
        if self.raw_m == 0.0 {
            return Err(RallyError::Calibration(
                "no distance accumulated yet".into(),
            ));
        }
        let factor = expected_km * METERS_PER_KM / self.raw_m;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(RallyError::Calibration(format!(
                "expected distance {expected_km} km gives factor {factor}"
            )));
        }
        self.calibration = factor;
        tracing::info!(factor, expected_km, raw_m = self.raw_m, "odometer calibrated");
        Ok(factor)
    }

    pub fn set_calibration(&mut self, calibration: f64) -> Result<()> {
        if !(calibration.is_finite() && calibration > 0.0) {
            return Err(RallyError::Calibration(format!(
                "factor must be finite and > 0 (got {calibration})"
            )));
        }
        self.calibration = calibration;
        Ok(())
    }

    #[inline]
    pub fn calibration(&self) -> f64 {
        self.calibration
    }

    /// Speed of the last fix in km/h, calibrated.
    pub fn last_speed(&self) -> f64 {
        self.last.speed_kmh * self.calibration
    }

    /// Average km/h since the origin; `None` until time has passed.
    pub fn average_speed(&self) -> Option<f64> {
        let h = hours(self.elapsed_time());
        if h <= 0.0 {
            return None;
        }
        Some(self.accumulated_distance() / METERS_PER_KM / h)
    }

    pub fn elapsed_time(&self) -> TimeDelta {
        self.last.timestamp - self.origin.timestamp
    }

    /// Move the origin to the last fix and zero the accumulator.
    pub fn reset(&mut self) {
        self.origin = self.last;
        self.raw_m = 0.0;
        tracing::info!(at = %self.last.timestamp, "odometer reset");
    }

    /// Zero the accumulator but keep the origin.
    pub fn clear_distance(&mut self) {
        self.raw_m = 0.0;
        tracing::info!("odometer distance cleared");
    }

    #[inline]
    pub fn mode(&self) -> OdometerMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: OdometerMode) {
        if mode != self.mode {
            tracing::info!(from = %self.mode, to = %mode, "odometer mode");
        }
        self.mode = mode;
    }

    pub fn last_fix(&self) -> &GeoFix {
        &self.last
    }

    pub fn origin_fix(&self) -> &GeoFix {
        &self.origin
    }

    pub fn snapshot(&self) -> OdometerSnapshot {
        OdometerSnapshot {
            distance_m: self.accumulated_distance(),
            timestamp: self.last.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fix(lat: f64, secs: u32) -> GeoFix {
        GeoFix::new(
            lat,
            -122.0,
            0.0,
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, secs).unwrap(),
        )
    }

    #[test]
    fn defaults_to_park() {
        let mut odo = Odometer::new(fix(47.0, 0));
        assert_eq!(odo.mode(), OdometerMode::Park);
        odo.add_position(fix(47.01, 1));
        assert_eq!(odo.accumulated_distance(), 0.0);
        assert_eq!(odo.last_fix().lat, 47.01);
    }

    #[test]
    fn reverse_subtracts() {
        let mut odo = Odometer::new(fix(47.0, 0));
        odo.set_mode(OdometerMode::Drive);
        odo.add_position(fix(47.01, 1));
        let forward = odo.accumulated_distance();
        odo.set_mode(OdometerMode::Reverse);
        odo.add_position(fix(47.0, 2));
        assert!(odo.accumulated_distance().abs() < 1e-6);
        assert!(forward > 1000.0);
    }

    #[test]
    fn calibration_scales_reading_not_raw() {
        let mut odo = Odometer::new(fix(47.0, 0));
        odo.set_mode(OdometerMode::Drive);
        odo.add_position(fix(47.01, 1));
        let raw = odo.raw_distance();
        let factor = odo.calibrate(1.0).unwrap();
        assert!((odo.accumulated_distance() - 1000.0).abs() < 1e-9);
        assert_eq!(odo.raw_distance(), raw);
        assert!((factor - 1000.0 / raw).abs() < 1e-12);
    }

    #[test]
    fn calibrate_without_distance_fails() {
        let mut odo = Odometer::new(fix(47.0, 0));
        assert!(matches!(odo.calibrate(1.0), Err(RallyError::Calibration(_))));
        assert_eq!(odo.calibration(), 1.0);
    }

    #[test]
    fn rejects_bad_calibration_factor() {
        assert!(Odometer::with_calibration(fix(47.0, 0), 0.0).is_err());
        assert!(Odometer::with_calibration(fix(47.0, 0), f64::NAN).is_err());
        let odo = Odometer::with_calibration(fix(47.0, 0), 1.02).unwrap();
        assert_eq!(odo.calibration(), 1.02);
    }

    #[test]
    fn average_speed_needs_elapsed_time() {
        let mut odo = Odometer::new(fix(47.0, 0));
        assert_eq!(odo.average_speed(), None);
        odo.set_mode(OdometerMode::Drive);
        odo.add_position(fix(47.0, 10).with_speed(40.0));
        assert_eq!(odo.average_speed(), Some(0.0));
        assert_eq!(odo.last_speed(), 40.0);
    }

    #[test]
    fn reset_moves_origin_and_clear_keeps_it() {
        let mut odo = Odometer::new(fix(47.0, 0));
        odo.set_mode(OdometerMode::Drive);
        odo.add_position(fix(47.01, 5));
        odo.clear_distance();
        assert_eq!(odo.accumulated_distance(), 0.0);
        assert_eq!(odo.elapsed_time(), TimeDelta::seconds(5));
        odo.add_position(fix(47.02, 6));
        odo.reset();
        assert_eq!(odo.accumulated_distance(), 0.0);
        assert_eq!(odo.elapsed_time(), TimeDelta::zero());
        assert_eq!(odo.mode(), OdometerMode::Drive);
    }
}
