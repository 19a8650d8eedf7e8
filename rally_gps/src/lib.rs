//! GPS sources for the rally computer.
//!
//! - `gpsd::GpsdSource`: live receiver through a gpsd daemon
//! - `replay::NmeaReplay`: recorded NMEA log, one fix epoch per poll
//! - `SimulatedGps`: synthetic northbound drive at a constant speed
pub mod error;
pub mod gpsd;
pub mod replay;

pub use error::GpsError;
pub use gpsd::GpsdSource;
pub use replay::NmeaReplay;

use chrono::{DateTime, TimeDelta, Utc};
use rally_traits::{FixMode, GpsPacket, GpsSource};

/// Meters per degree of latitude on a 6371 km sphere.
const METERS_PER_DEG_LAT: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

/// Simulated receiver driving due north along a meridian.
///
/// Every `current()` call advances the simulation by one sample period, so
/// each poll yields a materially new fix. The first `warmup` polls report no
/// fix, like a receiver still acquiring satellites.
#[derive(Debug, Clone)]
pub struct SimulatedGps {
    lat: f64,
    lon: f64,
    alt: f64,
    start: DateTime<Utc>,
    period: TimeDelta,
    speed_kmh: f64,
    warmup: u32,
    tick: i32,
}

impl SimulatedGps {
    pub fn new(speed_kmh: f64) -> Self {
        Self {
            lat: 47.69431,
            lon: -122.345998333,
            alt: 150.0,
            start: Utc::now(),
            period: TimeDelta::seconds(1),
            speed_kmh,
            warmup: 0,
            tick: -1,
        }
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn with_origin(mut self, lat: f64, lon: f64, alt: f64) -> Self {
        self.lat = lat;
        self.lon = lon;
        self.alt = alt;
        self
    }

    pub fn with_warmup(mut self, polls: u32) -> Self {
        self.warmup = polls;
        self
    }

    fn packet_at(&self, tick: i32) -> GpsPacket {
        let elapsed_s = self.period.num_milliseconds() as f64 / 1000.0 * f64::from(tick);
        let travelled_m = self.speed_kmh / 3.6 * elapsed_s;
        GpsPacket {
            lat: self.lat + travelled_m / METERS_PER_DEG_LAT,
            lon: self.lon,
            alt: Some(self.alt),
            time: Some(self.start + self.period * tick),
            hspeed_mps: self.speed_kmh / 3.6,
            mode: FixMode::Fix3d,
        }
    }
}

impl GpsSource for SimulatedGps {
    fn current(&mut self) -> Result<GpsPacket, Box<dyn std::error::Error + Send + Sync>> {
        if self.warmup > 0 {
            self.warmup -= 1;
            tracing::trace!(remaining = self.warmup, "simulated receiver acquiring");
            return Ok(GpsPacket::no_fix());
        }
        self.tick = self.tick.saturating_add(1);
        let packet = self.packet_at(self.tick);
        tracing::trace!(lat = packet.lat, tick = self.tick, "simulated fix");
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_fixes_advance_in_time_and_space() {
        let mut gps = SimulatedGps::new(36.0);
        let a = gps.current().unwrap();
        let b = gps.current().unwrap();
        assert!(b.lat > a.lat);
        assert_eq!(b.time.unwrap() - a.time.unwrap(), TimeDelta::seconds(1));
        // 36 km/h = 10 m/s
        let moved_m = (b.lat - a.lat) * METERS_PER_DEG_LAT;
        assert!((moved_m - 10.0).abs() < 1e-6, "moved {moved_m}");
    }

    #[test]
    fn warmup_reports_no_fix() {
        let mut gps = SimulatedGps::new(50.0).with_warmup(2);
        assert!(!gps.current().unwrap().mode.has_fix());
        assert!(!gps.current().unwrap().mode.has_fix());
        assert!(gps.current().unwrap().mode.has_fix());
    }
}
