//! Position fixes and the displacement between two of them.
//!
//! Horizontal distance is the haversine great-circle distance on a sphere
//! of radius 6371 km; altitude change is combined with it as an orthogonal
//! axis, which holds for the short hops between consecutive fixes.

use chrono::{DateTime, TimeDelta, Utc};
use rally_traits::GpsPacket;

use crate::util::KMH_PER_MPS;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Vehicle state at one instant. Created once per GPS sample, never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFix {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Altitude in meters.
    pub alt: f64,
    pub timestamp: DateTime<Utc>,
    /// Instantaneous speed in km/h, 0 when unknown.
    pub speed_kmh: f64,
}

impl GeoFix {
    pub fn new(lat: f64, lon: f64, alt: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            lat,
            lon,
            alt,
            timestamp,
            speed_kmh: 0.0,
        }
    }

    pub fn with_speed(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = speed_kmh;
        self
    }

    /// Build a fix from a receiver packet.
    ///
    /// Returns `None` unless the packet carries at least a 2D fix and a
    /// timestamp. A packet without altitude takes `fallback_alt` so a 2D fix
    /// does not register as a vertical jump.
    pub fn from_packet(packet: &GpsPacket, fallback_alt: f64) -> Option<Self> {
        if !packet.mode.has_fix() {
            return None;
        }
        let timestamp = packet.time?;
        if !(packet.lat.is_finite() && packet.lon.is_finite()) {
            return None;
        }
        let speed_kmh = if packet.hspeed_mps.is_finite() {
            packet.hspeed_mps * KMH_PER_MPS
        } else {
            0.0
        };
        Some(Self {
            lat: packet.lat,
            lon: packet.lon,
            alt: packet.alt.filter(|a| a.is_finite()).unwrap_or(fallback_alt),
            timestamp,
            speed_kmh,
        })
    }

    /// Displacement from `earlier` to `self`.
    pub fn subtract(&self, earlier: &GeoFix) -> Displacement {
        difference(self, earlier)
    }
}

/// Result of differencing two fixes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    /// Straight-line 3D distance in meters, never negative.
    pub distance_m: f64,
    /// Wall-clock delta; negative when the fixes arrive out of order.
    pub duration: TimeDelta,
}

/// Great-circle distance in meters between two points given in degrees.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Displacement between `a` (the newer fix) and `b`.
pub fn difference(a: &GeoFix, b: &GeoFix) -> Displacement {
    let horizontal = haversine_m(a.lat, a.lon, b.lat, b.lon);
    let vertical = b.alt - a.alt;
    Displacement {
        distance_m: horizontal.hypot(vertical),
        duration: a.timestamp - b.timestamp,
    }
}
