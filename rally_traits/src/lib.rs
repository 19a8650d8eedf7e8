pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use chrono::{DateTime, Utc};

/// Fix quality reported by a GPS receiver, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum FixMode {
    #[default]
    NoFix,
    Fix2d,
    Fix3d,
}

impl FixMode {
    /// Map a gpsd/NMEA style numeric mode (0/1 = none, 2 = 2D, 3 = 3D).
    pub fn from_mode_number(mode: u8) -> Self {
        match mode {
            0 | 1 => FixMode::NoFix,
            2 => FixMode::Fix2d,
            _ => FixMode::Fix3d,
        }
    }

    /// At least a 2D fix.
    #[inline]
    pub fn has_fix(self) -> bool {
        self >= FixMode::Fix2d
    }
}

/// Raw sample as reported by a GPS source.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsPacket {
    pub lat: f64,
    pub lon: f64,
    /// Altitude in meters; absent on 2D fixes.
    pub alt: Option<f64>,
    pub time: Option<DateTime<Utc>>,
    /// Horizontal speed in meters per second.
    pub hspeed_mps: f64,
    pub mode: FixMode,
}

impl GpsPacket {
    pub fn no_fix() -> Self {
        Self {
            lat: 0.0,
            lon: 0.0,
            alt: None,
            time: None,
            hspeed_mps: 0.0,
            mode: FixMode::NoFix,
        }
    }
}

/// Pull-based accessor for the receiver's most recent sample.
///
/// Implementations return whatever the receiver currently reports; callers
/// decide whether the sample is new by comparing timestamps.
pub trait GpsSource {
    fn current(&mut self) -> Result<GpsPacket, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: GpsSource + ?Sized> GpsSource for Box<T> {
    fn current(&mut self) -> Result<GpsPacket, Box<dyn std::error::Error + Send + Sync>> {
        (**self).current()
    }
}
