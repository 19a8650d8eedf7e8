//! Unit and time helpers for rally_core.

use chrono::TimeDelta;

/// Seconds in one hour.
pub const SECS_PER_HOUR: f64 = 3_600.0;
/// Meters in one kilometer.
pub const METERS_PER_KM: f64 = 1_000.0;
/// Kilometers per hour in one meter per second.
pub const KMH_PER_MPS: f64 = 3.6;

const MICROS_PER_HOUR: f64 = 3.6e9;

/// Signed length of `d` in seconds, with microsecond resolution where it fits.
#[inline]
pub fn seconds(d: TimeDelta) -> f64 {
    match d.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => d.num_milliseconds() as f64 / 1e3,
    }
}

/// Signed length of `d` in hours.
#[inline]
pub fn hours(d: TimeDelta) -> f64 {
    seconds(d) / SECS_PER_HOUR
}

/// Duration of `h` hours, rounded to the microsecond.
/// Returns `None` for non-finite or unrepresentable inputs.
pub fn from_hours(h: f64) -> Option<TimeDelta> {
    let us = (h * MICROS_PER_HOUR).round();
    if !us.is_finite() || us.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::microseconds(us as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_conversions() {
        assert_eq!(hours(TimeDelta::minutes(90)), 1.5);
        assert_eq!(seconds(TimeDelta::milliseconds(-2500)), -2.5);
        assert_eq!(from_hours(0.5), Some(TimeDelta::minutes(30)));
        assert_eq!(from_hours(f64::INFINITY), None);
        assert_eq!(from_hours(f64::NAN), None);
    }
}
