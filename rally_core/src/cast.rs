//! Constant average speed pacing.
//!
//! The offset compares the distance driven since activation with the
//! distance the target speed would have covered in the same time:
//!
//! ```text
//! offset_s = (actual_km - ideal_km) / speed_kmh * 3600
//! ```
//!
//! Positive means ahead of schedule.

use std::fmt;

use crate::instruction::Instruction;
use crate::odometer::Odometer;
use crate::util::{METERS_PER_KM, SECS_PER_HOUR, hours};

/// Offsets within this many seconds count as on pace.
pub const DEFAULT_PACE_TOLERANCE_S: f64 = 0.5;

/// Pace evaluator paired with one activated instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cast {
    speed_kmh: f64,
}

impl Cast {
    pub fn new(instruction: &Instruction) -> Self {
        Self {
            speed_kmh: instruction.speed_kmh(),
        }
    }

    /// Target average speed in km/h.
    pub fn average(&self) -> f64 {
        self.speed_kmh
    }

    /// Seconds ahead (+) or behind (-) schedule. Zero when the target
    /// speed is zero.
    pub fn offset(&self, instruction: &Instruction, odometer: &Odometer) -> f64 {
        if self.speed_kmh == 0.0 {
            return 0.0;
        }
        let ideal_km = hours(instruction.elapsed_time(odometer)) * self.speed_kmh;
        let actual_km = instruction.elapsed_distance(odometer) / METERS_PER_KM;
        (actual_km - ideal_km) / self.speed_kmh * SECS_PER_HOUR
    }
}

/// What the driver should do about an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceAdvice {
    SlowDown,
    SpeedUp,
    OnPace,
}

impl PaceAdvice {
    pub fn from_offset(offset_s: f64, tolerance_s: f64) -> Self {
        if offset_s > tolerance_s {
            PaceAdvice::SlowDown
        } else if offset_s < -tolerance_s {
            PaceAdvice::SpeedUp
        } else {
            PaceAdvice::OnPace
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaceAdvice::SlowDown => "Slow down",
            PaceAdvice::SpeedUp => "Speed up!",
            PaceAdvice::OnPace => "Right On!",
        }
    }
}

impl fmt::Display for PaceAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.6, PaceAdvice::SlowDown)]
    #[case(0.5, PaceAdvice::OnPace)]
    #[case(0.0, PaceAdvice::OnPace)]
    #[case(-0.5, PaceAdvice::OnPace)]
    #[case(-0.51, PaceAdvice::SpeedUp)]
    fn advice_from_offset(#[case] offset: f64, #[case] expected: PaceAdvice) {
        assert_eq!(
            PaceAdvice::from_offset(offset, DEFAULT_PACE_TOLERANCE_S),
            expected
        );
    }

    #[test]
    fn labels() {
        assert_eq!(PaceAdvice::SpeedUp.to_string(), "Speed up!");
        assert_eq!(PaceAdvice::OnPace.label(), "Right On!");
    }
}
