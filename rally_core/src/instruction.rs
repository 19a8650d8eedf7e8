//! Pace instructions: two of {distance, time, speed} in, all three out.
//!
//! The driver fills an [`InstructionDraft`] field by field. Activation picks
//! which pair to trust, derives the third value against an odometer
//! snapshot and yields an immutable [`Instruction`]. When all three fields
//! are set the pair is chosen by a fixed precedence:
//!
//! 1. distance + speed, deriving the arrival time
//! 2. time + speed, deriving the target distance
//! 3. time + distance, deriving the speed

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{RallyError, Result};
use crate::odometer::{Odometer, OdometerSnapshot};
use crate::util::{METERS_PER_KM, from_hours, hours};

/// The pair of fields an instruction was activated from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    DistanceSpeed { distance_m: f64, speed_kmh: f64 },
    TimeSpeed { time: DateTime<Utc>, speed_kmh: f64 },
    TimeDistance { time: DateTime<Utc>, distance_m: f64 },
}

impl Target {
    pub fn kind(&self) -> &'static str {
        match self {
            Target::DistanceSpeed { .. } => "distance+speed",
            Target::TimeSpeed { .. } => "time+speed",
            Target::TimeDistance { .. } => "time+distance",
        }
    }
}

/// Driver-entered instruction before activation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructionDraft {
    distance_m: Option<f64>,
    time: Option<DateTime<Utc>>,
    speed_kmh: Option<f64>,
}

impl InstructionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute odometer reading to reach, in kilometers.
    pub fn set_distance(&mut self, km: f64) {
        self.distance_m = Some(km * METERS_PER_KM);
    }

    /// Absolute time to arrive.
    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.time = Some(time);
    }

    pub fn set_speed(&mut self, kmh: f64) {
        self.speed_kmh = Some(kmh);
    }

    pub fn with_distance(mut self, km: f64) -> Self {
        self.set_distance(km);
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.set_time(time);
        self
    }

    pub fn with_speed(mut self, kmh: f64) -> Self {
        self.set_speed(kmh);
        self
    }

    pub fn distance_m(&self) -> Option<f64> {
        self.distance_m
    }

    pub fn distance_km(&self) -> Option<f64> {
        self.distance_m.map(|m| m / METERS_PER_KM)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed_kmh
    }

    /// The field pair activation will use, if at least two are set.
    pub fn target(&self) -> Option<Target> {
        match (self.distance_m, self.time, self.speed_kmh) {
            (Some(distance_m), _, Some(speed_kmh)) => Some(Target::DistanceSpeed {
                distance_m,
                speed_kmh,
            }),
            (_, Some(time), Some(speed_kmh)) => Some(Target::TimeSpeed { time, speed_kmh }),
            (Some(distance_m), Some(time), None) => {
                Some(Target::TimeDistance { time, distance_m })
            }
            _ => None,
        }
    }

    /// True when at least two of the three fields are set.
    pub fn verify(&self) -> bool {
        self.target().is_some()
    }

    /// Bind to the odometer's current state.
    pub fn activate(&self, odometer: &Odometer) -> Result<Instruction> {
        self.activate_at(odometer.snapshot())
    }

    /// Bind to an explicit snapshot and derive the missing field.
    pub fn activate_at(&self, start: OdometerSnapshot) -> Result<Instruction> {
        let target = self.target().ok_or_else(|| {
            RallyError::InvalidInstruction("Instruction is not valid!".into())
        })?;

        let (distance_m, time, speed_kmh) = match target {
            Target::DistanceSpeed {
                distance_m,
                speed_kmh,
            } => {
                check_distance(distance_m)?;
                check_speed(speed_kmh)?;
                let remaining_km = (distance_m - start.distance_m) / METERS_PER_KM;
                let h = if speed_kmh == 0.0 {
                    0.0
                } else {
                    remaining_km / speed_kmh
                };
                let time = offset_time(start.timestamp, h)?;
                (distance_m, time, speed_kmh)
            }
            Target::TimeSpeed { time, speed_kmh } => {
                check_speed(speed_kmh)?;
                let h = hours(time - start.timestamp);
                let distance_m = start.distance_m + speed_kmh * h * METERS_PER_KM;
                if !distance_m.is_finite() {
                    return Err(RallyError::InvalidInstruction(format!(
                        "derived distance out of range ({speed_kmh} km/h for {h} h)"
                    )));
                }
                (distance_m, time, speed_kmh)
            }
            Target::TimeDistance { time, distance_m } => {
                check_distance(distance_m)?;
                let h = hours(time - start.timestamp);
                if h <= 0.0 {
                    return Err(RallyError::DegenerateInstruction(
                        "target time must be later than the current fix",
                    ));
                }
                let speed_kmh = (distance_m - start.distance_m) / METERS_PER_KM / h;
                if !speed_kmh.is_finite() {
                    return Err(RallyError::DegenerateInstruction(
                        "target time is too close to derive a speed",
                    ));
                }
                (distance_m, time, speed_kmh)
            }
        };

        tracing::debug!(
            kind = target.kind(),
            distance_m,
            %time,
            speed_kmh,
            "instruction derived"
        );
        Ok(Instruction {
            target,
            distance_m,
            time,
            speed_kmh,
            start,
        })
    }
}

fn check_speed(kmh: f64) -> Result<()> {
    if kmh.is_finite() && kmh >= 0.0 {
        Ok(())
    } else {
        Err(RallyError::InvalidInstruction(format!(
            "speed must be a finite value >= 0 (got {kmh})"
        )))
    }
}

fn check_distance(m: f64) -> Result<()> {
    if m.is_finite() {
        Ok(())
    } else {
        Err(RallyError::InvalidInstruction(format!(
            "distance must be finite (got {m})"
        )))
    }
}

fn offset_time(from: DateTime<Utc>, h: f64) -> Result<DateTime<Utc>> {
    from_hours(h)
        .and_then(|d| from.checked_add_signed(d))
        .ok_or_else(|| RallyError::InvalidInstruction(format!("arrival {h} h away is out of range")))
}

/// An activated instruction. Targets are frozen at bind time; only the
/// remaining/elapsed queries move with the odometer.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    target: Target,
    distance_m: f64,
    time: DateTime<Utc>,
    speed_kmh: f64,
    start: OdometerSnapshot,
}

impl Instruction {
    pub fn target(&self) -> Target {
        self.target
    }

    /// Absolute target distance in meters.
    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_m / METERS_PER_KM
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    pub fn start(&self) -> OdometerSnapshot {
        self.start
    }

    /// Meters left to the target; negative once overshot.
    pub fn remaining_distance(&self, odometer: &Odometer) -> f64 {
        self.distance_m - odometer.accumulated_distance()
    }

    pub fn remaining_time(&self, odometer: &Odometer) -> TimeDelta {
        self.time - odometer.last_fix().timestamp
    }

    /// Meters driven since activation.
    pub fn elapsed_distance(&self, odometer: &Odometer) -> f64 {
        odometer.accumulated_distance() - self.start.distance_m
    }

    pub fn elapsed_time(&self, odometer: &Odometer) -> TimeDelta {
        odometer.last_fix().timestamp - self.start.timestamp
    }

    /// A fresh draft that keeps this instruction's speed.
    pub fn follow_up(&self) -> InstructionDraft {
        InstructionDraft::new().with_speed(self.speed_kmh)
    }
}
