//! Driver commands typed at the console.
//!
//! | input              | effect                                   |
//! |--------------------|------------------------------------------|
//! | `c 55`             | next instruction speed                   |
//! | `d 12.3`           | next instruction distance                |
//! | `t 14:05:30`       | next instruction arrival time            |
//! | `p`                | pause: next speed 0                      |
//! | empty, `go`, `space` | commit the next instruction            |
//! | `o d` / `o r` / `o p` | odometer drive / reverse / park       |
//! | `o c 10.5`         | calibrate to an expected reading         |
//! | `o z`              | zero the odometer distance               |
//! | `q`                | quit                                     |
//!
//! Speeds and distances are entered in the configured display units and
//! converted to kilometers here.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rally_config::Units;

use crate::error::{RallyError, Result};
use crate::odometer::OdometerMode;

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Next instruction speed in km/h.
    SetSpeed(f64),
    /// Next instruction distance in km.
    SetDistance(f64),
    SetTime(DateTime<Utc>),
    Pause,
    Commit,
    SetMode(OdometerMode),
    /// Expected odometer reading in km.
    Calibrate(f64),
    ClearDistance,
    Quit,
}

/// What a parsed value means in absolute terms.
#[derive(Debug, Clone, Copy)]
pub struct InputContext {
    pub units: Units,
    pub timezone: FixedOffset,
    /// Local date that bare clock times refer to.
    pub date: NaiveDate,
}

impl Command {
    pub fn parse(line: &str, ctx: &InputContext) -> Result<Command> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed == "go" || trimmed == "space" {
            return Ok(Command::Commit);
        }
        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((h, r)) => (h, r.trim()),
            None => (trimmed, ""),
        };
        match head {
            "q" => Ok(Command::Quit),
            "p" => Ok(Command::Pause),
            "c" => Ok(Command::SetSpeed(measure(rest, "speed", ctx.units)?)),
            "d" => Ok(Command::SetDistance(measure(rest, "distance", ctx.units)?)),
            "t" => parse_time(rest, ctx).map(Command::SetTime),
            "o" => parse_odometer(rest, ctx),
            other => Err(RallyError::Input(format!("unknown command: {other:?}"))),
        }
    }
}

fn parse_odometer(rest: &str, ctx: &InputContext) -> Result<Command> {
    let (sub, arg) = match rest.split_once(char::is_whitespace) {
        Some((s, a)) => (s, a.trim()),
        None => (rest, ""),
    };
    match sub {
        "d" => Ok(Command::SetMode(OdometerMode::Drive)),
        "r" => Ok(Command::SetMode(OdometerMode::Reverse)),
        "p" => Ok(Command::SetMode(OdometerMode::Park)),
        "z" => Ok(Command::ClearDistance),
        "c" => Ok(Command::Calibrate(measure(arg, "expected distance", ctx.units)?)),
        "" => Err(RallyError::Input(
            "odometer command needs one of d, r, p, c, z".into(),
        )),
        other => Err(RallyError::Input(format!(
            "unknown odometer command: {other:?}"
        ))),
    }
}

/// Parse a value in display units and convert it to kilometers. The result
/// must be finite after conversion, not just as typed.
fn measure(s: &str, what: &str, units: Units) -> Result<f64> {
    let km = s
        .parse::<f64>()
        .map(|v| units.from_input(v))
        .map_err(|_| RallyError::Input(format!("invalid {what}: {s:?}")))?;
    if !km.is_finite() {
        return Err(RallyError::Input(format!("{what} out of range: {s:?}")));
    }
    Ok(km)
}

/// Parse a clock time (on `ctx.date`) or a full local date-time.
pub fn parse_time(s: &str, ctx: &InputContext) -> Result<DateTime<Utc>> {
    let s = s.trim();
    let naive = DATE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            TIME_FORMATS
                .iter()
                .find_map(|f| NaiveTime::parse_from_str(s, f).ok())
                .map(|t| ctx.date.and_time(t))
        })
        .ok_or_else(|| RallyError::Input(format!("invalid time: {s:?}")))?;
    ctx.timezone
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| RallyError::Input(format!("time {s:?} does not exist locally")))
}
