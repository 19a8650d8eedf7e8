//! Dashboard rendering: text block or one JSON object per refresh.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use rally_config::Units;
use rally_core::{PaceAdvice, RallyComputer};
use rally_traits::GpsSource;
use serde_json::{Value, json};

/// Width of the pace gauge in characters.
pub const GAUGE_WIDTH: usize = 41;
const GAUGE_TICKS_S: [f64; 6] = [-10.0, -5.0, -1.0, 1.0, 5.0, 10.0];

/// Column of `offset_s` on a bar of `width` cells. Large offsets are
/// compressed by an arctangent so the ends stay readable.
pub fn gauge_position(offset_s: f64, width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    let half = width as f64 / 2.0;
    let x = half + half * (offset_s / 4.0).atan() / 1.2;
    if !x.is_finite() {
        return width / 2;
    }
    (x.max(0.0) as usize).min(width - 1)
}

pub fn gauge(offset_s: f64, width: usize) -> String {
    let mut cells = vec!['-'; width];
    if width == 0 {
        return String::new();
    }
    for t in GAUGE_TICKS_S {
        cells[gauge_position(t, width)] = '|';
    }
    cells[gauge_position(0.0, width)] = '+';
    cells[gauge_position(offset_s, width)] = '#';
    format!("[{}]", cells.into_iter().collect::<String>())
}

/// `[-]H:MM:SS`
pub fn format_delta(d: TimeDelta) -> String {
    let total = d.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let s = total.unsigned_abs();
    format!("{sign}{}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
}

fn local(t: DateTime<Utc>, tz: FixedOffset) -> DateTime<FixedOffset> {
    t.with_timezone(&tz)
}

#[derive(Debug, Clone)]
pub struct CurrentView {
    pub remaining_time: TimeDelta,
    pub remaining_distance: f64,
    pub cast_speed: f64,
    pub offset_s: f64,
    pub advice: PaceAdvice,
}

/// Everything the driver sees, in display units.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub units: Units,
    pub clock: DateTime<FixedOffset>,
    pub distance: f64,
    pub mode: &'static str,
    pub speed: f64,
    pub average: Option<f64>,
    pub current: Option<CurrentView>,
    pub next_distance: Option<f64>,
    pub next_time: Option<DateTime<FixedOffset>>,
    pub next_speed: Option<f64>,
    pub status: Option<String>,
}

impl Dashboard {
    pub fn capture<S: GpsSource>(
        rc: &RallyComputer<S>,
        units: Units,
        tolerance_s: f64,
        status: Option<&str>,
    ) -> Self {
        let odo = rc.odometer();
        let tz = rc.timezone();
        let current = rc.current().zip(rc.cast()).map(|(i, cast)| {
            let offset_s = cast.offset(i, odo);
            CurrentView {
                remaining_time: i.remaining_time(odo),
                remaining_distance: units.to_display(i.remaining_distance(odo) / 1000.0),
                cast_speed: units.to_display(cast.average()),
                offset_s,
                advice: PaceAdvice::from_offset(offset_s, tolerance_s),
            }
        });
        let next = rc.next();
        Self {
            units,
            clock: rc.local_time(),
            distance: units.to_display(odo.accumulated_distance() / 1000.0),
            mode: odo.mode().name(),
            speed: units.to_display(odo.last_speed()),
            average: odo.average_speed().map(|v| units.to_display(v)),
            current,
            next_distance: next.distance_km().map(|km| units.to_display(km)),
            next_time: next.time().map(|t| local(t, tz)),
            next_speed: next.speed_kmh().map(|v| units.to_display(v)),
            status: status.map(str::to_string),
        }
    }

    pub fn to_text(&self) -> String {
        let u = self.units.name();
        let mut out = format!(
            "{}  ODO {:>9.3} {u}  {:<7}  {:>6.1} {u}/h\n",
            self.clock.format("%H:%M:%S%.3f"),
            self.distance,
            self.mode,
            self.speed,
        );
        match &self.current {
            Some(c) => {
                out.push_str(&format!(
                    "CUR  T {:>9}  D {:>9.3} {u}  CAST {:>5.1} {u}/h  {:>+7.1} s  {}\n",
                    format_delta(c.remaining_time),
                    c.remaining_distance,
                    c.cast_speed,
                    c.offset_s,
                    c.advice,
                ));
                out.push_str(&format!("     {}\n", gauge(c.offset_s, GAUGE_WIDTH)));
            }
            None => out.push_str("CUR  none\n"),
        }
        let dash = || "--".to_string();
        out.push_str(&format!(
            "NEXT D {}  T {}  C {}\n",
            self.next_distance
                .map(|d| format!("{d:.3} {u}"))
                .unwrap_or_else(dash),
            self.next_time
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(dash),
            self.next_speed
                .map(|s| format!("{s:.1} {u}/h"))
                .unwrap_or_else(dash),
        ));
        if let Some(s) = &self.status {
            out.push_str(&format!("> {s}\n"));
        }
        out
    }

    pub fn to_json(&self) -> Value {
        json!({
            "time": self.clock.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "units": self.units.name(),
            "odometer": { "distance": self.distance, "mode": self.mode },
            "speed": self.speed,
            "average_speed": self.average,
            "current": self.current.as_ref().map(|c| json!({
                "remaining_time_s": c.remaining_time.num_milliseconds() as f64 / 1000.0,
                "remaining_distance": c.remaining_distance,
                "cast_speed": c.cast_speed,
                "offset_s": c.offset_s,
                "advice": c.advice.label(),
            })),
            "next": {
                "distance": self.next_distance,
                "time": self.next_time.map(|t| t.to_rfc3339()),
                "speed": self.next_speed,
            },
            "status": self.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 20)]
    #[case(1e9, 40)]
    #[case(-1e9, 0)]
    #[case(f64::NAN, 20)]
    fn gauge_positions(#[case] offset: f64, #[case] expected: usize) {
        assert_eq!(gauge_position(offset, GAUGE_WIDTH), expected);
    }

    #[test]
    fn gauge_is_monotonic_and_marks_offset() {
        let mut prev = 0;
        for o in [-20.0, -10.0, -5.0, -1.0, 0.0, 1.0, 5.0, 10.0, 20.0] {
            let p = gauge_position(o, GAUGE_WIDTH);
            assert!(p >= prev);
            prev = p;
        }
        let g = gauge(3.0, GAUGE_WIDTH);
        assert_eq!(g.chars().count(), GAUGE_WIDTH + 2);
        assert!(g.contains('#'));
        assert!(g.contains('+'));
    }

    #[rstest]
    #[case(TimeDelta::seconds(3725), "1:02:05")]
    #[case(TimeDelta::seconds(-59), "-0:00:59")]
    #[case(TimeDelta::zero(), "0:00:00")]
    fn deltas(#[case] d: TimeDelta, #[case] expected: &str) {
        assert_eq!(format_delta(d), expected);
    }
}
